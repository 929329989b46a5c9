//! Display-side message model.
//!
//! These are the entries rendered in the chat area, not the wire payloads
//! (see [`crate::api`] for those). App messages are status lines the client
//! itself injects; they never go out on the wire and never reach the
//! transcript.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
    App,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            sender: Sender::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            sender: Sender::Assistant,
            content: content.into(),
        }
    }

    pub fn app(content: impl Into<String>) -> Self {
        Message {
            sender: Sender::App,
            content: content.into(),
        }
    }
}
