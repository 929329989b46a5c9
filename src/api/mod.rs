//! Wire payloads for the daemon's HTTP API.
//!
//! The daemon speaks two endpoints we care about: `GET /api/tags` for the
//! model directory and `POST /api/chat` for generation. Chat responses
//! stream as NDJSON, one [`ChatChunk`] per line, with `done: true` on the
//! final line. Vision input rides along as base64 payloads on the user
//! message.

use serde::{Deserialize, Serialize};

pub mod chat;
pub mod error;
pub mod models;

pub use error::ApiError;

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";

#[derive(Serialize, Clone, Debug)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ROLE_SYSTEM.to_string(),
            content: content.into(),
            images: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ROLE_USER.to_string(),
            content: content.into(),
            images: None,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// Build the message list for one chat turn.
///
/// Turns are stateless: the system prompt (if any) is resent in full with
/// every request, and only the current user prompt goes out; no history is
/// carried.
pub fn build_turn(
    system_prompt: Option<&str>,
    prompt: &str,
    images: Option<Vec<String>>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt {
        if !system.trim().is_empty() {
            messages.push(ChatMessage::system(system));
        }
    }
    let mut user = ChatMessage::user(prompt);
    user.images = images;
    messages.push(user);
    messages
}

/// One NDJSON line of a chat response.
///
/// Mid-stream daemon failures arrive as an `error` field on a line of their
/// own rather than as an HTTP status, so the field lives on the chunk.
#[derive(Deserialize, Debug)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChunkMessage {
    #[serde(default)]
    pub content: String,
}

/// `GET /api/tags` response shape.
#[derive(Deserialize, Debug)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// One installed model, as reported by the daemon.
#[derive(Deserialize, Debug, Clone)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub details: Option<ModelDetails>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelDetails {
    #[serde(default)]
    pub parameter_size: Option<String>,
    #[serde(default)]
    pub quantization_level: Option<String>,
}
