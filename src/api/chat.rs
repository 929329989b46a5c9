//! Non-streaming chat call, used by the TUI-less `ask` subcommand.
//!
//! The interactive interface always streams (see
//! [`crate::core::chat_stream`]); this is the batched variant for one-shot
//! use, where the full response is returned in a single exchange.

use std::time::Duration;

use tracing::debug;

use crate::api::{ApiError, ChatChunk, ChatMessage, ChatRequest};
use crate::utils::url::endpoint_url;

/// Submit one chat turn with `stream: false` and return the generated text.
pub async fn send_chat(
    client: &reqwest::Client,
    base_url: &str,
    model: &str,
    messages: Vec<ChatMessage>,
    timeout: Duration,
) -> Result<String, ApiError> {
    let url = endpoint_url(base_url, "api/chat");
    let request = ChatRequest {
        model: model.to_string(),
        messages,
        stream: false,
    };
    debug!(%url, model, "dispatching chat request");

    let response = client
        .post(&url)
        .timeout(timeout)
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, timeout.as_secs()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, &body));
    }

    let chunk = response
        .json::<ChatChunk>()
        .await
        .map_err(|e| ApiError::Protocol {
            reason: e.to_string(),
        })?;

    if let Some(error) = chunk.error {
        return Err(ApiError::Model { reason: error });
    }

    chunk
        .message
        .map(|m| m.content)
        .ok_or_else(|| ApiError::Protocol {
            reason: "response contained no message".to_string(),
        })
}
