//! Chat dispatcher: streams one generation request off the interface loop.
//!
//! Each submission spawns a single background task that POSTs to the
//! daemon's chat endpoint and forwards NDJSON fragments back over an
//! unbounded channel as `Chunk* (Error)? End`, tagged with a stream id so
//! the interface can discard deliveries for a request it has already
//! cancelled or superseded. There is no retry policy: a failed call is
//! surfaced immediately.

use std::time::Duration;

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ApiError, ChatChunk, ChatMessage, ChatRequest};
use crate::utils::url::endpoint_url;

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

/// Parse one NDJSON line and forward its payload. Returns `true` when the
/// stream is finished (final chunk, daemon-reported error, or garbage).
fn process_chat_line(
    line: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }

    match serde_json::from_str::<ChatChunk>(line) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                let _ = tx.send((
                    StreamMessage::Error(ApiError::Model { reason: error }.to_string()),
                    stream_id,
                ));
                let _ = tx.send((StreamMessage::End, stream_id));
                return true;
            }
            if let Some(message) = chunk.message {
                if !message.content.is_empty() {
                    let _ = tx.send((StreamMessage::Chunk(message.content), stream_id));
                }
            }
            if chunk.done {
                let _ = tx.send((StreamMessage::End, stream_id));
                return true;
            }
            false
        }
        Err(e) => {
            let error = ApiError::Protocol {
                reason: format!("unparseable stream line: {e}"),
            };
            let _ = tx.send((StreamMessage::Error(error.to_string()), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
    }
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub model: String,
    pub api_messages: Vec<ChatMessage>,
    pub timeout: Duration,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                base_url,
                model,
                api_messages,
                timeout,
                cancel_token,
                stream_id,
            } = params;

            let request = ChatRequest {
                model,
                messages: api_messages,
                stream: true,
            };

            debug!(stream_id, model = %request.model, "spawning chat stream");

            tokio::select! {
                _ = run_stream(client, base_url, request, timeout, tx_clone.clone(), stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "chat stream cancelled");
                }
            }
        });
    }

    #[cfg(test)]
    pub fn sender(&self) -> &mpsc::UnboundedSender<(StreamMessage, u64)> {
        &self.tx
    }
}

async fn run_stream(
    client: reqwest::Client,
    base_url: String,
    request: ChatRequest,
    timeout: Duration,
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    let chat_url = endpoint_url(&base_url, "api/chat");

    // The timeout bounds connection plus response headers; once fragments
    // are flowing the generation is allowed to take as long as it takes.
    let send_result = tokio::time::timeout(timeout, client.post(chat_url).json(&request).send());

    let response = match send_result.await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            let error = ApiError::from_transport(e, timeout.as_secs());
            let _ = tx.send((StreamMessage::Error(error.to_string()), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
        Err(_elapsed) => {
            let error = ApiError::Timeout {
                seconds: timeout.as_secs(),
            };
            let _ = tx.send((StreamMessage::Error(error.to_string()), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &body);
        let _ = tx.send((StreamMessage::Error(error.to_string()), stream_id));
        let _ = tx.send((StreamMessage::End, stream_id));
        return;
    }

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk_bytes) => {
                buffer.extend_from_slice(&chunk_bytes);

                while let Some(newline_pos) = memchr(b'\n', &buffer) {
                    let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                        Ok(s) => s.to_string(),
                        Err(e) => {
                            debug!(stream_id, "invalid UTF-8 in stream: {e}");
                            buffer.drain(..=newline_pos);
                            continue;
                        }
                    };
                    buffer.drain(..=newline_pos);

                    if process_chat_line(&line, &tx, stream_id) {
                        return;
                    }
                }
            }
            Err(e) => {
                let error = ApiError::Connection {
                    reason: format!("stream interrupted: {e}"),
                };
                let _ = tx.send((StreamMessage::Error(error.to_string()), stream_id));
                let _ = tx.send((StreamMessage::End, stream_id));
                return;
            }
        }
    }

    // Stream ended without a done marker; treat whatever is buffered as the
    // final line and close out.
    if !buffer.is_empty() {
        if let Ok(line) = std::str::from_utf8(&buffer) {
            if process_chat_line(line, &tx, stream_id) {
                return;
            }
        }
    }
    let _ = tx.send((StreamMessage::End, stream_id));
}
