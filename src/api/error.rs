//! Error taxonomy for daemon requests.
//!
//! Every failure a request can hit maps onto one of four classes, and each
//! class renders as a human-readable message. Callers never see a raw
//! transport error; the interface layer is the single place these are shown.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The daemon is unreachable (not running, wrong address).
    #[error("cannot reach the Ollama daemon: {reason}")]
    Connection { reason: String },

    /// No response arrived within the configured bound.
    #[error("no response from the daemon within {seconds}s")]
    Timeout { seconds: u64 },

    /// The daemon answered, but not in the expected shape.
    #[error("unexpected response from the daemon: {reason}")]
    Protocol { reason: String },

    /// The daemon rejected the request: unknown model, or an input the
    /// model cannot accept (e.g. an image sent to a text-only model).
    #[error("{reason}")]
    Model { reason: String },
}

impl ApiError {
    /// Classify a transport-level failure from reqwest.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                seconds: timeout_secs,
            }
        } else if err.is_decode() {
            ApiError::Protocol {
                reason: err.to_string(),
            }
        } else {
            ApiError::Connection {
                reason: err.to_string(),
            }
        }
    }

    /// Classify a non-2xx daemon response.
    ///
    /// The daemon reports rejections as `{"error": "..."}` bodies; anything
    /// else is treated as a protocol problem.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if let Some(message) = extract_daemon_error(body) {
            ApiError::Model { reason: message }
        } else {
            ApiError::Protocol {
                reason: format!("daemon returned status {status}: {}", body.trim()),
            }
        }
    }
}

/// Pull the `error` field out of a daemon error body, if present.
pub fn extract_daemon_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let message = value.get("error")?.as_str()?;
    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
