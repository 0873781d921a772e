use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by management API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx response. Display is the backend-provided message alone so
    /// callers can surface it to the user verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Connection, timeout or decode failure below the HTTP status level.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Build an [`ClientError::Api`] from a response body, extracting the
    /// conventional `{"message": ...}` field when present.
    pub(crate) fn api(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        Self::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status code, when the backend produced a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}
