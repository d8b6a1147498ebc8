//! Error types for the messaging side.

use skycast_agent::AgentError;

/// Failure of a single transport call.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a usable HTTP response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with `ok: false`.
    #[error("Telegram API error (code {code}): {description}")]
    Api { code: i64, description: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether the platform rejected the text for its length, either as
    /// "message is too long" or as `MESSAGE_TOO_LONG`.
    pub fn is_too_long(&self) -> bool {
        match self {
            Self::Api { description, .. } => description
                .to_ascii_lowercase()
                .replace('_', " ")
                .contains("too long"),
            _ => false,
        }
    }
}

/// Uncaught failure of a streamed turn.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("agent failure: {0}")]
    Agent(#[from] AgentError),
}
