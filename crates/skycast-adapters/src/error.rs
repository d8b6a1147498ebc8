//! Adapter error types.

use skycast_agent::AgentError;
use skycast_lang::LangError;

/// Errors raised while executing a tool.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The requested tool does not exist on this adapter.
    #[error("tool not found: `{tool_name}` on adapter `{adapter_id}`")]
    ToolNotFound {
        adapter_id: String,
        tool_name: String,
    },

    /// The parameters supplied to a tool are invalid.
    #[error("invalid parameters for tool `{tool_name}`: {reason}")]
    InvalidParams { tool_name: String, reason: String },

    /// Geocoding returned no match.
    #[error("Location '{0}' not found")]
    LocationNotFound(String),

    /// An upstream HTTP call failed or returned an unexpected payload.
    #[error("execution failed for tool `{tool_name}`: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    /// An upstream call did not answer in time.
    #[error("timeout after {seconds}s: {reason}")]
    Timeout { seconds: u64, reason: String },

    /// The language service rejected the request or its store failed.
    #[error(transparent)]
    Language(#[from] LangError),

    /// Configuration error in adapter setup.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;

impl From<AdapterError> for AgentError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::ToolNotFound { tool_name, .. } => AgentError::UnknownTool { tool_name },
            AdapterError::InvalidParams { tool_name, reason } => {
                AgentError::InvalidArguments { tool_name, reason }
            }
            AdapterError::Language(e @ LangError::UnsupportedLanguage { .. }) => {
                AgentError::InvalidArguments {
                    tool_name: "language".into(),
                    reason: e.to_string(),
                }
            }
            other => AgentError::ToolExecutionFailed {
                tool_name: other.tool_name().to_owned(),
                reason: other.to_string(),
            },
        }
    }
}

impl AdapterError {
    fn tool_name(&self) -> &str {
        match self {
            Self::ToolNotFound { tool_name, .. }
            | Self::InvalidParams { tool_name, .. }
            | Self::ExecutionFailed { tool_name, .. } => tool_name,
            Self::LocationNotFound(_) | Self::Timeout { .. } => "weather",
            Self::Language(_) => "language",
            Self::ConfigError(_) | Self::SerializationError(_) => "unknown",
        }
    }
}
