//! Agent error types.
//!
//! An [`AgentError`] returned from the event stream aborts the turn. Failures
//! the agent can narrate (provider errors mid-conversation, exhausted turn
//! budget) are reported in-band as [`crate::AgentEvent::Error`] instead.

/// Unified error type for the agent runtime.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- LLM errors ----------------------------------------------------------
    /// An HTTP request to the LLM endpoint failed.
    #[error("llm request failed: {reason}")]
    LlmRequestFailed { reason: String },

    /// The LLM response could not be parsed.
    #[error("llm response parse error: {reason}")]
    LlmParseFailed { reason: String },

    /// The SSE connection was interrupted or produced invalid data.
    #[error("llm stream error: {reason}")]
    LlmStreamError { reason: String },

    // -- Tool errors ---------------------------------------------------------
    /// The model asked for a tool no adapter provides.
    #[error("unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    /// Tool arguments did not match the tool's input schema.
    #[error("invalid arguments for `{tool_name}`: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    /// A tool invocation failed.
    #[error("tool execution failed for `{tool_name}`: {reason}")]
    ToolExecutionFailed { tool_name: String, reason: String },

    // -- Configuration -------------------------------------------------------
    /// Client or runtime configuration is unusable.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors.
    #[error("internal agent error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::LlmRequestFailed {
            reason: err.to_string(),
        }
    }
}
