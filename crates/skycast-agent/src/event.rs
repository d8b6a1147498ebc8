//! The typed event sequence an agent turn produces.

use std::pin::Pin;

use futures::Stream;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// One item of an agent turn's output, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AgentEvent {
    /// A fragment of the user-facing answer.
    TextDelta { text: String },
    /// The model invoked a tool.
    ToolCall {
        id: String,
        name: String,
        arguments: Value,
    },
    /// A tool finished. Failed tools report `{"error": "..."}`.
    ToolResult {
        id: String,
        name: String,
        result: Value,
    },
    /// A fragment of model reasoning.
    Reasoning { text: String },
    /// A failure the agent reports without aborting the stream.
    Error { message: String },
    /// One model round-trip finished.
    StepFinish { turn: u32 },
    Usage {
        input_tokens: u32,
        output_tokens: u32,
    },
    /// The turn is over.
    Finish { reason: String },
}

impl AgentEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text-delta",
            Self::ToolCall { .. } => "tool-call",
            Self::ToolResult { .. } => "tool-result",
            Self::Reasoning { .. } => "reasoning",
            Self::Error { .. } => "error",
            Self::StepFinish { .. } => "step-finish",
            Self::Usage { .. } => "usage",
            Self::Finish { .. } => "finish",
        }
    }
}

/// Identity and directives for one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Conversation-memory key, e.g. `telegram-<chat_id>`.
    pub conversation_id: String,
    pub user_id: String,
    /// System-level instructions added for this turn only.
    pub directives: Vec<String>,
}

/// Ordered, asynchronous event sequence for one turn.
///
/// `Ok(AgentEvent::Error { .. })` is recoverable and rendered in-band; an
/// `Err` item means the runtime itself failed and the turn must be abandoned.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent>> + Send>>;
