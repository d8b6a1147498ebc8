//! # skycast-agent
//!
//! The agent side of a chat turn: given a user message, identity, and
//! per-turn directives, produce an ordered stream of [`AgentEvent`]s.
//!
//! ```text
//! ┌───────────────┐   events    ┌──────────────────┐
//! │ StreamingAgent│────────────>│ consumer (bot)   │
//! │  ReAct loop   │             └──────────────────┘
//! └──┬─────────┬──┘
//!    │         │
//! ┌──┴───────┐ ┌┴─────────────┐
//! │ LlmClient│ │ ToolRegistry │
//! │ (SSE)    │ │  adapters    │
//! └──────────┘ └──────────────┘
//! ```

pub mod agent;
pub mod error;
pub mod event;
pub mod instructions;
pub mod llm;
pub mod memory;
pub mod runtime;

pub use agent::{AgentConfig, StreamingAgent};
pub use error::{AgentError, Result};
pub use event::{AgentEvent, EventStream, TurnOptions};
pub use instructions::{DEFAULT_INSTRUCTIONS, load_instructions, with_timestamp};
pub use llm::{
    ChatModel, ChatRequest, Completion, LlmClient, LlmClientConfig, Message, Role, StreamDelta,
    ToolCall, ToolDefinition, Usage,
};
pub use memory::ConversationMemory;
pub use runtime::{AgentRuntime, ToolAdapter, ToolRegistry};
