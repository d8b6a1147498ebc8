//! OpenAI-compatible chat completion client (vLLM and friends).

pub mod client;
pub mod streaming;
pub mod types;

pub use client::{ChatModel, LlmClient, LlmClientConfig};
pub use streaming::{OpenAiStreamAccumulator, StreamDelta, consume_sse};
pub use types::{ChatRequest, Completion, Message, Role, ToolCall, ToolDefinition, Usage};
