//! Telegram front end for skycast.
//!
//! Incoming messages go through a [`TurnHandler`], which resolves the
//! user's language, asks the agent for a streamed reply, and hands the
//! event stream to a [`StreamReconciler`]. The reconciler renders events
//! into one MarkdownV2 buffer and keeps the chat in sync with it through
//! a small number of message edits.
//!
//! ```text
//!   Update ──▶ TurnHandler ──▶ AgentRuntime::stream ──▶ EventStream
//!                  │                                        │
//!                  ▼                                        ▼
//!           LanguageService                         StreamReconciler
//!                                                          │
//!                                                          ▼
//!                                              Transport (TelegramClient)
//! ```

pub mod error;
pub mod format;
pub mod markdown;
pub mod reconciler;
pub mod telegram;
pub mod transport;
pub mod turn;

pub use error::{ReconcileError, TransportError};
pub use format::{format_event, format_tool_result};
pub use markdown::escape_markdown_v2;
pub use reconciler::{
    LENGTH_TRUNCATION_NOTICE, PLACEHOLDER_TEXT, ReconcileSummary, ReconcilerConfig, RenderTurn,
    StreamReconciler,
};
pub use telegram::{TelegramClient, Update};
pub use transport::{Markup, MessageHandle, Transport};
pub use turn::{IncomingMessage, Sender, TurnHandler, TurnOutcome};
