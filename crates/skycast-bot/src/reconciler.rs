//! Stream reconciler: folds a turn's agent events into a few message edits.
//!
//! A turn starts with a placeholder message. Every displayed event appends
//! to one escaped buffer; the buffer is pushed to the chat at most once per
//! `flush_interval` and once more, unconditionally, when the stream ends.
//!
//! Each flush edits the active message in place when the buffer fits. When
//! it does not fit, or the edit is rejected, the buffer goes out as a new
//! message which becomes the active one. If that send is rejected for its
//! length, a cut-down copy with a truncation notice is sent instead.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use skycast_agent::{AgentEvent, EventStream};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ReconcileError, TransportError};
use crate::format::format_event;
use crate::markdown::{escape_markdown_v2, truncate_escaped};
use crate::transport::{Markup, MessageHandle, Transport};

/// Text of the message sent before the first event arrives.
pub const PLACEHOLDER_TEXT: &str = "Thinking...";

/// Appended (escaped) to a buffer cut down to fit one message.
pub const LENGTH_TRUNCATION_NOTICE: &str = "\n\n... [Message truncated due to length]";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Longest text the transport accepts in one message, in chars.
    pub max_message_length: usize,
    /// Longest rendered tool result before it is cut, in chars.
    pub max_result_length: usize,
    /// Minimum time between intermediate flushes.
    pub flush_interval: Duration,
    /// Room left for the truncation notice when cutting a buffer.
    pub truncation_margin: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_message_length: 4096,
            max_result_length: 500,
            flush_interval: Duration::from_millis(500),
            truncation_margin: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Outcome of a reconciled turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Message holding the tail of the reply.
    pub active: MessageHandle,
    /// New messages sent, placeholder included.
    pub messages_sent: usize,
    pub edits: usize,
}

pub struct StreamReconciler {
    transport: Arc<dyn Transport>,
    config: ReconcilerConfig,
}

impl StreamReconciler {
    pub fn new(transport: Arc<dyn Transport>, config: ReconcilerConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Send the placeholder and return the turn that owns the render state.
    pub async fn start(&self, chat_id: i64) -> Result<RenderTurn<'_>, TransportError> {
        let placeholder = self
            .transport
            .send_message(chat_id, PLACEHOLDER_TEXT, Markup::Plain)
            .await?;
        Ok(RenderTurn {
            reconciler: self,
            chat_id,
            state: RenderState::new(placeholder),
        })
    }

    /// Reconcile a whole event stream into `chat_id`.
    pub async fn run(
        &self,
        chat_id: i64,
        events: EventStream,
    ) -> Result<ReconcileSummary, ReconcileError> {
        self.start(chat_id).await?.consume(events).await
    }
}

/// Render state of one turn. Never shared between turns.
#[derive(Debug)]
struct RenderState {
    buffer: String,
    active: MessageHandle,
    /// Buffer contents as last delivered.
    rendered: String,
    last_flush: Instant,
    messages_sent: usize,
    edits: usize,
}

impl RenderState {
    fn new(placeholder: MessageHandle) -> Self {
        Self {
            buffer: String::new(),
            active: placeholder,
            rendered: String::new(),
            last_flush: Instant::now(),
            messages_sent: 1,
            edits: 0,
        }
    }
}

/// A turn in progress: feed events with [`push`](Self::push), end with
/// [`finish`](Self::finish).
pub struct RenderTurn<'a> {
    reconciler: &'a StreamReconciler,
    chat_id: i64,
    state: RenderState,
}

impl RenderTurn<'_> {
    /// Current buffer contents.
    pub fn buffer(&self) -> &str {
        &self.state.buffer
    }

    pub fn active(&self) -> MessageHandle {
        self.state.active
    }

    /// Append the event's fragment and flush if the interval has elapsed.
    ///
    /// A failed intermediate flush is logged and retried on a later event.
    pub async fn push(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::ToolCall { name, arguments, .. } => {
                debug!(chat_id = self.chat_id, tool = %name, %arguments, "tool call");
            }
            AgentEvent::ToolResult { name, result, .. } => {
                debug!(chat_id = self.chat_id, tool = %name, %result, "tool result");
            }
            AgentEvent::Error { message } => {
                warn!(chat_id = self.chat_id, error = %message, "agent reported an error");
            }
            _ => {}
        }

        let config = &self.reconciler.config;
        let Some(fragment) = format_event(event, config.max_result_length) else {
            return;
        };
        self.state.buffer.push_str(&fragment);

        if self.state.last_flush.elapsed() >= config.flush_interval {
            match self.flush().await {
                Ok(()) => self.state.last_flush = Instant::now(),
                Err(e) => {
                    warn!(chat_id = self.chat_id, error = %e, "intermediate flush failed");
                }
            }
        }
    }

    /// Final flush, regardless of the interval.
    pub async fn finish(mut self) -> Result<ReconcileSummary, TransportError> {
        self.flush().await?;
        Ok(ReconcileSummary {
            active: self.state.active,
            messages_sent: self.state.messages_sent,
            edits: self.state.edits,
        })
    }

    /// Drive the turn to the end of `events`.
    ///
    /// An `Err` item aborts the turn; in-band error events do not.
    pub async fn consume(
        mut self,
        mut events: EventStream,
    ) -> Result<ReconcileSummary, ReconcileError> {
        while let Some(item) = events.next().await {
            let event = item?;
            self.push(&event).await;
        }
        Ok(self.finish().await?)
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        let state = &mut self.state;
        if state.buffer.is_empty() || state.buffer == state.rendered {
            return Ok(());
        }

        let config = &self.reconciler.config;
        let transport = &self.reconciler.transport;
        let chat_id = self.chat_id;
        let text = state.buffer.as_str();
        let fits = text.chars().count() <= config.max_message_length;

        if fits {
            match transport
                .edit_message(chat_id, state.active, text, Markup::MarkdownV2)
                .await
            {
                Ok(()) => {
                    state.edits += 1;
                    state.rendered.clone_from(&state.buffer);
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        chat_id,
                        message_id = state.active.0,
                        error = %e,
                        "edit failed, sending new message"
                    );
                }
            }
        }

        let handle = match transport
            .send_message(chat_id, text, Markup::MarkdownV2)
            .await
        {
            Ok(handle) => handle,
            Err(e) if fits && !e.is_too_long() => return Err(e),
            Err(e) => {
                warn!(chat_id, error = %e, "message too long, sending truncated copy");
                let budget = config
                    .max_message_length
                    .saturating_sub(config.truncation_margin);
                let mut truncated = truncate_escaped(text, budget);
                truncated.push_str(&escape_markdown_v2(LENGTH_TRUNCATION_NOTICE));
                transport
                    .send_message(chat_id, &truncated, Markup::MarkdownV2)
                    .await?
            }
        };

        state.active = handle;
        state.messages_sent += 1;
        state.rendered.clone_from(&state.buffer);
        Ok(())
    }
}
