//! Per-message turn handling: early replies, language directives, streaming
//! and the generic failure notice.

use std::sync::Arc;

use skycast_agent::{AgentRuntime, TurnOptions};
use skycast_lang::{LanguageService, Resolution};
use tracing::{error, info, warn};

use crate::error::ReconcileError;
use crate::reconciler::{ReconcileSummary, ReconcilerConfig, StreamReconciler};
use crate::transport::{Markup, Transport};

pub const NON_TEXT_REPLY: &str = "Sorry, I can only process text messages.";
pub const ALWAYS_OK_REPLY: &str = "ok";
pub const FAILURE_REPLY: &str =
    "Sorry, I encountered an error processing your message. Please try again.";

/// Who sent an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

/// A platform-neutral inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub text: Option<String>,
    pub from: Option<Sender>,
}

impl IncomingMessage {
    /// Sender id, or `anonymous-<chat_id>` when the sender is unknown.
    pub fn user_id(&self) -> String {
        match &self.from {
            Some(sender) => sender.id.to_string(),
            None => format!("anonymous-{}", self.chat_id),
        }
    }

    pub fn conversation_id(&self) -> String {
        format!("telegram-{}", self.chat_id)
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The message had no text; the stock reply was sent.
    NonText,
    /// Liveness mode answered "ok" without running the agent.
    AlwaysOk,
    Completed(ReconcileSummary),
    /// The turn failed and the failure notice was sent.
    Failed,
}

/// System directives for one turn: who is speaking and in which language to
/// answer.
pub fn build_directives(message: &IncomingMessage, resolution: &Resolution) -> Vec<String> {
    let (first_name, username) = match &message.from {
        Some(sender) => (
            sender.first_name.as_deref().unwrap_or("unknown"),
            sender.username.as_deref().unwrap_or("unknown"),
        ),
        None => ("unknown", "unknown"),
    };
    vec![
        format!("Current user: {first_name} ({username})"),
        format!(
            "User preferred language: {lang} (source={source}). Respond ONLY in {lang}.",
            lang = resolution.lang,
            source = resolution.source
        ),
    ]
}

/// Runs inbound messages through the agent and streams the reply back.
pub struct TurnHandler {
    transport: Arc<dyn Transport>,
    runtime: Arc<dyn AgentRuntime>,
    language: LanguageService,
    reconciler: StreamReconciler,
    always_reply_ok: bool,
}

impl TurnHandler {
    pub fn new(
        transport: Arc<dyn Transport>,
        runtime: Arc<dyn AgentRuntime>,
        language: LanguageService,
        config: ReconcilerConfig,
    ) -> Self {
        let reconciler = StreamReconciler::new(Arc::clone(&transport), config);
        Self {
            transport,
            runtime,
            language,
            reconciler,
            always_reply_ok: false,
        }
    }

    /// Answer every text message with "ok" instead of running the agent.
    pub fn with_always_reply_ok(mut self, enabled: bool) -> Self {
        self.always_reply_ok = enabled;
        self
    }

    pub async fn handle(&self, message: &IncomingMessage) -> TurnOutcome {
        let chat_id = message.chat_id;
        let Some(text) = message.text.as_deref().filter(|t| !t.is_empty()) else {
            self.reply(chat_id, NON_TEXT_REPLY).await;
            return TurnOutcome::NonText;
        };
        let user_id = message.user_id();

        if self.always_reply_ok {
            info!(state = "always_reply_ok", chat_id, user_id = %user_id, "replying ok");
            self.reply(chat_id, ALWAYS_OK_REPLY).await;
            return TurnOutcome::AlwaysOk;
        }

        let resolution = self.language.ensure_language(&user_id, Some(text)).await;
        info!(
            chat_id,
            user_id = %user_id,
            lang = %resolution.lang,
            source = %resolution.source,
            "turn started"
        );

        let options = TurnOptions {
            conversation_id: message.conversation_id(),
            directives: build_directives(message, &resolution),
            user_id,
        };

        match self.stream_turn(chat_id, text, options).await {
            Ok(summary) => {
                info!(
                    chat_id,
                    messages_sent = summary.messages_sent,
                    edits = summary.edits,
                    "turn finished"
                );
                TurnOutcome::Completed(summary)
            }
            Err(e) => {
                error!(chat_id, error = %e, "turn failed");
                self.reply(chat_id, FAILURE_REPLY).await;
                TurnOutcome::Failed
            }
        }
    }

    async fn stream_turn(
        &self,
        chat_id: i64,
        text: &str,
        options: TurnOptions,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let turn = self.reconciler.start(chat_id).await?;
        let events = self.runtime.stream(text, options).await?;
        turn.consume(events).await
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_message(chat_id, text, Markup::Plain).await {
            warn!(chat_id, error = %e, "failed to send reply");
        }
    }
}
