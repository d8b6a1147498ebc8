//! Telegram Bot API client.
//!
//! All methods are POSTed as JSON to `{api_base}/bot{token}/{method}`.
//! Responses follow `{ "ok": true, "result": ... }` on success and
//! `{ "ok": false, "error_code": 400, "description": "..." }` on failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{Markup, MessageHandle, Transport};
use crate::turn::{IncomingMessage, Sender};

/// Telegram Bot API host.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Timeout for ordinary calls. Long polls add their own poll timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

impl From<Message> for IncomingMessage {
    fn from(message: Message) -> Self {
        Self {
            chat_id: message.chat.id,
            text: message.text,
            from: message.from.map(|user| Sender {
                id: user.id,
                first_name: Some(user.first_name),
                username: user.username,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Telegram transport and update source.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    bot_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_api_base(TELEGRAM_API_BASE, token)
    }

    /// Client against a different API host (local Bot API server, tests).
    pub fn with_api_base(api_base: &str, token: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("skycast/0.1")
            .build()
            .unwrap_or_default();
        Self {
            http,
            bot_url: format!("{}/bot{token}", api_base.trim_end_matches('/')),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.bot_url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<T, TransportError> {
        debug!(method, "calling Telegram API");
        let response: ApiResponse<T> = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        parse_response(response)
    }

    /// The bot's own account; fails on an invalid token.
    pub async fn get_me(&self) -> Result<User, TransportError> {
        self.call("getMe", &json!({}), Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .await
    }

    /// Long-poll for updates with `update_id >= offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        let body = json!({
            "offset": offset,
            "timeout": poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        self.call(
            "getUpdates",
            &body,
            Duration::from_secs(poll_timeout_secs + REQUEST_TIMEOUT_SECS),
        )
        .await
    }
}

fn parse_response<T>(response: ApiResponse<T>) -> Result<T, TransportError> {
    if !response.ok {
        return Err(TransportError::Api {
            code: response.error_code.unwrap_or(-1),
            description: response
                .description
                .unwrap_or_else(|| "unknown error".into()),
        });
    }
    response
        .result
        .ok_or_else(|| TransportError::Decode("missing `result` in ok response".into()))
}

fn message_body(chat_id: i64, text: &str, markup: Markup) -> Value {
    let mut body = json!({ "chat_id": chat_id, "text": text });
    if let Some(mode) = markup.parse_mode() {
        body["parse_mode"] = json!(mode);
    }
    body
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Markup,
    ) -> Result<MessageHandle, TransportError> {
        let sent: Message = self
            .call(
                "sendMessage",
                &message_body(chat_id, text, markup),
                Duration::from_secs(REQUEST_TIMEOUT_SECS),
            )
            .await?;
        Ok(MessageHandle(sent.message_id))
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message: MessageHandle,
        text: &str,
        markup: Markup,
    ) -> Result<(), TransportError> {
        let mut body = message_body(chat_id, text, markup);
        body["message_id"] = json!(message.0);
        // `result` is the edited message, or `true` for inline messages.
        let _: Value = self
            .call(
                "editMessageText",
                &body,
                Duration::from_secs(REQUEST_TIMEOUT_SECS),
            )
            .await?;
        Ok(())
    }
}
