//! Outbound messaging seam.

use async_trait::async_trait;

use crate::error::TransportError;

/// Identifier of a sent message, used as the target of later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub i64);

/// How the platform should parse message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    #[default]
    Plain,
    MarkdownV2,
}

impl Markup {
    /// Value for Telegram's `parse_mode` field, if any.
    pub fn parse_mode(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::MarkdownV2 => Some("MarkdownV2"),
        }
    }
}

/// A chat platform that can send and edit text messages.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Markup,
    ) -> Result<MessageHandle, TransportError>;

    /// Replace the text of a previously sent message.
    async fn edit_message(
        &self,
        chat_id: i64,
        message: MessageHandle,
        text: &str,
        markup: Markup,
    ) -> Result<(), TransportError>;
}
