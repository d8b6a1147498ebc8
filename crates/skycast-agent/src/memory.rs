//! Per-conversation message history, kept in process.

use dashmap::DashMap;

use crate::llm::{Message, Role};

/// Recent messages per conversation id, capped at `window` entries.
#[derive(Debug)]
pub struct ConversationMemory {
    window: usize,
    conversations: DashMap<String, Vec<Message>>,
}

impl ConversationMemory {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            conversations: DashMap::new(),
        }
    }

    /// Snapshot of the stored history.
    pub fn history(&self, conversation_id: &str) -> Vec<Message> {
        self.conversations
            .get(conversation_id)
            .map(|h| h.value().clone())
            .unwrap_or_default()
    }

    /// Append a finished exchange and trim to the window.
    ///
    /// Trimming never leaves the history starting with tool traffic, whose
    /// originating assistant message would be gone.
    pub fn append(&self, conversation_id: &str, messages: impl IntoIterator<Item = Message>) {
        if self.window == 0 {
            return;
        }
        let mut entry = self
            .conversations
            .entry(conversation_id.to_owned())
            .or_default();
        let history = entry.value_mut();
        history.extend(messages);

        if history.len() > self.window {
            let mut start = history.len() - self.window;
            while start < history.len() && history[start].role != Role::User {
                start += 1;
            }
            history.drain(..start);
        }
    }

    pub fn clear(&self, conversation_id: &str) {
        self.conversations.remove(conversation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolCall;

    #[test]
    fn unknown_conversation_is_empty() {
        assert!(ConversationMemory::new(4).history("nope").is_empty());
    }

    #[test]
    fn conversations_are_isolated() {
        let memory = ConversationMemory::new(10);
        memory.append("a", [Message::user("hi a")]);
        memory.append("b", [Message::user("hi b")]);
        assert_eq!(memory.history("a")[0].content, "hi a");
        assert_eq!(memory.history("b").len(), 1);
    }

    #[test]
    fn window_trims_to_user_boundary() {
        let memory = ConversationMemory::new(3);
        let call = ToolCall {
            id: "c".into(),
            name: "weather".into(),
            arguments: serde_json::json!({}),
        };
        memory.append(
            "t",
            [
                Message::user("q1"),
                Message::assistant_tool_calls("", vec![call]),
                Message::tool_result("c", "{}"),
                Message::assistant("a1"),
                Message::user("q2"),
                Message::assistant("a2"),
            ],
        );

        let history = memory.history("t");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "q2");
    }

    #[test]
    fn zero_window_keeps_nothing() {
        let memory = ConversationMemory::new(0);
        memory.append("t", [Message::user("q")]);
        assert!(memory.history("t").is_empty());
    }

    #[test]
    fn clear_drops_history() {
        let memory = ConversationMemory::new(5);
        memory.append("t", [Message::user("q")]);
        memory.clear("t");
        assert!(memory.history("t").is_empty());
    }
}
