//! Seams between the agent and the rest of the system.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::event::{EventStream, TurnOptions};
use crate::llm::ToolDefinition;

// ---------------------------------------------------------------------------
// Agent runtime
// ---------------------------------------------------------------------------

/// Something that turns a user message into an [`EventStream`].
///
/// Callers consume the stream to exhaustion; an error returned here, before
/// any event, is treated like an uncaught failure of the turn.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn stream(&self, user_text: &str, options: TurnOptions) -> Result<EventStream>;
}

// ---------------------------------------------------------------------------
// Tool adapters
// ---------------------------------------------------------------------------

/// A component exposing one or more tools to the model.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn adapter_id(&self) -> &str;

    fn tool_definitions(&self) -> Vec<ToolDefinition>;

    /// Run `tool_name` with JSON `arguments` and return its JSON output.
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<Value>;
}

/// Lookup over a fixed set of adapters.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    adapters: Vec<Arc<dyn ToolAdapter>>,
}

impl ToolRegistry {
    pub fn new(adapters: Vec<Arc<dyn ToolAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        tracing::debug!(adapter = adapter.adapter_id(), "tool adapter registered");
        self.adapters.push(adapter);
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.adapters
            .iter()
            .flat_map(|a| a.tool_definitions())
            .collect()
    }

    /// The adapter that owns `tool_name`.
    pub fn find(&self, tool_name: &str) -> Option<&Arc<dyn ToolAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.tool_definitions().iter().any(|td| td.name == tool_name))
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ToolAdapter for Echo {
        fn adapter_id(&self) -> &str {
            "echo"
        }

        fn tool_definitions(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition {
                name: "echo".into(),
                description: "Echo the input".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }]
        }

        async fn execute(&self, _tool_name: &str, arguments: Value) -> Result<Value> {
            Ok(arguments)
        }
    }

    #[test]
    fn registry_finds_owner() {
        let mut registry = ToolRegistry::default();
        assert!(registry.is_empty());
        registry.register(Arc::new(Echo));

        assert_eq!(registry.definitions().len(), 1);
        assert!(registry.find("echo").is_some());
        assert!(registry.find("missing").is_none());
    }
}
