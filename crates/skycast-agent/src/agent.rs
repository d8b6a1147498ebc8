//! Streaming ReAct agent.
//!
//! Each turn runs on its own task. The task calls the model, forwards text
//! and reasoning deltas as they stream in, executes requested tools one at
//! a time, and loops until the model answers without tools or the turn
//! budget runs out. Events flow to the caller over an unbounded channel.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::event::{AgentEvent, EventStream, TurnOptions};
use crate::instructions::with_timestamp;
use crate::llm::{ChatModel, ChatRequest, Message, StreamDelta, ToolCall};
use crate::memory::ConversationMemory;
use crate::runtime::{AgentRuntime, ToolRegistry};

type EventSender = mpsc::UnboundedSender<Result<AgentEvent>>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Empty selects the client's default model.
    pub model: String,
    /// Model round-trips allowed per user turn.
    pub max_turns: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Messages of history kept per conversation.
    pub history_window: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_turns: 8,
            temperature: Some(0.3),
            max_tokens: Some(2048),
            history_window: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// [`AgentRuntime`] over a [`ChatModel`] and a set of tools.
#[derive(Clone)]
pub struct StreamingAgent {
    inner: Arc<Inner>,
}

struct Inner {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    instructions: String,
    config: AgentConfig,
    memory: ConversationMemory,
}

impl StreamingAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        instructions: impl Into<String>,
        config: AgentConfig,
    ) -> Self {
        let memory = ConversationMemory::new(config.history_window);
        Self {
            inner: Arc::new(Inner {
                model,
                tools,
                instructions: instructions.into(),
                config,
                memory,
            }),
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.inner.memory
    }
}

#[async_trait]
impl AgentRuntime for StreamingAgent {
    async fn stream(&self, user_text: &str, options: TurnOptions) -> Result<EventStream> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let inner = Arc::clone(&self.inner);
        let user_text = user_text.to_owned();

        let watcher_tx = tx.clone();
        let worker = tokio::spawn(async move { inner.run_turn(user_text, options, tx).await });
        tokio::spawn(async move {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "agent turn task failed");
                let _ = watcher_tx.send(Err(AgentError::Internal(format!(
                    "agent turn task failed: {e}"
                ))));
            }
        });

        Ok(Box::pin(futures::stream::poll_fn(move |cx| {
            rx.poll_recv(cx)
        })))
    }
}

impl Inner {
    async fn run_turn(&self, user_text: String, options: TurnOptions, tx: EventSender) {
        let turn_id = Uuid::now_v7();
        let tools = self.tools.definitions();

        let mut messages = vec![Message::system(with_timestamp(
            &self.instructions,
            chrono::Utc::now(),
        ))];
        messages.extend(options.directives.iter().map(Message::system));
        messages.extend(self.memory.history(&options.conversation_id));
        messages.push(Message::user(user_text.as_str()));

        let mut exchange = vec![Message::user(user_text)];

        tracing::info!(
            turn_id = %turn_id,
            conversation_id = %options.conversation_id,
            user_id = %options.user_id,
            directives = options.directives.len(),
            tool_count = tools.len(),
            "agent turn started"
        );

        for step in 1..=self.config.max_turns {
            if tx.is_closed() {
                tracing::debug!(turn_id = %turn_id, "event receiver dropped, stopping turn");
                return;
            }

            let request = ChatRequest {
                model: self.config.model.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            };

            let mut forward = |delta: StreamDelta| {
                let event = match delta {
                    StreamDelta::Text(text) => AgentEvent::TextDelta { text },
                    StreamDelta::Reasoning(text) => AgentEvent::Reasoning { text },
                };
                let _ = tx.send(Ok(event));
            };

            let completion = match self.model.stream_chat(&request, &mut forward).await {
                Ok(completion) => completion,
                Err(e) => {
                    tracing::warn!(turn_id = %turn_id, step, error = %e, "model call failed");
                    let _ = tx.send(Ok(AgentEvent::error(e.to_string())));
                    let _ = tx.send(Ok(AgentEvent::Finish {
                        reason: "error".into(),
                    }));
                    return;
                }
            };

            if completion.usage.input_tokens > 0 || completion.usage.output_tokens > 0 {
                let _ = tx.send(Ok(AgentEvent::Usage {
                    input_tokens: completion.usage.input_tokens,
                    output_tokens: completion.usage.output_tokens,
                }));
            }
            let _ = tx.send(Ok(AgentEvent::StepFinish { turn: step }));

            if completion.tool_calls.is_empty() {
                exchange.push(Message::assistant(completion.text));
                self.memory.append(&options.conversation_id, exchange);

                let reason = completion.finish_reason.unwrap_or_else(|| "stop".into());
                tracing::info!(turn_id = %turn_id, steps = step, %reason, "agent turn finished");
                let _ = tx.send(Ok(AgentEvent::Finish { reason }));
                return;
            }

            tracing::info!(
                turn_id = %turn_id,
                step,
                tools = ?completion.tool_calls.iter().map(|c| &c.name).collect::<Vec<_>>(),
                "model requested tools"
            );

            let assistant =
                Message::assistant_tool_calls(completion.text, completion.tool_calls.clone());
            messages.push(assistant.clone());
            exchange.push(assistant);

            for call in completion.tool_calls {
                let _ = tx.send(Ok(AgentEvent::ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                }));

                let result = self.execute_tool(&call).await;

                let reply = Message::tool_result(call.id.as_str(), result.to_string());
                messages.push(reply.clone());
                exchange.push(reply);

                let _ = tx.send(Ok(AgentEvent::ToolResult {
                    id: call.id,
                    name: call.name,
                    result,
                }));
            }
        }

        self.memory.append(&options.conversation_id, exchange);
        tracing::warn!(
            turn_id = %turn_id,
            max_turns = self.config.max_turns,
            "agent turn exhausted its step budget"
        );
        let _ = tx.send(Ok(AgentEvent::error(format!(
            "Stopped after {} steps without a final answer.",
            self.config.max_turns
        ))));
        let _ = tx.send(Ok(AgentEvent::Finish {
            reason: "max-turns".into(),
        }));
    }

    /// Run one tool. Failures become `{"error": "..."}` for the model to read.
    async fn execute_tool(&self, call: &ToolCall) -> Value {
        let Some(adapter) = self.tools.find(&call.name) else {
            let e = AgentError::UnknownTool {
                tool_name: call.name.clone(),
            };
            tracing::warn!(tool = %call.name, "model requested unknown tool");
            return json!({ "error": e.to_string() });
        };

        tracing::debug!(
            tool = %call.name,
            id = %call.id,
            adapter = adapter.adapter_id(),
            "executing tool"
        );
        match adapter.execute(&call.name, call.arguments.clone()).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool execution failed");
                json!({ "error": e.to_string() })
            }
        }
    }
}
