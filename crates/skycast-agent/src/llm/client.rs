//! Client for OpenAI-compatible chat completion endpoints.
//!
//! Targets a self-hosted vLLM server but works against any endpoint that
//! speaks the Chat Completions streaming protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use url::Url;

use crate::error::{AgentError, Result};
use crate::llm::streaming::{StreamDelta, consume_sse};
use crate::llm::types::{ChatRequest, Completion, Message, Role, ToolDefinition};

// ---------------------------------------------------------------------------
// Model seam
// ---------------------------------------------------------------------------

/// Anything that can stream a chat completion.
///
/// [`LlmClient`] is the production implementation; tests script one.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_delta: &mut (dyn FnMut(StreamDelta) + Send),
    ) -> Result<Completion>;
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:8000/v1`.
    pub base_url: String,
    pub api_key: String,
    pub default_model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmClientConfig {
    pub fn openai_compatible(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            default_model: model.into(),
            max_tokens: 2048,
            timeout: Duration::from_secs(120),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmClientConfig,
    endpoint: Url,
    http: reqwest::Client,
}

impl LlmClient {
    /// Build a client. Fails when the base URL is not an absolute http(s) URL.
    pub fn new(config: LlmClientConfig) -> Result<Self> {
        let endpoint = completions_endpoint(&config.base_url)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            endpoint,
            http,
        })
    }

    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// The resolved `/chat/completions` URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the JSON body for a streaming request.
    pub fn build_request_body(&self, request: &ChatRequest) -> Value {
        let model = if request.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let mut body = json!({
            "model": model,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": messages_to_openai(&request.messages),
            "stream": true,
            "stream_options": { "include_usage": true },
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }
        if !request.tools.is_empty() {
            body["tools"] = tools_to_openai(&request.tools);
        }
        body
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.config.api_key)).map_err(|e| {
                AgentError::ConfigError {
                    reason: format!("invalid authorization header: {e}"),
                }
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_delta: &mut (dyn FnMut(StreamDelta) + Send),
    ) -> Result<Completion> {
        let body = self.build_request_body(request);
        tracing::debug!(
            url = %self.endpoint,
            model = %body["model"],
            messages = request.messages.len(),
            "sending LLM request"
        );

        let resp = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AgentError::LlmRequestFailed {
                reason: format!("API returned {status}: {text}"),
            });
        }

        let completion = consume_sse(resp.bytes_stream(), |d| on_delta(d)).await?;
        tracing::debug!(
            finish_reason = ?completion.finish_reason,
            tool_calls = completion.tool_calls.len(),
            output_tokens = completion.usage.output_tokens,
            "LLM stream finished"
        );
        Ok(completion)
    }
}

// ---------------------------------------------------------------------------
// Wire conversion
// ---------------------------------------------------------------------------

fn completions_endpoint(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let base = Url::parse(trimmed).map_err(|e| AgentError::ConfigError {
        reason: format!("invalid LLM base URL `{base_url}`: {e}"),
    })?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(AgentError::ConfigError {
            reason: format!("LLM base URL must be http or https, got `{}`", base.scheme()),
        });
    }
    Url::parse(&format!("{trimmed}/chat/completions")).map_err(|e| AgentError::ConfigError {
        reason: format!("invalid LLM endpoint: {e}"),
    })
}

/// Convert messages into the Chat Completions wire format.
pub fn messages_to_openai(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| match msg.role {
            Role::System => json!({ "role": "system", "content": msg.content }),
            Role::User => json!({ "role": "user", "content": msg.content }),
            Role::Assistant if msg.tool_calls.is_empty() => {
                json!({ "role": "assistant", "content": msg.content })
            }
            Role::Assistant => {
                let tool_calls: Vec<Value> = msg
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                "arguments": tc.arguments.to_string(),
                            }
                        })
                    })
                    .collect();
                let mut m = json!({ "role": "assistant", "tool_calls": tool_calls });
                if !msg.content.is_empty() {
                    m["content"] = json!(msg.content);
                }
                m
            }
            Role::Tool => json!({
                "role": "tool",
                "tool_call_id": msg.tool_call_id,
                "content": msg.content,
            }),
        })
        .collect()
}

/// Wrap tool definitions as `{"type": "function", "function": {...}}`.
pub fn tools_to_openai(tools: &[ToolDefinition]) -> Value {
    Value::Array(
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema,
                    }
                })
            })
            .collect(),
    )
}
