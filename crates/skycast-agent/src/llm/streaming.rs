//! SSE parsing for the OpenAI Chat Completions streaming format.
//!
//! Each `data:` line carries a JSON chunk with `choices[0].delta`; the stream
//! ends with `data: [DONE]`. Text and reasoning deltas are surfaced as they
//! arrive; tool-call fragments are stitched together by index and only
//! become visible in the final [`Completion`].

use std::fmt::Display;

use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::llm::types::{Completion, ToolCall, Usage};

/// An incremental piece of model output worth rendering immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDelta {
    Text(String),
    /// Chain-of-thought text from reasoning models (`reasoning_content`).
    Reasoning(String),
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Accumulates `data:` lines into a [`Completion`].
#[derive(Debug, Default)]
pub struct OpenAiStreamAccumulator {
    text: String,
    tool_call_builders: Vec<ToolCallBuilder>,
    finish_reason: Option<String>,
    usage: Usage,
    done: bool,
}

#[derive(Debug, Default)]
struct ToolCallBuilder {
    id: String,
    name: String,
    arguments: String,
}

impl OpenAiStreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `[DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one SSE line. Returns the renderable deltas it carried.
    pub fn feed_line(&mut self, line: &str) -> Result<Vec<StreamDelta>> {
        let line = line.trim_end();
        let Some(data) = line.strip_prefix("data:") else {
            // Blank lines, `:` comments, `event:` and `id:` fields.
            return Ok(Vec::new());
        };
        let data = data.trim();

        if data == "[DONE]" {
            self.done = true;
            return Ok(Vec::new());
        }

        let v: Value = serde_json::from_str(data).map_err(|e| AgentError::LlmParseFailed {
            reason: format!("invalid JSON in SSE data: {e}"),
        })?;

        if let Some(message) = v["error"]["message"].as_str() {
            return Err(AgentError::LlmStreamError {
                reason: message.to_owned(),
            });
        }

        if let Some(usage) = v.get("usage").filter(|u| !u.is_null()) {
            if let Some(input) = usage["prompt_tokens"].as_u64() {
                self.usage.input_tokens = u32::try_from(input).unwrap_or(u32::MAX);
            }
            if let Some(output) = usage["completion_tokens"].as_u64() {
                self.usage.output_tokens = u32::try_from(output).unwrap_or(u32::MAX);
            }
        }

        let choice = &v["choices"][0];
        if let Some(reason) = choice["finish_reason"].as_str() {
            self.finish_reason = Some(reason.to_owned());
        }

        let delta = &choice["delta"];
        if delta.is_null() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();

        // vLLM uses `reasoning_content`; some newer servers use `reasoning`.
        let reasoning = delta["reasoning_content"]
            .as_str()
            .or_else(|| delta["reasoning"].as_str());
        if let Some(r) = reasoning.filter(|r| !r.is_empty()) {
            out.push(StreamDelta::Reasoning(r.to_owned()));
        }

        if let Some(content) = delta["content"].as_str().filter(|c| !c.is_empty()) {
            self.text.push_str(content);
            out.push(StreamDelta::Text(content.to_owned()));
        }

        if let Some(tool_calls) = delta["tool_calls"].as_array() {
            for tc in tool_calls {
                let index = tc["index"]
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .unwrap_or(0);
                if self.tool_call_builders.len() <= index {
                    self.tool_call_builders
                        .resize_with(index + 1, ToolCallBuilder::default);
                }
                let builder = &mut self.tool_call_builders[index];

                if let Some(id) = tc["id"].as_str() {
                    builder.id = id.to_owned();
                }
                let func = &tc["function"];
                if let Some(name) = func["name"].as_str() {
                    builder.name.push_str(name);
                }
                if let Some(args) = func["arguments"].as_str() {
                    builder.arguments.push_str(args);
                }
            }
        }

        Ok(out)
    }

    /// Finish the stream and assemble tool calls.
    pub fn into_completion(self) -> Result<Completion> {
        let tool_calls = self
            .tool_call_builders
            .into_iter()
            .filter(|b| !b.name.is_empty())
            .enumerate()
            .map(|(i, b)| {
                let arguments = if b.arguments.trim().is_empty() {
                    Value::Object(Default::default())
                } else {
                    serde_json::from_str(&b.arguments).map_err(|e| AgentError::LlmParseFailed {
                        reason: format!("invalid JSON in tool call `{}` arguments: {e}", b.name),
                    })?
                };
                let id = if b.id.is_empty() {
                    format!("call_{i}")
                } else {
                    b.id
                };
                Ok(ToolCall {
                    id,
                    name: b.name,
                    arguments,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Completion {
            text: self.text,
            tool_calls,
            finish_reason: self.finish_reason,
            usage: self.usage,
        })
    }
}

// ---------------------------------------------------------------------------
// Byte stream consumption
// ---------------------------------------------------------------------------

/// Drain an SSE byte stream, reporting deltas through `on_delta`.
///
/// Lines are split on raw bytes so a multi-byte character straddling two
/// network chunks is decoded only once the line is complete.
pub async fn consume_sse<S, B, E, F>(stream: S, mut on_delta: F) -> Result<Completion>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(StreamDelta),
{
    let mut stream = std::pin::pin!(stream);
    let mut acc = OpenAiStreamAccumulator::new();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AgentError::LlmStreamError {
            reason: format!("stream read error: {e}"),
        })?;
        buffer.extend_from_slice(chunk.as_ref());

        while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            let line = std::str::from_utf8(&line).map_err(|e| AgentError::LlmStreamError {
                reason: format!("invalid UTF-8 in stream: {e}"),
            })?;

            for delta in acc.feed_line(line)? {
                on_delta(delta);
            }
            if acc.is_done() {
                return acc.into_completion();
            }
        }
    }

    // Trailing line without a newline.
    if !buffer.is_empty() {
        let line = String::from_utf8_lossy(&buffer);
        for delta in acc.feed_line(&line)? {
            on_delta(delta);
        }
    }

    acc.into_completion()
}
