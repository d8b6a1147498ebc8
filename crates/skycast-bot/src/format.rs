//! Rendering of agent events into MarkdownV2 message fragments.

use serde::Serialize;
use skycast_agent::AgentEvent;

use crate::markdown::{escape_markdown_v2, truncate_escaped};

/// Appended to tool results cut at the result length limit.
pub const RESULT_TRUNCATION_MARKER: &str = "... [truncated]";

/// The fragment an event contributes to the message buffer, or `None` for
/// event kinds that are not displayed.
pub fn format_event(event: &AgentEvent, max_result_length: usize) -> Option<String> {
    match event {
        AgentEvent::TextDelta { text } => Some(escape_markdown_v2(text)),
        AgentEvent::ToolCall {
            name, arguments, ..
        } => Some(format_tool_call(name, arguments)),
        AgentEvent::ToolResult { result, .. } => Some(format!(
            "✨ Result:\n```\n{}\n```\n",
            format_tool_result(result, max_result_length)
        )),
        AgentEvent::Reasoning { text } => Some(format!("\n💭 {}\n", escape_markdown_v2(text))),
        AgentEvent::Error { message } => {
            Some(format!("\n❌ Error: {}\n", escape_markdown_v2(message)))
        }
        AgentEvent::StepFinish { .. } | AgentEvent::Usage { .. } | AgentEvent::Finish { .. } => {
            None
        }
    }
}

fn format_tool_call(name: &str, arguments: &serde_json::Value) -> String {
    let args = serde_json::to_string_pretty(arguments).unwrap_or_else(|_| arguments.to_string());
    format!(
        "\n🛠️ Using tool: {}\nArguments:\n```\n{}\n```\n",
        escape_markdown_v2(name),
        escape_markdown_v2(&args)
    )
}

/// Escaped pretty JSON of `value`, at most `max_chars` long.
///
/// Longer output is cut and ends with the escaped
/// [`RESULT_TRUNCATION_MARKER`], the marker counting towards `max_chars`. A
/// value that cannot be serialized renders as a short placeholder naming its
/// type.
pub fn format_tool_result<T: Serialize + ?Sized>(value: &T, max_chars: usize) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let escaped = escape_markdown_v2(&json);
            if escaped.chars().count() <= max_chars {
                return escaped;
            }
            let marker = escape_markdown_v2(RESULT_TRUNCATION_MARKER);
            let budget = max_chars.saturating_sub(marker.chars().count());
            // Backticks are escaped, so the cut never has a fence to close.
            let mut out = truncate_escaped(&escaped, budget);
            out.push_str(&marker);
            out
        }
        Err(e) => {
            let type_name = short_type_name(std::any::type_name::<T>());
            tracing::debug!(error = %e, type_name, "tool result is not serializable");
            escape_markdown_v2(&format!("[Complex data structure - {type_name}]"))
        }
    }
}

/// `alloc::vec::Vec<my::Thing>` -> `Vec<Thing>`.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            segment.push(c);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or_default());
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or_default());
    out
}
