//! Integration tests for skycast-bot.
//!
//! Turns run against a recording transport and a scripted agent runtime;
//! nothing touches the network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use skycast_agent::{AgentError, AgentEvent, AgentRuntime, EventStream, TurnOptions};
use skycast_bot::turn::{ALWAYS_OK_REPLY, FAILURE_REPLY, NON_TEXT_REPLY};
use skycast_bot::{
    IncomingMessage, LENGTH_TRUNCATION_NOTICE, Markup, MessageHandle, PLACEHOLDER_TEXT,
    ReconcilerConfig, Sender, Transport, TransportError, TurnHandler, TurnOutcome,
    escape_markdown_v2,
};
use skycast_lang::{LanguageConfig, LanguageService};
use skycast_store::InMemoryLanguageStore;

// ═══════════════════════════════════════════════════════════════════════
//  Fakes
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Send {
        chat_id: i64,
        text: String,
        markup: Markup,
    },
    Edit {
        chat_id: i64,
        message: i64,
        text: String,
    },
}

/// Records every call; rejects texts longer than `max_len` chars and the
/// first `edit_failures` edits.
struct MockTransport {
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<i64>,
    max_len: usize,
    edit_failures: Mutex<usize>,
}

impl MockTransport {
    fn new(max_len: usize) -> Arc<Self> {
        Self::with_edit_failures(max_len, 0)
    }

    fn with_edit_failures(max_len: usize, edit_failures: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            next_id: Mutex::new(100),
            max_len,
            edit_failures: Mutex::new(edit_failures),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, chat: i64) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| match c {
                Call::Send { chat_id, .. } | Call::Edit { chat_id, .. } => *chat_id == chat,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Markup,
    ) -> Result<MessageHandle, TransportError> {
        self.calls.lock().unwrap().push(Call::Send {
            chat_id,
            text: text.to_owned(),
            markup,
        });
        if text.chars().count() > self.max_len {
            return Err(TransportError::Api {
                code: 400,
                description: "Bad Request: message is too long".into(),
            });
        }
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(MessageHandle(*next))
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message: MessageHandle,
        text: &str,
        _markup: Markup,
    ) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Call::Edit {
            chat_id,
            message: message.0,
            text: text.to_owned(),
        });
        if text.chars().count() > self.max_len {
            return Err(TransportError::Api {
                code: 400,
                description: "Bad Request: MESSAGE_TOO_LONG".into(),
            });
        }
        let mut failures = self.edit_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(TransportError::Api {
                code: 400,
                description: "Bad Request: message to edit not found".into(),
            });
        }
        Ok(())
    }
}

enum Script {
    /// Yield these items.
    Items(Vec<Result<AgentEvent, &'static str>>),
    /// Reply "echo: <text>".
    Echo,
    /// Refuse to start the turn.
    Refuse,
}

struct ScriptedRuntime {
    script: Script,
    seen: Mutex<Vec<TurnOptions>>,
}

impl ScriptedRuntime {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            seen: Mutex::default(),
        })
    }

    fn seen(&self) -> Vec<TurnOptions> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn stream(
        &self,
        user_text: &str,
        options: TurnOptions,
    ) -> skycast_agent::Result<EventStream> {
        self.seen.lock().unwrap().push(options);
        let items: Vec<skycast_agent::Result<AgentEvent>> = match &self.script {
            Script::Items(items) => items
                .iter()
                .map(|item| match item {
                    Ok(event) => Ok(event.clone()),
                    Err(reason) => Err(AgentError::Internal((*reason).into())),
                })
                .collect(),
            Script::Echo => vec![
                Ok(AgentEvent::text(format!("echo: {user_text}"))),
                Ok(AgentEvent::Finish {
                    reason: "stop".into(),
                }),
            ],
            Script::Refuse => {
                return Err(AgentError::LlmRequestFailed {
                    reason: "connection refused".into(),
                });
            }
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

struct Harness {
    transport: Arc<MockTransport>,
    runtime: Arc<ScriptedRuntime>,
    language: LanguageService,
    handler: TurnHandler,
}

fn harness(script: Script, config: ReconcilerConfig, max_len: usize) -> Harness {
    harness_on(MockTransport::new(max_len), script, config)
}

fn harness_on(transport: Arc<MockTransport>, script: Script, config: ReconcilerConfig) -> Harness {
    let runtime = ScriptedRuntime::new(script);
    let language = LanguageService::new(
        Arc::new(InMemoryLanguageStore::new()),
        LanguageConfig::new("en", ["en", "vi"], true, 8),
    );
    let handler = TurnHandler::new(
        transport.clone(),
        runtime.clone(),
        language.clone(),
        config,
    );
    Harness {
        transport,
        runtime,
        language,
        handler,
    }
}

fn throttled() -> ReconcilerConfig {
    ReconcilerConfig {
        flush_interval: Duration::from_secs(3600),
        ..ReconcilerConfig::default()
    }
}

fn text_message(chat_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id,
        text: Some(text.into()),
        from: Some(Sender {
            id: chat_id * 10,
            first_name: Some("An".into()),
            username: Some("an_vn".into()),
        }),
    }
}

fn last_text(calls: &[Call]) -> &str {
    match calls.last() {
        Some(Call::Send { text, .. } | Call::Edit { text, .. }) => text,
        None => "",
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Turns
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn streamed_turn_edits_placeholder() {
    let h = harness(
        Script::Items(vec![
            Ok(AgentEvent::ToolCall {
                id: "c1".into(),
                name: "weather".into(),
                arguments: json!({ "location": "Hanoi" }),
            }),
            Ok(AgentEvent::ToolResult {
                id: "c1".into(),
                name: "weather".into(),
                result: json!({ "temperature": 31.5 }),
            }),
            Ok(AgentEvent::StepFinish { turn: 1 }),
            Ok(AgentEvent::text("Hà Nội: 31.5°C.")),
            Ok(AgentEvent::Finish {
                reason: "stop".into(),
            }),
        ]),
        throttled(),
        4096,
    );

    let outcome = h.handler.handle(&text_message(1, "Thời tiết Hà Nội hôm nay?")).await;
    assert!(matches!(outcome, TurnOutcome::Completed(_)));

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        Call::Send {
            chat_id: 1,
            text: PLACEHOLDER_TEXT.into(),
            markup: Markup::Plain,
        }
    );
    let Call::Edit { message, text, .. } = &calls[1] else {
        panic!("expected an edit, got {:?}", calls[1]);
    };
    assert_eq!(*message, 101);
    assert!(text.starts_with("\n🛠️ Using tool: weather\n"));
    assert!(text.contains("\"temperature\": 31\\.5"));
    assert!(text.ends_with("Hà Nội: 31\\.5°C\\."));
}

#[tokio::test]
async fn turn_carries_identity_and_language_directives() {
    let h = harness(Script::Echo, throttled(), 4096);
    h.handler
        .handle(&text_message(2, "Cho tôi biết thời tiết ở Huế"))
        .await;

    let seen = h.runtime.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].conversation_id, "telegram-2");
    assert_eq!(seen[0].user_id, "20");
    assert_eq!(
        seen[0].directives,
        vec![
            "Current user: An (an_vn)".to_owned(),
            "User preferred language: vi (source=detected). Respond ONLY in vi.".to_owned(),
        ]
    );
    // Detection persisted the preference.
    assert_eq!(h.language.get_language("20").await.unwrap().as_deref(), Some("vi"));
}

#[tokio::test]
async fn stored_language_wins_over_sample() {
    let h = harness(Script::Echo, throttled(), 4096);
    h.language.set_language("30", "en").await.unwrap();
    h.handler.handle(&text_message(3, "Thời tiết hôm nay")).await;

    let seen = h.runtime.seen();
    assert!(seen[0].directives[1].contains("en (source=stored)"));
}

#[tokio::test]
async fn non_text_message_gets_stock_reply() {
    let h = harness(Script::Echo, throttled(), 4096);
    let message = IncomingMessage {
        chat_id: 4,
        text: None,
        from: None,
    };

    assert_eq!(h.handler.handle(&message).await, TurnOutcome::NonText);
    assert_eq!(
        h.transport.calls(),
        vec![Call::Send {
            chat_id: 4,
            text: NON_TEXT_REPLY.into(),
            markup: Markup::Plain,
        }]
    );
    assert!(h.runtime.seen().is_empty());
}

#[tokio::test]
async fn always_reply_ok_skips_the_agent() {
    let mut h = harness(Script::Echo, throttled(), 4096);
    h.handler = h.handler.with_always_reply_ok(true);

    assert_eq!(
        h.handler.handle(&text_message(5, "hello there")).await,
        TurnOutcome::AlwaysOk
    );
    assert_eq!(last_text(&h.transport.calls()), ALWAYS_OK_REPLY);
    assert!(h.runtime.seen().is_empty());
}

#[tokio::test]
async fn in_band_error_does_not_abort() {
    let h = harness(
        Script::Items(vec![
            Ok(AgentEvent::error("geocoder timeout")),
            Ok(AgentEvent::text("Trying again.")),
        ]),
        throttled(),
        4096,
    );

    let outcome = h.handler.handle(&text_message(6, "weather")).await;
    assert!(matches!(outcome, TurnOutcome::Completed(_)));
    let calls = h.transport.calls();
    assert_eq!(
        last_text(&calls),
        "\n❌ Error: geocoder timeout\nTrying again\\."
    );
}

#[tokio::test]
async fn runtime_failure_sends_generic_notice() {
    let h = harness(
        Script::Items(vec![Ok(AgentEvent::text("Partial")), Err("task panicked")]),
        throttled(),
        4096,
    );

    assert_eq!(
        h.handler.handle(&text_message(7, "weather")).await,
        TurnOutcome::Failed
    );
    let calls = h.transport.calls();
    assert_eq!(
        calls.last(),
        Some(&Call::Send {
            chat_id: 7,
            text: FAILURE_REPLY.into(),
            markup: Markup::Plain,
        })
    );
    // The partial buffer is discarded, never flushed.
    assert_eq!(calls.len(), 2);
}

#[tokio::test]
async fn refused_turn_sends_generic_notice() {
    let h = harness(Script::Refuse, throttled(), 4096);
    assert_eq!(
        h.handler.handle(&text_message(8, "weather")).await,
        TurnOutcome::Failed
    );
    assert_eq!(last_text(&h.transport.calls()), FAILURE_REPLY);
}

// ═══════════════════════════════════════════════════════════════════════
//  Update-or-split
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn overlong_buffer_falls_back_to_truncated_message() {
    let config = ReconcilerConfig {
        max_message_length: 200,
        truncation_margin: 100,
        ..throttled()
    };
    let h = harness(
        Script::Items(vec![Ok(AgentEvent::text("a".repeat(300)))]),
        config,
        200,
    );

    let outcome = h.handler.handle(&text_message(9, "weather")).await;
    let TurnOutcome::Completed(summary) = outcome else {
        panic!("turn failed: {outcome:?}");
    };

    let calls = h.transport.calls();
    // Placeholder, rejected full send, truncated send. No edit is tried.
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| matches!(c, Call::Send { .. })));
    let final_text = last_text(&calls);
    assert!(final_text.starts_with(&"a".repeat(100)));
    assert!(final_text.ends_with(&escape_markdown_v2(LENGTH_TRUNCATION_NOTICE)));
    assert!(final_text.chars().count() <= 200);
    assert_eq!(summary.active, MessageHandle(102));
}

#[tokio::test]
async fn growing_reply_splits_into_a_new_message() {
    let config = ReconcilerConfig {
        max_message_length: 10,
        truncation_margin: 0,
        flush_interval: Duration::ZERO,
        ..ReconcilerConfig::default()
    };
    // The transport accepts more than the configured limit, so the split
    // send succeeds with the full buffer.
    let h = harness(
        Script::Items(vec![
            Ok(AgentEvent::text("12345")),
            Ok(AgentEvent::text("67890")),
            Ok(AgentEvent::text("abc")),
        ]),
        config,
        4096,
    );

    let outcome = h.handler.handle(&text_message(10, "weather")).await;
    let TurnOutcome::Completed(summary) = outcome else {
        panic!("turn failed: {outcome:?}");
    };

    let calls = h.transport.calls_for(10);
    assert_eq!(
        calls[1..],
        [
            Call::Edit {
                chat_id: 10,
                message: 101,
                text: "12345".into()
            },
            Call::Edit {
                chat_id: 10,
                message: 101,
                text: "1234567890".into()
            },
            Call::Send {
                chat_id: 10,
                text: "1234567890abc".into(),
                markup: Markup::MarkdownV2
            },
        ]
    );
    assert_eq!(summary.active, MessageHandle(102));
    assert_eq!(summary.messages_sent, 2);
}

#[tokio::test]
async fn edits_target_the_replacement_after_a_lost_message() {
    let config = ReconcilerConfig {
        flush_interval: Duration::ZERO,
        ..ReconcilerConfig::default()
    };
    let h = harness_on(
        MockTransport::with_edit_failures(4096, 1),
        Script::Items(vec![
            Ok(AgentEvent::text("Hue: ")),
            Ok(AgentEvent::text("27")),
            Ok(AgentEvent::text("°C")),
        ]),
        config,
    );

    let outcome = h.handler.handle(&text_message(11, "weather")).await;
    let TurnOutcome::Completed(summary) = outcome else {
        panic!("turn failed: {outcome:?}");
    };

    let calls = h.transport.calls_for(11);
    assert_eq!(
        calls[1..],
        [
            Call::Edit {
                chat_id: 11,
                message: 101,
                text: "Hue: ".into()
            },
            Call::Send {
                chat_id: 11,
                text: "Hue: ".into(),
                markup: Markup::MarkdownV2
            },
            Call::Edit {
                chat_id: 11,
                message: 102,
                text: "Hue: 27".into()
            },
            Call::Edit {
                chat_id: 11,
                message: 102,
                text: "Hue: 27°C".into()
            },
        ]
    );
    assert_eq!(summary.active, MessageHandle(102));
    assert_eq!(summary.messages_sent, 2);
    assert_eq!(summary.edits, 2);
}

// ═══════════════════════════════════════════════════════════════════════
//  Concurrency
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn concurrent_turns_keep_separate_buffers() {
    let h = Arc::new(harness(Script::Echo, throttled(), 4096));

    let mut tasks = Vec::new();
    for chat in 20..28 {
        let h = Arc::clone(&h);
        tasks.push(tokio::spawn(async move {
            h.handler
                .handle(&text_message(chat, &format!("weather {chat}")))
                .await
        }));
    }
    for task in tasks {
        assert!(matches!(task.await.unwrap(), TurnOutcome::Completed(_)));
    }

    for chat in 20..28 {
        let calls = h.transport.calls_for(chat);
        assert_eq!(calls.len(), 2);
        assert_eq!(last_text(&calls), format!("echo: weather {chat}"));
    }
}
