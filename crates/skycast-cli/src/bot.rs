//! Subcommand: `skycast bot` -- Telegram gateway.
//!
//! Long-polls Telegram for updates and hands each message to a
//! [`TurnHandler`] on its own task, so slow turns never hold up the poll
//! loop. The polling offset is persisted after every update.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use skycast_adapters::{LanguageAdapter, WeatherAdapter};
use skycast_agent::{
    LlmClient, LlmClientConfig, StreamingAgent, ToolAdapter, ToolRegistry, load_instructions,
};
use skycast_bot::{IncomingMessage, TelegramClient, TurnHandler};
use skycast_lang::{LanguageConfig, LanguageService};
use skycast_store::BotStateStore;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, BotEnv, db_path_from_lookup};
use crate::helpers::{env_non_empty, open_stores};

const INSTRUCTIONS_PATH: &str = "config/INSTRUCTIONS.md";

/// Run the Telegram gateway until Ctrl+C.
pub async fn cmd_bot(config_path: &Path, poll_timeout: Option<u64>) -> Result<()> {
    info!("starting Telegram gateway");

    let config = AppConfig::load(config_path);
    let env = BotEnv::from_lookup(env_non_empty).context("configuration error")?;
    let poll_timeout = poll_timeout.unwrap_or(config.bot.poll_timeout);

    // Verify the token before anything else.
    let telegram = TelegramClient::new(&env.telegram_bot_token);
    let me = telegram
        .get_me()
        .await
        .context("Telegram getMe failed; check TELEGRAM_BOT_TOKEN")?;
    let bot_name = me.username.clone().unwrap_or_else(|| me.first_name.clone());

    let db_path = db_path_from_lookup(env_non_empty);
    let stores = open_stores(config.store.backend, &db_path).await?;

    // One language service shared by the tool and the turn handler.
    let language = LanguageService::new(stores.language, LanguageConfig::from_env());

    let mut llm_config = LlmClientConfig::openai_compatible(
        env.vllm_api_key.clone(),
        env.vllm_model.clone(),
        env.vllm_base_url.clone(),
    );
    llm_config.max_tokens = config.agent.max_tokens;
    let llm = LlmClient::new(llm_config).context("failed to create LLM client")?;

    let weather: Arc<dyn ToolAdapter> = Arc::new(WeatherAdapter::new());
    let language_tool: Arc<dyn ToolAdapter> = Arc::new(LanguageAdapter::new(language.clone()));
    let tools = ToolRegistry::new(vec![weather, language_tool]);

    let agent = StreamingAgent::new(
        Arc::new(llm),
        tools,
        load_instructions(Path::new(INSTRUCTIONS_PATH)),
        config.agent.agent_config(&env.vllm_model),
    );

    let handler = Arc::new(
        TurnHandler::new(
            Arc::new(telegram.clone()),
            Arc::new(agent),
            language.clone(),
            config.bot.reconciler_config(),
        )
        .with_always_reply_ok(env.always_reply_ok),
    );

    println!();
    println!("  skycast Telegram gateway");
    println!("  Bot: @{bot_name}");
    println!("  Model: {} at {}", env.vllm_model, env.vllm_base_url);
    println!(
        "  Languages: {} (default {})",
        language.list_supported().join(", "),
        language.config().default_lang()
    );
    if env.always_reply_ok {
        println!("  ALWAYS_REPLY_OK is set: every text message gets \"ok\"");
    }
    println!("  Long-poll timeout: {poll_timeout}s");
    println!();
    println!("  Press Ctrl+C to stop.");
    println!();

    poll_loop(&telegram, &stores.bot_state, handler, poll_timeout).await;
    info!("Telegram gateway stopped");
    Ok(())
}

async fn poll_loop(
    telegram: &TelegramClient,
    bot_state: &BotStateStore,
    handler: Arc<TurnHandler>,
    poll_timeout: u64,
) {
    let mut offset = match bot_state.update_offset().await {
        Ok(Some(offset)) => {
            info!(offset, "restored Telegram polling offset");
            offset
        }
        Ok(None) => 0,
        Err(e) => {
            warn!(error = %e, "failed to read polling offset, starting from 0");
            0
        }
    };
    let mut backoff = PollBackoff::default();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let result = tokio::select! {
            _ = &mut shutdown => break,
            result = telegram.get_updates(offset, poll_timeout) => result,
        };

        let updates = match result {
            Ok(updates) => {
                backoff.reset();
                updates
            }
            Err(e) => {
                let delay = backoff.next_delay();
                warn!(
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Telegram poll failed, retrying"
                );
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(delay) => continue,
                }
            }
        };

        for update in updates {
            offset = update.update_id + 1;
            if let Err(e) = bot_state.set_update_offset(offset).await {
                warn!(offset, error = %e, "failed to persist polling offset");
            }

            let Some(message) = update.message else {
                debug!(update_id = update.update_id, "ignoring non-message update");
                continue;
            };
            let handler = Arc::clone(&handler);
            let incoming = IncomingMessage::from(message);
            tokio::spawn(async move {
                handler.handle(&incoming).await;
            });
        }
    }

    info!(offset, "shutdown requested");
}

/// Exponential delay between failed polls: 1s, 2s, 4s ... capped at 30s.
#[derive(Debug, Default)]
struct PollBackoff {
    failures: u32,
}

impl PollBackoff {
    const BASE: Duration = Duration::from_secs(1);
    const MAX: Duration = Duration::from_secs(30);

    fn next_delay(&mut self) -> Duration {
        let factor = 1u32.checked_shl(self.failures).unwrap_or(u32::MAX);
        self.failures = self.failures.saturating_add(1);
        Self::BASE.saturating_mul(factor).min(Self::MAX)
    }

    fn reset(&mut self) {
        self.failures = 0;
    }
}
