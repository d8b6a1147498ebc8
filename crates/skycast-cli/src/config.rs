//! Configuration: `config/default.toml` plus environment variables.
//!
//! The TOML file tunes behaviour (`[bot]`, `[agent]`, `[store]`); every key
//! has a default and a missing file means all defaults. Secrets and
//! endpoints come from the environment only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use skycast_agent::AgentConfig;
use skycast_bot::ReconcilerConfig;
use tracing::{info, warn};

pub const DEFAULT_MODEL: &str = "gpt-oss-20b";
pub const DEFAULT_API_KEY: &str = "dummy";
pub const DEFAULT_DB_PATH: &str = "data/skycast.db";

// ---------------------------------------------------------------------------
// File configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bot: BotSection,
    pub agent: AgentSection,
    pub store: StoreSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotSection {
    pub max_message_length: usize,
    pub max_result_length: usize,
    pub flush_interval_ms: u64,
    pub truncation_margin: usize,
    /// Long-poll timeout in seconds.
    pub poll_timeout: u64,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            max_message_length: 4096,
            max_result_length: 500,
            flush_interval_ms: 500,
            truncation_margin: 100,
            poll_timeout: 30,
        }
    }
}

impl BotSection {
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            max_message_length: self.max_message_length,
            max_result_length: self.max_result_length,
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            truncation_margin: self.truncation_margin,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub max_turns: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub history_window: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_turns: 8,
            temperature: 0.3,
            max_tokens: 2048,
            history_window: 20,
        }
    }
}

impl AgentSection {
    pub fn agent_config(&self, model: &str) -> AgentConfig {
        AgentConfig {
            model: model.to_owned(),
            max_turns: self.max_turns.max(1),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            history_window: self.history_window,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
}

impl AppConfig {
    /// Load from `path`. A missing or unparseable file yields defaults.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match Self::parse(&content) {
            Ok(config) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "invalid configuration file, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse configuration")
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Settings the Telegram gateway reads from the environment.
#[derive(Debug, Clone)]
pub struct BotEnv {
    pub telegram_bot_token: String,
    pub vllm_base_url: String,
    pub vllm_model: String,
    pub vllm_api_key: String,
    pub always_reply_ok: bool,
}

impl BotEnv {
    /// Read settings through `lookup`, which returns `None` for unset or
    /// empty variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let Some(telegram_bot_token) = get("TELEGRAM_BOT_TOKEN") else {
            bail!("TELEGRAM_BOT_TOKEN is required. Create a bot at https://t.me/BotFather");
        };
        let Some(vllm_base_url) = get("VLLM_BASE_URL") else {
            bail!(
                "VLLM_BASE_URL is required. Point it at an OpenAI-compatible endpoint, e.g. http://localhost:8000/v1"
            );
        };

        Ok(Self {
            telegram_bot_token,
            vllm_base_url,
            vllm_model: get("VLLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            vllm_api_key: get("VLLM_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_owned()),
            always_reply_ok: get("ALWAYS_REPLY_OK").as_deref() == Some("1"),
        })
    }
}

/// SQLite path from `SKYCAST_DB_PATH`, or the default.
pub fn db_path_from_lookup<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("SKYCAST_DB_PATH")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}
