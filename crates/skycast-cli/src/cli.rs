//! CLI argument definitions for skycast.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// skycast -- a Telegram weather assistant with streamed replies.
#[derive(Parser)]
#[command(
    name = "skycast",
    version,
    about = "skycast -- Telegram weather assistant",
    long_about = "Answers weather questions on Telegram through an OpenAI-compatible model, \
                  streaming each reply into edited messages in the user's language."
)]
pub struct Cli {
    /// Path to the TOML configuration file. A missing file means defaults.
    #[arg(long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Telegram gateway (long polling).
    Bot {
        /// Long-polling timeout in seconds; overrides `[bot] poll_timeout`.
        #[arg(long)]
        poll_timeout: Option<u64>,
    },

    /// Inspect or change stored language preferences.
    Lang {
        #[command(subcommand)]
        action: LangAction,
    },
}

#[derive(Subcommand)]
pub enum LangAction {
    /// List supported languages, default first.
    List,
    /// Show the stored language of a user.
    Get { user_id: String },
    /// Store a language for a user.
    Set { user_id: String, lang: String },
    /// Remove a user's stored language.
    Clear { user_id: String },
    /// Resolve the language a turn would use, persisting a detection.
    Resolve {
        user_id: String,
        /// Sample text to run detection on.
        #[arg(long)]
        text: Option<String>,
    },
    /// Run the detector on a text without touching the store.
    Detect { text: String },
}
