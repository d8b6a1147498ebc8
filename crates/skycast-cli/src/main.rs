//! CLI entry point for skycast.
//!
//! `skycast bot` runs the Telegram gateway; `skycast lang ...` inspects and
//! edits stored language preferences against the same configuration.

mod bot;
mod cli;
mod config;
mod helpers;
mod lang;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::helpers::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bot { poll_timeout } => {
            init_tracing("info");
            bot::cmd_bot(&cli.config, poll_timeout).await
        }
        Commands::Lang { action } => {
            init_tracing("warn");
            lang::cmd_lang(&cli.config, action).await
        }
    }
}
