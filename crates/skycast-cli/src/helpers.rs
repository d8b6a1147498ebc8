//! Shared helpers: tracing setup, environment access, store wiring.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use skycast_store::{
    BotStateStore, Database, InMemoryLanguageStore, LanguageStore, SqliteLanguageStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::StoreBackend;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Read an environment variable, treating empty values as unset.
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

pub struct Stores {
    pub language: Arc<dyn LanguageStore>,
    pub bot_state: BotStateStore,
}

/// Open the configured backend.
///
/// The `memory` backend keeps both preferences and the polling offset in
/// process, so neither survives a restart.
pub async fn open_stores(backend: StoreBackend, db_path: &Path) -> Result<Stores> {
    match backend {
        StoreBackend::Sqlite => {
            let db = Database::open_and_migrate(db_path.to_path_buf())
                .await
                .with_context(|| format!("failed to open database {}", db_path.display()))?;
            info!(path = %db_path.display(), "using SQLite store");
            Ok(Stores {
                language: Arc::new(SqliteLanguageStore::new(db.clone())),
                bot_state: BotStateStore::new(db),
            })
        }
        StoreBackend::Memory => {
            let db = Database::open_in_memory().context("failed to open in-memory database")?;
            db.run_migrations()
                .await
                .context("failed to migrate in-memory database")?;
            info!("using in-memory store");
            Ok(Stores {
                language: Arc::new(InMemoryLanguageStore::new()),
                bot_state: BotStateStore::new(db),
            })
        }
    }
}
