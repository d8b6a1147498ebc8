//! # skycast-store
//!
//! Persistence layer for skycast.
//!
//! Holds the per-user language preference records consumed by the language
//! resolver and the small key-value table the Telegram gateway uses to keep
//! its polling offset across restarts.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  LanguageStore (trait)                       │
//! │    ├─ InMemoryLanguageStore (DashMap)        │
//! │    └─ SqliteLanguageStore   (language_prefs) │
//! │  BotStateStore              (bot_state)      │
//! ├──────────────────────────────────────────────┤
//! │  Database (rusqlite, WAL) + Migrations       │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Stores are constructed explicitly and handed to their consumers; there is
//! no process-wide instance.

pub mod bot_state;
pub mod db;
pub mod error;
pub mod language;
pub mod migration;

// ── re-exports ───────────────────────────────────────────────────────

pub use bot_state::BotStateStore;
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use language::{InMemoryLanguageStore, LanguageStore, SqliteLanguageStore};
