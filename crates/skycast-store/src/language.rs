//! Per-user preferred reply language.
//!
//! A [`LanguageStore`] maps a user id to one language code. Values are
//! stored as given; validation against the supported set happens in the
//! language service. An empty code is never stored: writing one clears the
//! record, and reading one back yields `None`.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::StoreResult;

/// Storage seam for language preferences.
#[async_trait]
pub trait LanguageStore: Send + Sync {
    /// The stored code for `user_id`, if any.
    async fn get(&self, user_id: &str) -> StoreResult<Option<String>>;

    /// Set or replace the code for `user_id`. An empty `lang` clears it.
    async fn set(&self, user_id: &str, lang: &str) -> StoreResult<()>;

    /// Remove any record for `user_id`.
    async fn clear(&self, user_id: &str) -> StoreResult<()>;

    /// The stored code, or `fallback` when none is stored.
    async fn get_or_default(&self, user_id: &str, fallback: &str) -> StoreResult<String> {
        Ok(self
            .get(user_id)
            .await?
            .unwrap_or_else(|| fallback.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryLanguageStore {
    entries: DashMap<String, String>,
}

impl InMemoryLanguageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LanguageStore for InMemoryLanguageStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<String>> {
        Ok(self
            .entries
            .get(user_id)
            .map(|entry| entry.value().clone())
            .filter(|lang| !lang.is_empty()))
    }

    async fn set(&self, user_id: &str, lang: &str) -> StoreResult<()> {
        if lang.is_empty() {
            self.entries.remove(user_id);
        } else {
            self.entries.insert(user_id.to_owned(), lang.to_owned());
        }
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> StoreResult<()> {
        self.entries.remove(user_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Preferences persisted in the `language_preferences` table.
#[derive(Clone)]
pub struct SqliteLanguageStore {
    db: Database,
}

impl SqliteLanguageStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LanguageStore for SqliteLanguageStore {
    #[instrument(skip(self))]
    async fn get(&self, user_id: &str) -> StoreResult<Option<String>> {
        let user_id = user_id.to_owned();
        self.db
            .execute(move |conn| {
                match conn.query_row(
                    "SELECT lang FROM language_preferences WHERE user_id = ?1",
                    [&user_id],
                    |row| row.get::<_, String>(0),
                ) {
                    Ok(lang) if lang.is_empty() => Ok(None),
                    Ok(lang) => Ok(Some(lang)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    #[instrument(skip(self))]
    async fn set(&self, user_id: &str, lang: &str) -> StoreResult<()> {
        if lang.is_empty() {
            return self.clear(user_id).await;
        }
        let user_id = user_id.to_owned();
        let lang = lang.to_owned();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO language_preferences (user_id, lang, updated_at) \
                     VALUES (?1, ?2, ?3) \
                     ON CONFLICT(user_id) DO UPDATE SET \
                        lang = excluded.lang, updated_at = excluded.updated_at",
                    rusqlite::params![user_id, lang, chrono::Utc::now().timestamp()],
                )?;
                debug!(%user_id, %lang, "language preference stored");
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn clear(&self, user_id: &str) -> StoreResult<()> {
        let user_id = user_id.to_owned();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "DELETE FROM language_preferences WHERE user_id = ?1",
                    [&user_id],
                )?;
                Ok(())
            })
            .await
    }
}
