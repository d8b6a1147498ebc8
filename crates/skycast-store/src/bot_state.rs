//! Gateway state that must survive restarts.
//!
//! The Telegram gateway records the next `getUpdates` offset here after
//! every batch so a restarted bot neither replays nor skips messages.

use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Key under which the long-polling offset is kept.
pub const UPDATE_OFFSET_KEY: &str = "telegram.update_offset";

/// String key-value rows in the `bot_state` table.
#[derive(Clone)]
pub struct BotStateStore {
    db: Database,
}

impl BotStateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Read a raw value.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_owned();
        self.db
            .execute(move |conn| {
                match conn.query_row(
                    "SELECT value FROM bot_state WHERE key = ?1",
                    [&key],
                    |row| row.get::<_, String>(0),
                ) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    /// Insert or replace a raw value.
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidArgument("bot state key is empty".into()));
        }
        let key = key.to_owned();
        let value = value.to_owned();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO bot_state (key, value) VALUES (?1, ?2) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    [&key, &value],
                )?;
                debug!(%key, "bot state written");
                Ok(())
            })
            .await
    }

    /// Remove a key. Returns whether a row was deleted.
    #[instrument(skip(self))]
    pub async fn remove(&self, key: &str) -> StoreResult<bool> {
        let key = key.to_owned();
        self.db
            .execute(move |conn| {
                let n = conn.execute("DELETE FROM bot_state WHERE key = ?1", [&key])?;
                Ok(n > 0)
            })
            .await
    }

    /// Next update id to request from Telegram, if one was recorded.
    ///
    /// A corrupt value is treated as absent; polling then restarts from
    /// whatever Telegram still holds.
    pub async fn update_offset(&self) -> StoreResult<Option<i64>> {
        Ok(self
            .get(UPDATE_OFFSET_KEY)
            .await?
            .and_then(|raw| raw.trim().parse().ok()))
    }

    /// Record the next update id to request.
    pub async fn set_update_offset(&self, offset: i64) -> StoreResult<()> {
        self.set(UPDATE_OFFSET_KEY, &offset.to_string()).await
    }
}
