// ABOUTME: Storage operations for library settings
// ABOUTME: Reads the typed record and writes validated updates atomically

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use bookshare_storage::StorageError;

use crate::types::{LibrarySettings, SettingUpdateItem};
use crate::validation::validate_setting_value;

pub struct SettingsStorage {
    pool: SqlitePool,
}

impl SettingsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Raw stored pairs (only keys that were ever written)
    pub async fn get_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let rows = sqlx::query("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut pairs = BTreeMap::new();
        for row in rows {
            let key: String = row.try_get("key").map_err(StorageError::Sqlx)?;
            let value: String = row.try_get("value").map_err(StorageError::Sqlx)?;
            pairs.insert(key, value);
        }

        Ok(pairs)
    }

    /// Current rules with defaults filled in
    pub async fn load(&self) -> Result<LibrarySettings, StorageError> {
        let pairs = self.get_all().await?;
        Ok(LibrarySettings::from_pairs(&pairs))
    }

    /// Validate every item, then write them all in one transaction.
    /// Nothing is written if any item is invalid.
    pub async fn update(&self, updates: &[SettingUpdateItem]) -> Result<LibrarySettings, StorageError> {
        if updates.is_empty() {
            return Err(StorageError::Validation("No settings provided".to_string()));
        }

        let mut validated = Vec::with_capacity(updates.len());
        for item in updates {
            let value = validate_setting_value(&item.key, &item.value)?;
            validated.push((item.key.as_str(), value));
        }

        debug!("Updating {} setting(s)", validated.len());

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        for (key, value) in &validated {
            sqlx::query(
                "INSERT INTO settings (key, value, updated_at)
                 VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(*key)
            .bind(value.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        let settings = self.load().await?;
        info!(
            max_borrow_days = settings.max_borrow_days,
            max_books_per_user = settings.max_books_per_user,
            "Library settings updated"
        );
        Ok(settings)
    }
}
