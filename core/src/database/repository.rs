//! Repository layer for the key-value store
//!
//! Every value is one JSON blob replaced as a whole on write, so a reader
//! never observes a half-applied collection.

use super::models::*;
use crate::config::{ACTIVE_SESSION_KEY, USERS_DB_KEY};
use crate::error::Result;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

/// Repository for key-value operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read the raw value stored under a key
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Insert or replace the value stored under a key
    pub async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    /// Remove a key. Missing keys are not an error.
    pub async fn delete_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted {}", key);
        Ok(())
    }

    /// Wipe every stored value (factory reset)
    pub async fn clear_all(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM kv_store")
            .execute(&self.pool)
            .await?;

        tracing::warn!("Cleared local store ({} keys)", result.rows_affected());
        Ok(())
    }

    /// Total size of all stored values in bytes
    pub async fn storage_bytes(&self) -> Result<u64> {
        let bytes: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(LENGTH(value)), 0) FROM kv_store")
            .fetch_one(&self.pool)
            .await?;

        Ok(bytes.max(0) as u64)
    }

    // ===== Per-user collections =====

    /// Load a user's collection. A missing key is an empty collection.
    pub async fn load_collection<T: DeserializeOwned>(
        &self,
        kind: CollectionKind,
        user_id: &str,
    ) -> Result<Vec<T>> {
        match self.get_value(&kind.key_for(user_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Load a user's collection, treating any storage failure as empty.
    pub async fn load_collection_or_default<T: DeserializeOwned>(
        &self,
        kind: CollectionKind,
        user_id: &str,
    ) -> Vec<T> {
        match self.load_collection(kind, user_id).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Failed to load {} for user {}: {}", kind, user_id, e);
                Vec::new()
            }
        }
    }

    /// Replace a user's collection
    pub async fn save_collection<T: Serialize>(
        &self,
        kind: CollectionKind,
        user_id: &str,
        items: &[T],
    ) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.put_value(&kind.key_for(user_id), &raw).await
    }

    // ===== Users =====

    pub async fn load_users(&self) -> Result<Vec<StoredUser>> {
        match self.get_value(USERS_DB_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_users(&self, users: &[StoredUser]) -> Result<()> {
        let raw = serde_json::to_string(users)?;
        self.put_value(USERS_DB_KEY, &raw).await
    }

    // ===== Active session =====

    pub async fn load_session(&self) -> Result<Option<User>> {
        match self.get_value(ACTIVE_SESSION_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn save_session(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        self.put_value(ACTIVE_SESSION_KEY, &raw).await
    }

    pub async fn clear_session(&self) -> Result<()> {
        self.delete_value(ACTIVE_SESSION_KEY).await
    }
}
