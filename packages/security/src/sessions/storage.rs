// ABOUTME: Storage operations for login sessions
// ABOUTME: Token generation, hashing, lookup with expiry, and revocation

use base64::Engine;
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use bookshare_storage::StorageError;

use super::types::SessionToken;
use crate::users::{row_to_user, User};

pub struct SessionStorage {
    pool: SqlitePool,
    ttl: Duration,
}

impl SessionStorage {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Generate a cryptographically secure random token
    /// Returns a base64-encoded 32-byte token
    pub fn generate_token() -> String {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.gen();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }

    /// Hash a token using SHA-256
    /// This is what gets stored in the database
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Start a session for a user
    pub async fn create_session(&self, user_id: i64) -> Result<SessionToken, StorageError> {
        let token = Self::generate_token();
        let token_hash = Self::hash_token(&token);
        let now = Utc::now();
        let expires_at = now + self.ttl;

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&token_hash)
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Session created for user {}", user_id);

        Ok(SessionToken {
            token,
            user_id,
            expires_at,
        })
    }

    /// Resolve a token to its user. Expired sessions are removed and
    /// resolve to `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<User>, StorageError> {
        let token_hash = Self::hash_token(token);

        let row = sqlx::query(
            "SELECT s.expires_at,
                    u.id, u.student_id, u.name, u.is_admin, u.created_at
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = ?",
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: chrono::DateTime<Utc> =
            row.try_get("expires_at").map_err(StorageError::Sqlx)?;
        if expires_at <= Utc::now() {
            debug!("Session expired, removing");
            self.delete_session(token).await?;
            return Ok(None);
        }

        Ok(Some(row_to_user(&row)?))
    }

    /// Revoke a session (logout)
    pub async fn delete_session(&self, token: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(Self::hash_token(token))
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Drop every expired session, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected())
    }
}
