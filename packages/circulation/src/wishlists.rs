// ABOUTME: Wishlist workflow
// ABOUTME: Users request titles for the library; admins fulfill or reject them

use async_trait::async_trait;
use bookshare_storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use crate::gate::{Actor, ApprovalGate, Gated};
use crate::status::WishlistStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistItem {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub book_title: String,
    pub author: String,
    pub publisher: String,
    pub isbn: String,
    pub reason: String,
    pub status: WishlistStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WishlistCreateInput {
    pub book_title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub reason: Option<String>,
}

const WISHLIST_SELECT: &str = r#"
    SELECT w.id, w.user_id, u.name AS user_name, w.book_title, w.author, w.publisher,
           w.isbn, w.reason, w.status, w.created_at, w.reviewed_at
    FROM wishlist_items w
    JOIN users u ON u.id = w.user_id
"#;

pub struct WishlistDecision;

#[async_trait]
impl Gated for WishlistDecision {
    const NAME: &'static str = "Wishlist item";
    const TABLE: &'static str = "wishlist_items";

    const APPROVE_FROM: &'static [&'static str] = &["pending"];
    const REJECT_FROM: &'static [&'static str] = &["pending"];
    const APPROVED: &'static str = "fulfilled";
    const REJECTED: &'static str = "rejected";

    const APPROVE_STAMP: Option<&'static str> = Some("reviewed_at");
    const REJECT_STAMP: Option<&'static str> = Some("reviewed_at");

    type Output = ();

    async fn authorize(
        _conn: &mut SqliteConnection,
        _id: i64,
        actor: &Actor,
    ) -> Result<(), StorageError> {
        actor.require_admin()
    }

    async fn after_approve(_conn: &mut SqliteConnection, _id: i64) -> Result<(), StorageError> {
        Ok(())
    }

    async fn after_reject(_conn: &mut SqliteConnection, _id: i64) -> Result<(), StorageError> {
        Ok(())
    }
}

pub struct Wishlists {
    pool: SqlitePool,
    gate: ApprovalGate<WishlistDecision>,
}

impl Wishlists {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            gate: ApprovalGate::new(pool.clone()),
            pool,
        }
    }

    pub async fn add(&self, user_id: i64, input: WishlistCreateInput) -> Result<WishlistItem, StorageError> {
        let book_title = input.book_title.trim();
        if book_title.is_empty() {
            return Err(StorageError::Validation("Book title is required".to_string()));
        }

        let trimmed = |value: Option<String>| value.unwrap_or_default().trim().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO wishlist_items
                (user_id, book_title, author, publisher, isbn, reason, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(user_id)
        .bind(book_title)
        .bind(trimmed(input.author))
        .bind(trimmed(input.publisher))
        .bind(trimmed(input.isbn))
        .bind(trimmed(input.reason))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let item_id = result.last_insert_rowid();
        info!("User {} wished for '{}' (item {})", user_id, book_title, item_id);
        self.get_item(item_id).await
    }

    pub async fn get_item(&self, item_id: i64) -> Result<WishlistItem, StorageError> {
        let row = sqlx::query(&format!("{} WHERE w.id = ?", WISHLIST_SELECT))
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("Wishlist item", item_id))?;

        row_to_item(&row)
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<WishlistItem>, StorageError> {
        let rows = sqlx::query(&format!(
            "{} WHERE w.user_id = ? ORDER BY w.id DESC",
            WISHLIST_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_item).collect()
    }

    pub async fn list_all(&self, status: Option<WishlistStatus>) -> Result<Vec<WishlistItem>, StorageError> {
        let rows = sqlx::query(&format!(
            "{} WHERE (?1 IS NULL OR w.status = ?1) ORDER BY w.id DESC",
            WISHLIST_SELECT
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_item).collect()
    }

    /// Withdraw one of the user's own items while it is still pending
    pub async fn remove(&self, item_id: i64, user_id: i64) -> Result<(), StorageError> {
        let result = sqlx::query(
            "DELETE FROM wishlist_items WHERE id = ? AND user_id = ? AND status = 'pending'",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 1 {
            info!("User {} withdrew wishlist item {}", user_id, item_id);
            return Ok(());
        }

        let item = self.get_item(item_id).await?;
        if item.user_id != user_id {
            return Err(StorageError::Forbidden(
                "You can only delete your own wishlist items".to_string(),
            ));
        }
        Err(StorageError::InvalidState(format!(
            "Wishlist item {} is already {}",
            item_id, item.status
        )))
    }

    pub async fn fulfill(&self, item_id: i64, actor: &Actor) -> Result<WishlistItem, StorageError> {
        self.gate.approve(item_id, actor).await?;
        self.get_item(item_id).await
    }

    pub async fn reject(&self, item_id: i64, actor: &Actor) -> Result<WishlistItem, StorageError> {
        self.gate.reject(item_id, actor).await?;
        self.get_item(item_id).await
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<WishlistItem, StorageError> {
    let status: String = row.try_get("status").map_err(StorageError::Sqlx)?;

    Ok(WishlistItem {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        user_id: row.try_get("user_id").map_err(StorageError::Sqlx)?,
        user_name: row.try_get("user_name").map_err(StorageError::Sqlx)?,
        book_title: row.try_get("book_title").map_err(StorageError::Sqlx)?,
        author: row.try_get("author").map_err(StorageError::Sqlx)?,
        publisher: row.try_get("publisher").map_err(StorageError::Sqlx)?,
        isbn: row.try_get("isbn").map_err(StorageError::Sqlx)?,
        reason: row.try_get("reason").map_err(StorageError::Sqlx)?,
        status: status.parse().map_err(StorageError::Database)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
        reviewed_at: row.try_get("reviewed_at").map_err(StorageError::Sqlx)?,
    })
}
