// ABOUTME: Donation workflow
// ABOUTME: Users offer books; an admin approval turns the offer into a catalog book

use async_trait::async_trait;
use bookshare_catalog::{fetch_book, insert_book, Book, BookSource, NewBook};
use bookshare_core::{join_tags, split_tags, TagList};
use bookshare_storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::donor::{DonorConfirmations, PendingConfirm};
use crate::gate::{Actor, ApprovalGate, Gated};
use crate::status::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DonationRequest {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub isbn: String,
    pub tags: Vec<String>,
    pub reason: String,
    pub status: RequestStatus,
    pub book_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationCreateInput {
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub tags: Option<TagList>,
    pub reason: Option<String>,
}

/// A book the user donated, with any borrow request waiting on them
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DonatedBook {
    #[serde(flatten)]
    pub book: Book,
    pub has_pending_confirm: bool,
    pub pending_confirm: Option<PendingConfirm>,
}

const DONATION_SELECT: &str = r#"
    SELECT d.id, d.user_id, u.name AS user_name, d.title, d.author, d.publisher,
           d.isbn, d.tags, d.reason, d.status, d.book_id, d.created_at, d.reviewed_at
    FROM donation_requests d
    JOIN users u ON u.id = d.user_id
"#;

/// Admin decision on a donation request. Approval yields the new book id.
pub struct DonationDecision;

#[async_trait]
impl Gated for DonationDecision {
    const NAME: &'static str = "Donation request";
    const TABLE: &'static str = "donation_requests";

    const APPROVE_FROM: &'static [&'static str] = &["pending"];
    const REJECT_FROM: &'static [&'static str] = &["pending"];
    const APPROVED: &'static str = "approved";
    const REJECTED: &'static str = "rejected";

    const APPROVE_STAMP: Option<&'static str> = Some("reviewed_at");
    const REJECT_STAMP: Option<&'static str> = Some("reviewed_at");

    type Output = Option<i64>;

    async fn authorize(
        _conn: &mut SqliteConnection,
        _id: i64,
        actor: &Actor,
    ) -> Result<(), StorageError> {
        actor.require_admin()
    }

    async fn after_approve(conn: &mut SqliteConnection, id: i64) -> Result<Option<i64>, StorageError> {
        let row = sqlx::query(
            "SELECT user_id, title, author, publisher, isbn, tags FROM donation_requests WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        let tags: String = row.try_get("tags").map_err(StorageError::Sqlx)?;
        let book = NewBook {
            title: row.try_get("title").map_err(StorageError::Sqlx)?,
            author: row.try_get("author").map_err(StorageError::Sqlx)?,
            publisher: row.try_get("publisher").map_err(StorageError::Sqlx)?,
            isbn: row.try_get("isbn").map_err(StorageError::Sqlx)?,
            tags: split_tags(&tags),
            source: BookSource::Donated,
            donor_id: Some(row.try_get("user_id").map_err(StorageError::Sqlx)?),
        };

        let book_id = insert_book(&mut *conn, &book).await?;

        sqlx::query("UPDATE donation_requests SET book_id = ? WHERE id = ?")
            .bind(book_id)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        debug!("Donation {} became book {}", id, book_id);
        Ok(Some(book_id))
    }

    async fn after_reject(_conn: &mut SqliteConnection, _id: i64) -> Result<Option<i64>, StorageError> {
        Ok(None)
    }
}

pub struct DonationWorkflow {
    pool: SqlitePool,
    gate: ApprovalGate<DonationDecision>,
    confirms: DonorConfirmations,
}

impl DonationWorkflow {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            gate: ApprovalGate::new(pool.clone()),
            confirms: DonorConfirmations::new(pool.clone()),
            pool,
        }
    }

    pub async fn submit(
        &self,
        user_id: i64,
        input: DonationCreateInput,
    ) -> Result<DonationRequest, StorageError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(StorageError::Validation("Title is required".to_string()));
        }

        let trimmed = |value: Option<String>| value.unwrap_or_default().trim().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO donation_requests
                (user_id, title, author, publisher, isbn, tags, reason, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(trimmed(input.author))
        .bind(trimmed(input.publisher))
        .bind(trimmed(input.isbn))
        .bind(input.tags.map(|t| join_tags(&t.into_inner())).unwrap_or_default())
        .bind(trimmed(input.reason))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let request_id = result.last_insert_rowid();
        info!("User {} offered '{}' (donation {})", user_id, title, request_id);
        self.get_request(request_id).await
    }

    pub async fn get_request(&self, request_id: i64) -> Result<DonationRequest, StorageError> {
        let row = sqlx::query(&format!("{} WHERE d.id = ?", DONATION_SELECT))
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("Donation request", request_id))?;

        row_to_donation(&row)
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<DonationRequest>, StorageError> {
        let rows = sqlx::query(&format!(
            "{} WHERE d.user_id = ? ORDER BY d.id DESC",
            DONATION_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_donation).collect()
    }

    pub async fn list_all(&self, status: Option<RequestStatus>) -> Result<Vec<DonationRequest>, StorageError> {
        let rows = sqlx::query(&format!(
            "{} WHERE (?1 IS NULL OR d.status = ?1) ORDER BY d.id DESC",
            DONATION_SELECT
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_donation).collect()
    }

    /// Books in the catalog donated by this user, newest first
    pub async fn donated_books(&self, user_id: i64) -> Result<Vec<DonatedBook>, StorageError> {
        let book_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM books WHERE donor_id = ? ORDER BY id DESC")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        let mut books = Vec::with_capacity(book_ids.len());
        for book_id in book_ids {
            let Some(book) = fetch_book(&self.pool, book_id).await? else {
                continue;
            };
            let pending_confirm = self.confirms.pending_for_book(book_id).await?;
            books.push(DonatedBook {
                book,
                has_pending_confirm: pending_confirm.is_some(),
                pending_confirm,
            });
        }
        Ok(books)
    }

    /// Approve a donation, returning the book it created
    pub async fn approve(&self, request_id: i64, actor: &Actor) -> Result<Book, StorageError> {
        let book_id = self
            .gate
            .approve(request_id, actor)
            .await?
            .ok_or_else(|| StorageError::Database("Approved donation created no book".to_string()))?;

        fetch_book(&self.pool, book_id)
            .await?
            .ok_or_else(|| StorageError::not_found("Book", book_id))
    }

    pub async fn reject(&self, request_id: i64, actor: &Actor) -> Result<DonationRequest, StorageError> {
        self.gate.reject(request_id, actor).await?;
        self.get_request(request_id).await
    }
}

fn row_to_donation(row: &sqlx::sqlite::SqliteRow) -> Result<DonationRequest, StorageError> {
    let tags: String = row.try_get("tags").map_err(StorageError::Sqlx)?;
    let status: String = row.try_get("status").map_err(StorageError::Sqlx)?;

    Ok(DonationRequest {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        user_id: row.try_get("user_id").map_err(StorageError::Sqlx)?,
        user_name: row.try_get("user_name").map_err(StorageError::Sqlx)?,
        title: row.try_get("title").map_err(StorageError::Sqlx)?,
        author: row.try_get("author").map_err(StorageError::Sqlx)?,
        publisher: row.try_get("publisher").map_err(StorageError::Sqlx)?,
        isbn: row.try_get("isbn").map_err(StorageError::Sqlx)?,
        tags: split_tags(&tags),
        reason: row.try_get("reason").map_err(StorageError::Sqlx)?,
        status: status.parse().map_err(StorageError::Database)?,
        book_id: row.try_get("book_id").map_err(StorageError::Sqlx)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
        reviewed_at: row.try_get("reviewed_at").map_err(StorageError::Sqlx)?,
    })
}
