// ABOUTME: Book reviews: types and storage
// ABOUTME: One immutable review per reader per book, with rating summaries

use std::fmt;
use std::str::FromStr;

use bookshare_storage::{is_unique_violation, StorageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

const DEFAULT_RATING: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    Recommend,
    Warn,
    #[default]
    Neutral,
}

impl ReviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewType::Recommend => "recommend",
            ReviewType::Warn => "warn",
            ReviewType::Neutral => "neutral",
        }
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recommend" => Ok(ReviewType::Recommend),
            "warn" => Ok(ReviewType::Warn),
            "neutral" => Ok(ReviewType::Neutral),
            other => Err(format!("Unknown review type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub rating: i64,
    pub content: String,
    pub review_type: ReviewType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewCreateInput {
    pub rating: Option<i64>,
    pub content: Option<String>,
    pub review_type: Option<ReviewType>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingSummary {
    pub count: i64,
    pub average: Option<f64>,
}

pub struct ReviewStorage {
    pool: SqlitePool,
}

impl ReviewStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reviews for a book, newest first
    pub async fn list_reviews(&self, book_id: i64) -> Result<Vec<Review>, StorageError> {
        self.ensure_book(book_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT r.id, r.book_id, r.user_id, u.name AS user_name, r.rating,
                   r.content, r.review_type, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.book_id = ?
            ORDER BY r.id DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_review).collect()
    }

    pub async fn create_review(
        &self,
        book_id: i64,
        user_id: i64,
        input: ReviewCreateInput,
    ) -> Result<Review, StorageError> {
        let rating = input.rating.unwrap_or(DEFAULT_RATING);
        if !(1..=5).contains(&rating) {
            return Err(StorageError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        self.ensure_book(book_id).await?;

        let content = input.content.unwrap_or_default();
        debug!("Creating review for book {} by user {}", book_id, user_id);

        let result = sqlx::query(
            r#"
            INSERT INTO reviews (book_id, user_id, rating, content, review_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(rating)
        .bind(content.trim())
        .bind(input.review_type.unwrap_or_default().as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        let review_id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::Conflict(
                    "You have already reviewed this book".to_string(),
                ))
            }
            Err(e) => return Err(StorageError::Sqlx(e)),
        };

        info!("Review {} added to book {}", review_id, book_id);
        self.get_review(review_id).await
    }

    pub async fn get_review(&self, review_id: i64) -> Result<Review, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT r.id, r.book_id, r.user_id, u.name AS user_name, r.rating,
                   r.content, r.review_type, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.id = ?
            "#,
        )
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Review", review_id))?;

        row_to_review(&row)
    }

    pub async fn rating_summary(&self, book_id: i64) -> Result<RatingSummary, StorageError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count, AVG(rating) AS average FROM reviews WHERE book_id = ?",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(RatingSummary {
            count: row.try_get("count").map_err(StorageError::Sqlx)?,
            average: row.try_get("average").map_err(StorageError::Sqlx)?,
        })
    }

    async fn ensure_book(&self, book_id: i64) -> Result<(), StorageError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if exists {
            Ok(())
        } else {
            Err(StorageError::not_found("Book", book_id))
        }
    }
}

fn row_to_review(row: &sqlx::sqlite::SqliteRow) -> Result<Review, StorageError> {
    let review_type: String = row.try_get("review_type").map_err(StorageError::Sqlx)?;

    Ok(Review {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        book_id: row.try_get("book_id").map_err(StorageError::Sqlx)?,
        user_id: row.try_get("user_id").map_err(StorageError::Sqlx)?,
        user_name: row.try_get("user_name").map_err(StorageError::Sqlx)?,
        rating: row.try_get("rating").map_err(StorageError::Sqlx)?,
        content: row.try_get("content").map_err(StorageError::Sqlx)?,
        review_type: review_type.parse().map_err(StorageError::Database)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
    })
}
