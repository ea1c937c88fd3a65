// ABOUTME: Borrow record types and read queries
// ABOUTME: Record lifecycle status plus the joined view returned to callers

use std::fmt;
use std::str::FromStr;

use bookshare_storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteExecutor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowStatus {
    Pending,
    DonorPending,
    Approved,
    ReturnPending,
    Completed,
    Rejected,
}

impl BorrowStatus {
    pub const ALL: [BorrowStatus; 6] = [
        BorrowStatus::Pending,
        BorrowStatus::DonorPending,
        BorrowStatus::Approved,
        BorrowStatus::ReturnPending,
        BorrowStatus::Completed,
        BorrowStatus::Rejected,
    ];

    /// Statuses that hold the book
    pub const ACTIVE: [BorrowStatus; 4] = [
        BorrowStatus::Pending,
        BorrowStatus::DonorPending,
        BorrowStatus::Approved,
        BorrowStatus::ReturnPending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "pending",
            BorrowStatus::DonorPending => "donor_pending",
            BorrowStatus::Approved => "approved",
            BorrowStatus::ReturnPending => "return_pending",
            BorrowStatus::Completed => "completed",
            BorrowStatus::Rejected => "rejected",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

impl fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BorrowStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown borrow status '{}'", s))
    }
}

/// A borrow record joined with its book and borrower
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BorrowRecord {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub borrower_id: i64,
    pub borrower_name: String,
    pub borrower_student_id: String,
    pub status: BorrowStatus,
    pub request_at: DateTime<Utc>,
    pub approve_at: Option<DateTime<Utc>>,
    pub return_at: Option<DateTime<Utc>>,
}

pub(crate) const RECORD_SELECT: &str = r#"
    SELECT r.id, r.book_id, b.title AS book_title, r.borrower_id,
           u.name AS borrower_name, u.student_id AS borrower_student_id,
           r.status, r.request_at, r.approve_at, r.return_at
    FROM borrow_records r
    JOIN books b ON b.id = r.book_id
    JOIN users u ON u.id = r.borrower_id
"#;

/// SQL list literal of the active statuses, e.g. `'pending', 'approved'`
pub(crate) fn active_status_list() -> String {
    BorrowStatus::ACTIVE
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn fetch_record<'e>(
    executor: impl SqliteExecutor<'e>,
    record_id: i64,
) -> Result<Option<BorrowRecord>, StorageError> {
    let row = sqlx::query(&format!("{} WHERE r.id = ?", RECORD_SELECT))
        .bind(record_id)
        .fetch_optional(executor)
        .await
        .map_err(StorageError::Sqlx)?;

    row.as_ref().map(row_to_record).transpose()
}

pub(crate) fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<BorrowRecord, StorageError> {
    let status: String = row.try_get("status").map_err(StorageError::Sqlx)?;

    Ok(BorrowRecord {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        book_id: row.try_get("book_id").map_err(StorageError::Sqlx)?,
        book_title: row.try_get("book_title").map_err(StorageError::Sqlx)?,
        borrower_id: row.try_get("borrower_id").map_err(StorageError::Sqlx)?,
        borrower_name: row.try_get("borrower_name").map_err(StorageError::Sqlx)?,
        borrower_student_id: row.try_get("borrower_student_id").map_err(StorageError::Sqlx)?,
        status: status.parse().map_err(StorageError::Database)?,
        request_at: row.try_get("request_at").map_err(StorageError::Sqlx)?,
        approve_at: row.try_get("approve_at").map_err(StorageError::Sqlx)?,
        return_at: row.try_get("return_at").map_err(StorageError::Sqlx)?,
    })
}
