// ABOUTME: Read-only circulation reports
// ABOUTME: Dashboard counters, popularity rankings, overdue loans and reminders

use bookshare_settings::LibrarySettings;
use bookshare_storage::StorageError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::records::{fetch_record, row_to_record, BorrowRecord, BorrowStatus, RECORD_SELECT};

const RANKING_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_books: i64,
    pub available_books: i64,
    pub borrowed_books: i64,
    pub total_users: i64,
    pub pending_borrows: i64,
    pub pending_returns: i64,
    pub pending_donations: i64,
    pub pending_reviews: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PopularBook {
    pub title: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopReader {
    pub name: String,
    pub count: i64,
}

/// An approved loan kept past the borrowing period
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OverdueLoan {
    #[serde(flatten)]
    pub record: BorrowRecord,
    pub due_at: DateTime<Utc>,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub popular_books: Vec<PopularBook>,
    pub top_readers: Vec<TopReader>,
    pub overdue: Vec<OverdueLoan>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReminderSent {
    pub record_id: i64,
    pub borrower_name: String,
    pub book_title: String,
}

pub struct Reports {
    pool: SqlitePool,
}

impl Reports {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self, settings: &LibrarySettings) -> Result<Dashboard, StorageError> {
        Ok(Dashboard {
            stats: self.stats().await?,
            popular_books: self.popular_books().await?,
            top_readers: self.top_readers().await?,
            overdue: self.overdue(settings, Utc::now()).await?,
        })
    }

    pub async fn stats(&self) -> Result<DashboardStats, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS total_books,
                (SELECT COUNT(*) FROM books WHERE status = 'available') AS available_books,
                (SELECT COUNT(*) FROM books WHERE status = 'borrowed') AS borrowed_books,
                (SELECT COUNT(*) FROM users WHERE is_admin = 0) AS total_users,
                (SELECT COUNT(*) FROM borrow_records
                    WHERE status IN ('pending', 'donor_pending')) AS pending_borrows,
                (SELECT COUNT(*) FROM borrow_records
                    WHERE status = 'return_pending') AS pending_returns,
                (SELECT COUNT(*) FROM donation_requests
                    WHERE status = 'pending') AS pending_donations
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let pending_borrows: i64 = row.try_get("pending_borrows").map_err(StorageError::Sqlx)?;
        let pending_returns: i64 = row.try_get("pending_returns").map_err(StorageError::Sqlx)?;
        let pending_donations: i64 = row.try_get("pending_donations").map_err(StorageError::Sqlx)?;

        Ok(DashboardStats {
            total_books: row.try_get("total_books").map_err(StorageError::Sqlx)?,
            available_books: row.try_get("available_books").map_err(StorageError::Sqlx)?,
            borrowed_books: row.try_get("borrowed_books").map_err(StorageError::Sqlx)?,
            total_users: row.try_get("total_users").map_err(StorageError::Sqlx)?,
            pending_borrows,
            pending_returns,
            pending_donations,
            pending_reviews: pending_borrows + pending_returns + pending_donations,
        })
    }

    /// Most borrowed titles, counting every request ever made
    pub async fn popular_books(&self) -> Result<Vec<PopularBook>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT b.title, COUNT(r.id) AS count
            FROM borrow_records r
            JOIN books b ON b.id = r.book_id
            GROUP BY b.id
            ORDER BY count DESC, b.id
            LIMIT ?
            "#,
        )
        .bind(RANKING_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter()
            .map(|row| -> Result<PopularBook, StorageError> {
                Ok(PopularBook {
                    title: row.try_get("title").map_err(StorageError::Sqlx)?,
                    count: row.try_get("count").map_err(StorageError::Sqlx)?,
                })
            })
            .collect()
    }

    /// Students with the most borrow records
    pub async fn top_readers(&self) -> Result<Vec<TopReader>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT u.name, COUNT(r.id) AS count
            FROM borrow_records r
            JOIN users u ON u.id = r.borrower_id
            WHERE u.is_admin = 0
            GROUP BY u.id
            ORDER BY count DESC, u.id
            LIMIT ?
            "#,
        )
        .bind(RANKING_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter()
            .map(|row| -> Result<TopReader, StorageError> {
                Ok(TopReader {
                    name: row.try_get("name").map_err(StorageError::Sqlx)?,
                    count: row.try_get("count").map_err(StorageError::Sqlx)?,
                })
            })
            .collect()
    }

    /// Approved loans whose borrowing period ended before `now`.
    /// Reporting only: nothing is transitioned.
    pub async fn overdue(
        &self,
        settings: &LibrarySettings,
        now: DateTime<Utc>,
    ) -> Result<Vec<OverdueLoan>, StorageError> {
        let rows = sqlx::query(&format!("{} WHERE r.status = ? ORDER BY r.id", RECORD_SELECT))
            .bind(BorrowStatus::Approved.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let period = Duration::days(settings.max_borrow_days);
        let mut overdue = Vec::new();

        for row in &rows {
            let record = row_to_record(row)?;
            let Some(approve_at) = record.approve_at else {
                continue;
            };

            let due_at = approve_at + period;
            if now > due_at {
                overdue.push(OverdueLoan {
                    days_overdue: (now - due_at).num_days(),
                    due_at,
                    record,
                });
            }
        }

        Ok(overdue)
    }

    /// Remind the borrowers of the given records. Only records still on
    /// loan get a reminder; the rest are skipped.
    pub async fn send_reminders(&self, record_ids: &[i64]) -> Result<Vec<ReminderSent>, StorageError> {
        if record_ids.is_empty() {
            return Err(StorageError::Validation(
                "Select at least one record to remind".to_string(),
            ));
        }

        let mut sent = Vec::new();
        for &record_id in record_ids {
            let Some(record) = fetch_record(&self.pool, record_id).await? else {
                continue;
            };
            if record.status != BorrowStatus::Approved {
                continue;
            }

            info!(
                record_id = record.id,
                borrower = %record.borrower_student_id,
                book = %record.book_title,
                "Overdue reminder sent"
            );

            sent.push(ReminderSent {
                record_id: record.id,
                borrower_name: record.borrower_name,
                book_title: record.book_title,
            });
        }

        Ok(sent)
    }
}
