// ABOUTME: Borrow workflow
// ABOUTME: Request, admin approval gate, return and return confirmation of borrow records

use async_trait::async_trait;
use bookshare_settings::LibrarySettings;
use bookshare_storage::StorageError;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::availability;
use crate::gate::{Actor, ApprovalGate, Gated};
use crate::records::{fetch_record, row_to_record, BorrowRecord, BorrowStatus, RECORD_SELECT};

/// Admin decision on a borrow request waiting in the admin queue
pub struct AdminBorrowDecision;

#[async_trait]
impl Gated for AdminBorrowDecision {
    const NAME: &'static str = "Borrow record";
    const TABLE: &'static str = "borrow_records";

    const APPROVE_FROM: &'static [&'static str] = &["pending"];
    const REJECT_FROM: &'static [&'static str] = &["pending", "donor_pending"];
    const APPROVED: &'static str = "approved";
    const REJECTED: &'static str = "rejected";

    const APPROVE_STAMP: Option<&'static str> = Some("approve_at");
    const REJECT_STAMP: Option<&'static str> = None;

    type Output = ();

    async fn authorize(
        _conn: &mut SqliteConnection,
        _id: i64,
        actor: &Actor,
    ) -> Result<(), StorageError> {
        actor.require_admin()
    }

    async fn after_approve(conn: &mut SqliteConnection, id: i64) -> Result<(), StorageError> {
        availability::mark_borrowed(conn, id).await
    }

    async fn after_reject(conn: &mut SqliteConnection, id: i64) -> Result<(), StorageError> {
        availability::reject(conn, id).await?;

        // An admin rejection overrides a donor decision still outstanding
        sqlx::query(
            "UPDATE donor_confirms SET status = 'rejected', confirmed_at = ?
             WHERE borrow_record_id = ? AND status = 'pending'",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(())
    }
}

pub struct BorrowWorkflow {
    pool: SqlitePool,
    admin_gate: ApprovalGate<AdminBorrowDecision>,
}

impl BorrowWorkflow {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            admin_gate: ApprovalGate::new(pool.clone()),
            pool,
        }
    }

    pub async fn get_record(&self, record_id: i64) -> Result<BorrowRecord, StorageError> {
        fetch_record(&self.pool, record_id)
            .await?
            .ok_or_else(|| StorageError::not_found("Borrow record", record_id))
    }

    /// Ask to borrow a book under the given library rules
    pub async fn request_borrow(
        &self,
        book_id: i64,
        borrower_id: i64,
        settings: &LibrarySettings,
    ) -> Result<BorrowRecord, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        let record_id = availability::request_borrow(&mut tx, book_id, borrower_id, settings).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        let record = self.get_record(record_id).await?;
        info!(
            "User {} requested book {} (record {}, {})",
            borrower_id, book_id, record.id, record.status
        );
        Ok(record)
    }

    pub async fn request_return(
        &self,
        record_id: i64,
        borrower_id: i64,
    ) -> Result<BorrowRecord, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        availability::request_return(&mut tx, record_id, borrower_id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("User {} returned record {}", borrower_id, record_id);
        self.get_record(record_id).await
    }

    pub async fn approve(&self, record_id: i64, actor: &Actor) -> Result<BorrowRecord, StorageError> {
        self.admin_gate.approve(record_id, actor).await?;
        self.get_record(record_id).await
    }

    pub async fn reject(&self, record_id: i64, actor: &Actor) -> Result<BorrowRecord, StorageError> {
        self.admin_gate.reject(record_id, actor).await?;
        self.get_record(record_id).await
    }

    pub async fn confirm_return(
        &self,
        record_id: i64,
        actor: &Actor,
    ) -> Result<BorrowRecord, StorageError> {
        actor.require_admin()?;

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        availability::confirm_return(&mut tx, record_id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Return of record {} confirmed by user {}", record_id, actor.user_id);
        self.get_record(record_id).await
    }

    /// A borrower's own records, newest first
    pub async fn list_for_borrower(&self, borrower_id: i64) -> Result<Vec<BorrowRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "{} WHERE r.borrower_id = ? ORDER BY r.id DESC",
            RECORD_SELECT
        ))
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_record).collect()
    }

    /// Every record, newest first, optionally narrowed to one status
    pub async fn list_all(&self, status: Option<BorrowStatus>) -> Result<Vec<BorrowRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "{} WHERE (?1 IS NULL OR r.status = ?1) ORDER BY r.id DESC",
            RECORD_SELECT
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_record).collect()
    }
}
