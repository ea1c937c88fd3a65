// ABOUTME: Donor confirmation gate
// ABOUTME: The donor of a book decides whether a borrow request may reach the admin queue

use async_trait::async_trait;
use bookshare_storage::StorageError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::availability;
use crate::gate::{claim, Actor, ApprovalGate, Gated};
use crate::records::{fetch_record, BorrowRecord, BorrowStatus};
use crate::status::RequestStatus;

/// A donor confirmation together with the borrow request it gates
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PendingConfirm {
    pub id: i64,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub borrow_record: BorrowRecord,
}

pub struct DonorConfirmDecision;

async fn record_of_confirm(conn: &mut SqliteConnection, confirm_id: i64) -> Result<i64, StorageError> {
    sqlx::query_scalar("SELECT borrow_record_id FROM donor_confirms WHERE id = ?")
        .bind(confirm_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Donor confirmation", confirm_id))
}

/// Move the gated record out of donor_pending
async fn release_record(
    conn: &mut SqliteConnection,
    record_id: i64,
    to: BorrowStatus,
) -> Result<(), StorageError> {
    let moved = claim(
        conn,
        "borrow_records",
        record_id,
        &[BorrowStatus::DonorPending.as_str()],
        to.as_str(),
        None,
    )
    .await?;

    if moved {
        Ok(())
    } else {
        Err(StorageError::InvalidState(format!(
            "Borrow record {} is no longer awaiting donor confirmation",
            record_id
        )))
    }
}

#[async_trait]
impl Gated for DonorConfirmDecision {
    const NAME: &'static str = "Donor confirmation";
    const TABLE: &'static str = "donor_confirms";

    const APPROVE_FROM: &'static [&'static str] = &["pending"];
    const REJECT_FROM: &'static [&'static str] = &["pending"];
    const APPROVED: &'static str = "approved";
    const REJECTED: &'static str = "rejected";

    const APPROVE_STAMP: Option<&'static str> = Some("confirmed_at");
    const REJECT_STAMP: Option<&'static str> = Some("confirmed_at");

    type Output = ();

    async fn authorize(
        conn: &mut SqliteConnection,
        id: i64,
        actor: &Actor,
    ) -> Result<(), StorageError> {
        let donor_id: i64 = sqlx::query_scalar("SELECT donor_id FROM donor_confirms WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found(Self::NAME, id))?;

        if donor_id == actor.user_id {
            Ok(())
        } else {
            Err(StorageError::Forbidden(
                "Only the donor of this book can decide this request".to_string(),
            ))
        }
    }

    async fn after_approve(conn: &mut SqliteConnection, id: i64) -> Result<(), StorageError> {
        let record_id = record_of_confirm(conn, id).await?;
        release_record(conn, record_id, BorrowStatus::Pending).await
    }

    async fn after_reject(conn: &mut SqliteConnection, id: i64) -> Result<(), StorageError> {
        let record_id = record_of_confirm(conn, id).await?;
        release_record(conn, record_id, BorrowStatus::Rejected).await?;
        availability::reject(conn, record_id).await
    }
}

pub struct DonorConfirmations {
    pool: SqlitePool,
    gate: ApprovalGate<DonorConfirmDecision>,
}

impl DonorConfirmations {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            gate: ApprovalGate::new(pool.clone()),
            pool,
        }
    }

    pub async fn get_confirm(&self, confirm_id: i64) -> Result<PendingConfirm, StorageError> {
        let row = sqlx::query(
            "SELECT id, status, created_at, confirmed_at, borrow_record_id
             FROM donor_confirms WHERE id = ?",
        )
        .bind(confirm_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Donor confirmation", confirm_id))?;

        self.row_to_confirm(&row).await
    }

    /// Confirmations waiting on this donor, newest first
    pub async fn list_pending(&self, donor_id: i64) -> Result<Vec<PendingConfirm>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, status, created_at, confirmed_at, borrow_record_id
             FROM donor_confirms
             WHERE donor_id = ? AND status = 'pending'
             ORDER BY id DESC",
        )
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let mut confirms = Vec::with_capacity(rows.len());
        for row in &rows {
            confirms.push(self.row_to_confirm(row).await?);
        }
        Ok(confirms)
    }

    /// The pending confirmation gating a borrow of `book_id`, if any
    pub async fn pending_for_book(&self, book_id: i64) -> Result<Option<PendingConfirm>, StorageError> {
        let row = sqlx::query(
            "SELECT c.id, c.status, c.created_at, c.confirmed_at, c.borrow_record_id
             FROM donor_confirms c
             JOIN borrow_records r ON r.id = c.borrow_record_id
             WHERE r.book_id = ? AND c.status = 'pending'
             ORDER BY c.id DESC
             LIMIT 1",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(self.row_to_confirm(&row).await?)),
            None => Ok(None),
        }
    }

    pub async fn approve(&self, confirm_id: i64, actor: &Actor) -> Result<PendingConfirm, StorageError> {
        self.gate.approve(confirm_id, actor).await?;
        self.get_confirm(confirm_id).await
    }

    pub async fn reject(&self, confirm_id: i64, actor: &Actor) -> Result<PendingConfirm, StorageError> {
        self.gate.reject(confirm_id, actor).await?;
        self.get_confirm(confirm_id).await
    }

    async fn row_to_confirm(&self, row: &sqlx::sqlite::SqliteRow) -> Result<PendingConfirm, StorageError> {
        let status: String = row.try_get("status").map_err(StorageError::Sqlx)?;
        let record_id: i64 = row.try_get("borrow_record_id").map_err(StorageError::Sqlx)?;

        let borrow_record = fetch_record(&self.pool, record_id)
            .await?
            .ok_or_else(|| StorageError::not_found("Borrow record", record_id))?;

        Ok(PendingConfirm {
            id: row.try_get("id").map_err(StorageError::Sqlx)?,
            status: status.parse().map_err(StorageError::Database)?,
            created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
            confirmed_at: row.try_get("confirmed_at").map_err(StorageError::Sqlx)?,
            borrow_record,
        })
    }
}
