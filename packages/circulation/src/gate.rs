// ABOUTME: Generic single-step approval gate
// ABOUTME: Claims a pending entity with compare-and-set, authorizes, then applies side effects atomically

use std::marker::PhantomData;

use async_trait::async_trait;
use bookshare_storage::StorageError;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

/// Who is acting on a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(user_id: i64, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }

    pub fn require_admin(&self) -> Result<(), StorageError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(StorageError::Forbidden("Admin privileges required".to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn verb(&self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        }
    }
}

/// An entity moved out of a waiting status by a single decision.
///
/// The gate owns the status column of `TABLE`; implementors describe the
/// legal source statuses, who may decide, and what else changes in the
/// same transaction.
#[async_trait]
pub trait Gated: Send + Sync + 'static {
    /// Entity name used in error messages
    const NAME: &'static str;
    const TABLE: &'static str;

    const APPROVE_FROM: &'static [&'static str];
    const REJECT_FROM: &'static [&'static str];
    const APPROVED: &'static str;
    const REJECTED: &'static str;

    /// Timestamp columns set to the decision time
    const APPROVE_STAMP: Option<&'static str>;
    const REJECT_STAMP: Option<&'static str>;

    type Output: Send;

    async fn authorize(
        conn: &mut SqliteConnection,
        id: i64,
        actor: &Actor,
    ) -> Result<(), StorageError>;

    async fn after_approve(conn: &mut SqliteConnection, id: i64) -> Result<Self::Output, StorageError>;

    async fn after_reject(conn: &mut SqliteConnection, id: i64) -> Result<Self::Output, StorageError>;
}

pub struct ApprovalGate<T: Gated> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Gated> Clone for ApprovalGate<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T: Gated> ApprovalGate<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub async fn approve(&self, id: i64, actor: &Actor) -> Result<T::Output, StorageError> {
        self.decide(Decision::Approve, id, actor).await
    }

    pub async fn reject(&self, id: i64, actor: &Actor) -> Result<T::Output, StorageError> {
        self.decide(Decision::Reject, id, actor).await
    }

    /// Apply a decision.
    ///
    /// The claim is the first statement of the transaction, so competing
    /// decisions on one entity queue on SQLite's write lock and the loser
    /// sees the winner's status. A failed authorization or side effect rolls
    /// the claim back.
    pub async fn decide(
        &self,
        decision: Decision,
        id: i64,
        actor: &Actor,
    ) -> Result<T::Output, StorageError> {
        let (from, to, stamp) = match decision {
            Decision::Approve => (T::APPROVE_FROM, T::APPROVED, T::APPROVE_STAMP),
            Decision::Reject => (T::REJECT_FROM, T::REJECTED, T::REJECT_STAMP),
        };

        debug!("{} {}: {:?} by user {}", T::NAME, id, decision, actor.user_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        if !claim(&mut tx, T::TABLE, id, from, to, stamp).await? {
            let current = current_status(&mut tx, T::TABLE, id)
                .await?
                .ok_or_else(|| StorageError::not_found(T::NAME, id))?;
            T::authorize(&mut tx, id, actor).await?;
            return Err(StorageError::InvalidState(format!(
                "{} {} cannot be {} while {}",
                T::NAME,
                id,
                decision.verb(),
                current
            )));
        }

        T::authorize(&mut tx, id, actor).await?;

        let output = match decision {
            Decision::Approve => T::after_approve(&mut tx, id).await?,
            Decision::Reject => T::after_reject(&mut tx, id).await?,
        };

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("{} {} {} by user {}", T::NAME, id, decision.verb(), actor.user_id);
        Ok(output)
    }
}

/// Compare-and-set `status` from any of `from` to `to`.
/// Returns whether a row was claimed.
pub(crate) async fn claim(
    conn: &mut SqliteConnection,
    table: &str,
    id: i64,
    from: &[&str],
    to: &str,
    stamp: Option<&str>,
) -> Result<bool, StorageError> {
    let stamp_clause = stamp
        .map(|column| format!(", {} = ?", column))
        .unwrap_or_default();
    let placeholders = vec!["?"; from.len()].join(", ");
    let sql = format!(
        "UPDATE {} SET status = ?{} WHERE id = ? AND status IN ({})",
        table, stamp_clause, placeholders
    );

    let mut query = sqlx::query(&sql).bind(to);
    if stamp.is_some() {
        query = query.bind(chrono::Utc::now());
    }
    query = query.bind(id);
    for status in from {
        query = query.bind(*status);
    }

    let result = query.execute(&mut *conn).await.map_err(StorageError::Sqlx)?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn current_status(
    conn: &mut SqliteConnection,
    table: &str,
    id: i64,
) -> Result<Option<String>, StorageError> {
    sqlx::query_scalar(&format!("SELECT status FROM {} WHERE id = ?", table))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)
}
