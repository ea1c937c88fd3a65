// ABOUTME: Book availability controller
// ABOUTME: Moves a book and its active borrow record together inside the caller's transaction

use bookshare_catalog::{fetch_book, Book, BookSource, BookStatus};
use bookshare_settings::LibrarySettings;
use bookshare_storage::{is_unique_violation, StorageError};
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::gate::{claim, current_status, Actor};
use crate::records::{active_status_list, BorrowStatus};

/// Compare-and-set a book's status. Returns whether the book moved.
async fn move_book(
    conn: &mut SqliteConnection,
    book_id: i64,
    from: BookStatus,
    to: BookStatus,
) -> Result<bool, StorageError> {
    debug_assert!(from.can_transition_to(to));

    let result = sqlx::query("UPDATE books SET status = ? WHERE id = ? AND status = ?")
        .bind(to.as_str())
        .bind(book_id)
        .bind(from.as_str())
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    Ok(result.rows_affected() == 1)
}

/// Move the book held by `record_id`; a mismatch means book and record
/// disagree, which is reported rather than papered over.
async fn move_book_of_record(
    conn: &mut SqliteConnection,
    record_id: i64,
    from: BookStatus,
    to: BookStatus,
) -> Result<(), StorageError> {
    let book_id: i64 = sqlx::query_scalar("SELECT book_id FROM borrow_records WHERE id = ?")
        .bind(record_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Borrow record", record_id))?;

    if move_book(conn, book_id, from, to).await? {
        Ok(())
    } else {
        Err(StorageError::InvalidState(format!(
            "Book {} is not {} as borrow record {} expects",
            book_id, from, record_id
        )))
    }
}

/// Reserve an available book for `borrower_id` and open its borrow record.
///
/// Donated books with a living donor start at `donor_pending` and get a
/// pending donor confirmation; everything else starts at `pending`.
/// Returns the new record id.
pub async fn request_borrow(
    conn: &mut SqliteConnection,
    book_id: i64,
    borrower_id: i64,
    settings: &LibrarySettings,
) -> Result<i64, StorageError> {
    if !move_book(conn, book_id, BookStatus::Available, BookStatus::PendingBorrow).await? {
        let status = current_status(conn, "books", book_id)
            .await?
            .ok_or_else(|| StorageError::not_found("Book", book_id))?;
        return Err(StorageError::Conflict(format!(
            "Book {} is not available (currently {})",
            book_id, status
        )));
    }

    let active: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM borrow_records WHERE borrower_id = ? AND status IN ({})",
        active_status_list()
    ))
    .bind(borrower_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    if active >= settings.max_books_per_user {
        return Err(StorageError::LimitExceeded(format!(
            "Borrow limit reached: at most {} books at a time",
            settings.max_books_per_user
        )));
    }

    let row = sqlx::query("SELECT source, donor_id FROM books WHERE id = ?")
        .bind(book_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;
    let source: String = row.try_get("source").map_err(StorageError::Sqlx)?;
    let donor_id: Option<i64> = row.try_get("donor_id").map_err(StorageError::Sqlx)?;

    let donor = match (source.parse::<BookSource>(), donor_id) {
        (Ok(BookSource::Donated), Some(donor_id)) => Some(donor_id),
        _ => None,
    };
    let status = if donor.is_some() {
        BorrowStatus::DonorPending
    } else {
        BorrowStatus::Pending
    };

    let now = Utc::now();
    let inserted = sqlx::query(
        "INSERT INTO borrow_records (book_id, borrower_id, status, request_at) VALUES (?, ?, ?, ?)",
    )
    .bind(book_id)
    .bind(borrower_id)
    .bind(status.as_str())
    .bind(now)
    .execute(&mut *conn)
    .await;

    let record_id = match inserted {
        Ok(done) => done.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            return Err(StorageError::Conflict(format!(
                "Book {} already has an active borrow request",
                book_id
            )))
        }
        Err(e) => return Err(StorageError::Sqlx(e)),
    };

    if let Some(donor_id) = donor {
        sqlx::query(
            "INSERT INTO donor_confirms (borrow_record_id, donor_id, status, created_at)
             VALUES (?, ?, 'pending', ?)",
        )
        .bind(record_id)
        .bind(donor_id)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;
        debug!("Borrow record {} awaits donor {}", record_id, donor_id);
    }

    Ok(record_id)
}

/// Book side of an approved borrow: pending_borrow -> borrowed
pub async fn mark_borrowed(conn: &mut SqliteConnection, record_id: i64) -> Result<(), StorageError> {
    move_book_of_record(conn, record_id, BookStatus::PendingBorrow, BookStatus::Borrowed).await
}

/// Book side of a rejected borrow: pending_borrow -> available
pub async fn reject(conn: &mut SqliteConnection, record_id: i64) -> Result<(), StorageError> {
    move_book_of_record(conn, record_id, BookStatus::PendingBorrow, BookStatus::Available).await
}

/// Borrower hands a book back: approved -> return_pending, borrowed -> pending_return
pub async fn request_return(
    conn: &mut SqliteConnection,
    record_id: i64,
    borrower_id: i64,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        "UPDATE borrow_records SET status = ? WHERE id = ? AND borrower_id = ? AND status = ?",
    )
    .bind(BorrowStatus::ReturnPending.as_str())
    .bind(record_id)
    .bind(borrower_id)
    .bind(BorrowStatus::Approved.as_str())
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    if result.rows_affected() == 0 {
        let row = sqlx::query("SELECT borrower_id, status FROM borrow_records WHERE id = ?")
            .bind(record_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("Borrow record", record_id))?;

        let owner: i64 = row.try_get("borrower_id").map_err(StorageError::Sqlx)?;
        let status: String = row.try_get("status").map_err(StorageError::Sqlx)?;
        if owner != borrower_id {
            return Err(StorageError::Forbidden(
                "You can only return books you borrowed".to_string(),
            ));
        }
        return Err(StorageError::InvalidState(format!(
            "Borrow record {} cannot be returned while {}",
            record_id, status
        )));
    }

    move_book_of_record(conn, record_id, BookStatus::Borrowed, BookStatus::PendingReturn).await
}

/// Admin receives the book: return_pending -> completed, pending_return -> available
pub async fn confirm_return(conn: &mut SqliteConnection, record_id: i64) -> Result<(), StorageError> {
    let claimed = claim(
        conn,
        "borrow_records",
        record_id,
        &[BorrowStatus::ReturnPending.as_str()],
        BorrowStatus::Completed.as_str(),
        Some("return_at"),
    )
    .await?;

    if !claimed {
        let status = current_status(conn, "borrow_records", record_id)
            .await?
            .ok_or_else(|| StorageError::not_found("Borrow record", record_id))?;
        return Err(StorageError::InvalidState(format!(
            "Borrow record {} has no pending return (currently {})",
            record_id, status
        )));
    }

    move_book_of_record(conn, record_id, BookStatus::PendingReturn, BookStatus::Available).await
}

/// Retire a book for good. Only an available book can be scrapped.
pub async fn scrap(conn: &mut SqliteConnection, book_id: i64) -> Result<(), StorageError> {
    if move_book(conn, book_id, BookStatus::Available, BookStatus::Unavailable).await? {
        return Ok(());
    }

    let status = current_status(conn, "books", book_id)
        .await?
        .ok_or_else(|| StorageError::not_found("Book", book_id))?;
    Err(StorageError::Conflict(format!(
        "Only available books can be scrapped (book {} is {})",
        book_id, status
    )))
}

/// Pool-level entry point for status changes an admin makes directly
pub struct BookAvailability {
    pool: SqlitePool,
}

impl BookAvailability {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply an admin-requested status. Only `unavailable` (scrap) is
    /// accepted; every other status is owned by the workflows.
    pub async fn set_status(
        &self,
        book_id: i64,
        status: BookStatus,
        actor: &Actor,
    ) -> Result<Book, StorageError> {
        actor.require_admin()?;

        if status != BookStatus::Unavailable {
            return Err(StorageError::Validation(format!(
                "Status '{}' cannot be set directly; only 'unavailable' is allowed",
                status
            )));
        }

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        scrap(&mut tx, book_id).await?;
        let book = fetch_book(&mut *tx, book_id)
            .await?
            .ok_or_else(|| StorageError::not_found("Book", book_id))?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Book {} scrapped by user {}", book_id, actor.user_id);
        Ok(book)
    }
}
