// ABOUTME: Data layer and persistence for Bookshare
// ABOUTME: Shared error taxonomy, SQLite pool setup and embedded migrations

pub mod db;

use thiserror::Error;

/// Errors raised by every storage and workflow layer.
///
/// The first group is the domain taxonomy surfaced to API callers verbatim;
/// the second group is infrastructure and is sanitized before leaving the
/// server.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    LimitExceeded(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Password hashing error: {0}")]
    Password(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        StorageError::NotFound(format!("{} {}", kind, id))
    }

    /// True for the errors a caller can act on (everything but infrastructure)
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound(_)
                | StorageError::Conflict(_)
                | StorageError::InvalidState(_)
                | StorageError::LimitExceeded(_)
                | StorageError::Forbidden(_)
                | StorageError::Unauthorized(_)
                | StorageError::Validation(_)
        )
    }
}

/// Whether a sqlx error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StorageError::not_found("Book", 42);
        assert_eq!(err.to_string(), "Book 42 not found");
        assert!(err.is_domain());
    }

    #[test]
    fn test_infrastructure_errors_are_not_domain() {
        let err = StorageError::Database("disk full".to_string());
        assert!(!err.is_domain());
    }
}
