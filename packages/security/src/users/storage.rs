// ABOUTME: User storage layer using SQLite
// ABOUTME: Account CRUD, credential checks and guarded deletion

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use bookshare_core::DEFAULT_USER_PASSWORD;
use bookshare_storage::{is_unique_violation, StorageError};

use super::types::{User, UserCreateInput};
use crate::password::{hash_password, verify_password};

const USER_COLUMNS: &str = "id, student_id, name, is_admin, created_at";

pub struct UserStorage {
    pool: SqlitePool,
}

impl UserStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, StorageError> {
        debug!("Fetching user: {}", user_id);

        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("User", user_id))?;

        row_to_user(&row)
    }

    pub async fn get_by_student_id(&self, student_id: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE student_id = ?",
            USER_COLUMNS
        ))
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        match row {
            Some(r) => Ok(Some(row_to_user(&r)?)),
            None => Ok(None),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_user).collect()
    }

    /// Create an account; the password defaults to the shared initial one
    pub async fn create_user(&self, input: UserCreateInput) -> Result<User, StorageError> {
        let student_id = input.student_id.trim();
        let name = input.name.trim();

        if student_id.is_empty() {
            return Err(StorageError::Validation("Student ID is required".to_string()));
        }
        if name.is_empty() {
            return Err(StorageError::Validation("Name is required".to_string()));
        }

        let password = input
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_USER_PASSWORD);
        let password_hash = hash_password(password)?;

        debug!("Creating user: {} (admin: {})", student_id, input.is_admin);

        let result = sqlx::query(
            r#"
            INSERT INTO users (student_id, name, password_hash, is_admin, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(student_id)
        .bind(name)
        .bind(&password_hash)
        .bind(input.is_admin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => self.get_user(done.last_insert_rowid()).await,
            Err(e) if is_unique_violation(&e) => Err(StorageError::Conflict(format!(
                "Student ID '{}' already exists",
                student_id
            ))),
            Err(e) => Err(StorageError::Sqlx(e)),
        }
    }

    /// Verify credentials and return the matching account
    pub async fn authenticate(&self, student_id: &str, password: &str) -> Result<User, StorageError> {
        let row = sqlx::query("SELECT id, password_hash FROM users WHERE student_id = ?")
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let invalid = || StorageError::Unauthorized("Invalid student ID or password".to_string());

        let row = row.ok_or_else(invalid)?;
        let stored_hash: String = row.try_get("password_hash").map_err(StorageError::Sqlx)?;
        if !verify_password(password, &stored_hash) {
            return Err(invalid());
        }

        let user_id: i64 = row.try_get("id").map_err(StorageError::Sqlx)?;
        self.get_user(user_id).await
    }

    /// Delete an account.
    ///
    /// Refused for the acting admin's own account, and while the user still
    /// borrows a book or owes a donor decision. The guard and the delete are
    /// one statement, so a borrow created concurrently cannot slip between.
    pub async fn delete_user(&self, acting_user_id: i64, user_id: i64) -> Result<(), StorageError> {
        if acting_user_id == user_id {
            return Err(StorageError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }

        debug!("Deleting user: {}", user_id);

        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = ?1
              AND NOT EXISTS (
                  SELECT 1 FROM borrow_records
                  WHERE borrower_id = ?1
                    AND status IN ('pending', 'donor_pending', 'approved', 'return_pending'))
              AND NOT EXISTS (
                  SELECT 1 FROM donor_confirms
                  WHERE donor_id = ?1 AND status = 'pending')
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 1 {
            info!("Deleted user {}", user_id);
            return Ok(());
        }

        // Nothing deleted: work out which guard stopped it
        self.get_user(user_id).await?;

        let active_borrows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records
             WHERE borrower_id = ?
               AND status IN ('pending', 'donor_pending', 'approved', 'return_pending')",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if active_borrows > 0 {
            Err(StorageError::Conflict(
                "User has unreturned books and cannot be deleted".to_string(),
            ))
        } else {
            Err(StorageError::Conflict(
                "User has borrow requests awaiting their donor confirmation".to_string(),
            ))
        }
    }

    pub async fn count_admins(&self) -> Result<i64, StorageError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Create the given admin account when no admin exists yet.
    /// Returns the account if one was created.
    pub async fn ensure_admin(
        &self,
        student_id: &str,
        name: &str,
        password: &str,
    ) -> Result<Option<User>, StorageError> {
        if self.count_admins().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .create_user(UserCreateInput {
                student_id: student_id.to_string(),
                name: name.to_string(),
                password: Some(password.to_string()),
                is_admin: true,
            })
            .await?;

        info!("Seeded admin account '{}'", admin.student_id);
        Ok(Some(admin))
    }
}

pub(crate) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, StorageError> {
    Ok(User {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        student_id: row.try_get("student_id").map_err(StorageError::Sqlx)?,
        name: row.try_get("name").map_err(StorageError::Sqlx)?,
        is_admin: row.try_get("is_admin").map_err(StorageError::Sqlx)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
    })
}
