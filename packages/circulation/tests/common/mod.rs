// ABOUTME: Shared fixtures for circulation integration tests
// ABOUTME: Seeds users and books directly through SQL

#![allow(dead_code)]

use bookshare_catalog::{Book, BookCreateInput, BookSource, BookStorage};
use bookshare_circulation::Actor;
use sqlx::SqlitePool;

pub async fn insert_user(pool: &SqlitePool, student_id: &str, name: &str, is_admin: bool) -> Actor {
    let id = sqlx::query(
        "INSERT INTO users (student_id, name, password_hash, is_admin, created_at)
         VALUES (?, ?, 'x', ?, '2024-01-01T00:00:00Z')",
    )
    .bind(student_id)
    .bind(name)
    .bind(is_admin)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();

    Actor::new(id, is_admin)
}

pub async fn class_book(pool: &SqlitePool, title: &str) -> Book {
    BookStorage::new(pool.clone())
        .create_book(BookCreateInput {
            title: title.to_string(),
            author: "Author".to_string(),
            publisher: "Publisher".to_string(),
            isbn: None,
            tags: None,
            source: None,
            donor_id: None,
        })
        .await
        .unwrap()
}

pub async fn donated_book(pool: &SqlitePool, title: &str, donor: &Actor) -> Book {
    BookStorage::new(pool.clone())
        .create_book(BookCreateInput {
            title: title.to_string(),
            author: "Author".to_string(),
            publisher: "Publisher".to_string(),
            isbn: None,
            tags: None,
            source: Some(BookSource::Donated),
            donor_id: Some(donor.user_id),
        })
        .await
        .unwrap()
}

pub async fn book_status(pool: &SqlitePool, book_id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM books WHERE id = ?")
        .bind(book_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn active_records(pool: &SqlitePool, book_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrow_records
         WHERE book_id = ? AND status IN ('pending', 'donor_pending', 'approved', 'return_pending')",
    )
    .bind(book_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
