// ABOUTME: Integration tests for the book catalog and reviews
// ABOUTME: Covers creation, filtering, partial updates and review rules

use bookshare_catalog::{
    BookCreateInput, BookFilter, BookSource, BookStatus, BookStorage, BookUpdateInput,
    ReviewCreateInput, ReviewStorage, ReviewType,
};
use bookshare_core::TagList;
use bookshare_storage::db::memory_pool;
use bookshare_storage::StorageError;
use sqlx::SqlitePool;

fn book(title: &str, author: &str) -> BookCreateInput {
    BookCreateInput {
        title: title.to_string(),
        author: author.to_string(),
        publisher: "Ace".to_string(),
        isbn: None,
        tags: None,
        source: None,
        donor_id: None,
    }
}

async fn insert_user(pool: &SqlitePool, student_id: &str, name: &str) -> i64 {
    sqlx::query(
        "INSERT INTO users (student_id, name, password_hash, created_at)
         VALUES (?, ?, 'x', '2024-01-01T00:00:00Z')",
    )
    .bind(student_id)
    .bind(name)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

#[tokio::test]
async fn test_create_book_defaults() {
    let pool = memory_pool().await.unwrap();
    let storage = BookStorage::new(pool);

    let created = storage.create_book(book("Dune", "Herbert")).await.unwrap();
    assert_eq!(created.title, "Dune");
    assert_eq!(created.status, BookStatus::Available);
    assert_eq!(created.source, BookSource::Class);
    assert!(created.tags.is_empty());
    assert!(created.donor_id.is_none());
}

#[tokio::test]
async fn test_create_book_requires_fields() {
    let storage = BookStorage::new(memory_pool().await.unwrap());

    let err = storage.create_book(book("  ", "Herbert")).await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}

#[tokio::test]
async fn test_donated_book_carries_donor_name() {
    let pool = memory_pool().await.unwrap();
    let donor = insert_user(&pool, "s1", "Alice").await;
    let storage = BookStorage::new(pool);

    let mut input = book("Emma", "Austen");
    input.source = Some(BookSource::Donated);
    input.donor_id = Some(donor);
    input.tags = Some(TagList(vec!["classic".into(), "romance".into()]));

    let created = storage.create_book(input).await.unwrap();
    assert_eq!(created.donor_name.as_deref(), Some("Alice"));
    assert_eq!(created.tags, vec!["classic", "romance"]);
}

#[tokio::test]
async fn test_unknown_donor_rejected() {
    let storage = BookStorage::new(memory_pool().await.unwrap());

    let mut input = book("Emma", "Austen");
    input.source = Some(BookSource::Donated);
    input.donor_id = Some(77);
    let err = storage.create_book(input).await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}

#[tokio::test]
async fn test_source_and_donor_must_agree() {
    let pool = memory_pool().await.unwrap();
    let donor = insert_user(&pool, "s1", "Alice").await;
    let storage = BookStorage::new(pool);

    let mut donated_without_donor = book("Emma", "Austen");
    donated_without_donor.source = Some(BookSource::Donated);
    let err = storage.create_book(donated_without_donor).await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));

    let mut class_with_donor = book("Dune", "Herbert");
    class_with_donor.donor_id = Some(donor);
    let err = storage.create_book(class_with_donor).await.unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));

    let all = storage.list_books(&BookFilter::default()).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_keyword_wildcards_match_literally() {
    let storage = BookStorage::new(memory_pool().await.unwrap());
    storage.create_book(book("100% Rust", "Ferris")).await.unwrap();
    storage.create_book(book("snake_case", "Guido")).await.unwrap();
    storage.create_book(book("Dune", "Herbert")).await.unwrap();

    let search = |keyword: &str| BookFilter {
        keyword: Some(keyword.to_string()),
        ..Default::default()
    };

    let percent = storage.list_books(&search("%")).await.unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].title, "100% Rust");

    let underscore = storage.list_books(&search("_")).await.unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].title, "snake_case");

    assert!(storage.list_books(&search("\\")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_books_filters() {
    let pool = memory_pool().await.unwrap();
    let storage = BookStorage::new(pool.clone());

    storage.create_book(book("Dune", "Herbert")).await.unwrap();
    let mut tagged = book("Foundation", "Asimov");
    tagged.tags = Some(TagList(vec!["scifi".into()]));
    storage.create_book(tagged).await.unwrap();
    let emma = storage.create_book(book("Emma", "Austen")).await.unwrap();

    sqlx::query("UPDATE books SET status = 'unavailable' WHERE id = ?")
        .bind(emma.id)
        .execute(&pool)
        .await
        .unwrap();

    let all = storage.list_books(&BookFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].title, "Emma", "newest first");

    let by_author = storage
        .list_books(&BookFilter {
            keyword: Some("herb".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_author.len(), 1);
    assert_eq!(by_author[0].title, "Dune");

    let by_tag = storage
        .list_books(&BookFilter {
            keyword: Some("scifi".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_tag[0].title, "Foundation");

    let available = storage
        .list_books(&BookFilter {
            status: Some(BookStatus::Available),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(available.len(), 2);

    let donated = storage
        .list_books(&BookFilter {
            source: Some(BookSource::Donated),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(donated.is_empty());
}

#[tokio::test]
async fn test_update_book_is_partial() {
    let storage = BookStorage::new(memory_pool().await.unwrap());
    let created = storage.create_book(book("Dune", "Herbert")).await.unwrap();

    let updated = storage
        .update_book(
            created.id,
            BookUpdateInput {
                isbn: Some("978-0441013593".into()),
                tags: Some(TagList(vec!["scifi".into()])),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Dune");
    assert_eq!(updated.isbn, "978-0441013593");
    assert_eq!(updated.tags, vec!["scifi"]);
    assert_eq!(updated.status, BookStatus::Available);

    let err = storage
        .update_book(999, BookUpdateInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_reviews_one_per_user_and_summary() {
    let pool = memory_pool().await.unwrap();
    let alice = insert_user(&pool, "s1", "Alice").await;
    let bob = insert_user(&pool, "s2", "Bob").await;
    let dune = BookStorage::new(pool.clone())
        .create_book(book("Dune", "Herbert"))
        .await
        .unwrap();
    let reviews = ReviewStorage::new(pool);

    let empty = reviews.rating_summary(dune.id).await.unwrap();
    assert_eq!(empty.count, 0);
    assert!(empty.average.is_none());

    let first = reviews
        .create_review(dune.id, alice, ReviewCreateInput::default())
        .await
        .unwrap();
    assert_eq!(first.rating, 5);
    assert_eq!(first.review_type, ReviewType::Neutral);
    assert_eq!(first.user_name, "Alice");

    reviews
        .create_review(
            dune.id,
            bob,
            ReviewCreateInput {
                rating: Some(2),
                content: Some("Too long".into()),
                review_type: Some(ReviewType::Warn),
            },
        )
        .await
        .unwrap();

    let err = reviews
        .create_review(dune.id, alice, ReviewCreateInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));

    let listed = reviews.list_reviews(dune.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].user_name, "Bob");

    let summary = reviews.rating_summary(dune.id).await.unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.average, Some(3.5));
}

#[tokio::test]
async fn test_review_validation() {
    let pool = memory_pool().await.unwrap();
    let alice = insert_user(&pool, "s1", "Alice").await;
    let reviews = ReviewStorage::new(pool);

    let err = reviews
        .create_review(42, alice, ReviewCreateInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));

    let err = reviews
        .create_review(
            42,
            alice,
            ReviewCreateInput {
                rating: Some(6),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}
