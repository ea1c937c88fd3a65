// ABOUTME: Integration tests for the borrow workflow and donor confirmation gate
// ABOUTME: Walks books and records through every lending transition

mod common;

use bookshare_catalog::{BookStatus, BookStorage};
use bookshare_circulation::{BookAvailability, BorrowStatus, BorrowWorkflow, DonorConfirmations, RequestStatus};
use bookshare_settings::LibrarySettings;
use bookshare_storage::db::memory_pool;
use bookshare_storage::StorageError;

use common::{active_records, book_status, class_book, donated_book, insert_user};

#[tokio::test]
async fn test_class_book_full_lifecycle() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let student = insert_user(&pool, "s1", "Alice", false).await;
    let book = class_book(&pool, "B1").await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let settings = LibrarySettings::default();

    let record = borrows.request_borrow(book.id, student.user_id, &settings).await.unwrap();
    assert_eq!(record.status, BorrowStatus::Pending);
    assert_eq!(record.book_title, "B1");
    assert_eq!(record.borrower_name, "Alice");
    assert_eq!(book_status(&pool, book.id).await, "pending_borrow");

    let record = borrows.approve(record.id, &admin).await.unwrap();
    assert_eq!(record.status, BorrowStatus::Approved);
    assert!(record.approve_at.is_some());
    assert_eq!(book_status(&pool, book.id).await, "borrowed");

    let record = borrows.request_return(record.id, student.user_id).await.unwrap();
    assert_eq!(record.status, BorrowStatus::ReturnPending);
    assert_eq!(book_status(&pool, book.id).await, "pending_return");

    let record = borrows.confirm_return(record.id, &admin).await.unwrap();
    assert_eq!(record.status, BorrowStatus::Completed);
    assert!(record.return_at.is_some());
    assert_eq!(book_status(&pool, book.id).await, "available");
    assert_eq!(active_records(&pool, book.id).await, 0);
}

#[tokio::test]
async fn test_donated_book_donor_rejects_then_retry() {
    let pool = memory_pool().await.unwrap();
    let donor = insert_user(&pool, "u1", "Donor", false).await;
    let student = insert_user(&pool, "u2", "Reader", false).await;
    let book = donated_book(&pool, "B2", &donor).await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let confirms = DonorConfirmations::new(pool.clone());
    let settings = LibrarySettings::default();

    let record = borrows.request_borrow(book.id, student.user_id, &settings).await.unwrap();
    assert_eq!(record.status, BorrowStatus::DonorPending);

    let pending = confirms.list_pending(donor.user_id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].borrow_record.id, record.id);
    assert!(confirms.list_pending(student.user_id).await.unwrap().is_empty());

    let decided = confirms.reject(pending[0].id, &donor).await.unwrap();
    assert_eq!(decided.status, RequestStatus::Rejected);
    assert!(decided.confirmed_at.is_some());
    assert_eq!(decided.borrow_record.status, BorrowStatus::Rejected);
    assert_eq!(book_status(&pool, book.id).await, "available");

    let retry = borrows.request_borrow(book.id, student.user_id, &settings).await.unwrap();
    assert_eq!(retry.status, BorrowStatus::DonorPending);
    assert_eq!(active_records(&pool, book.id).await, 1);
}

#[tokio::test]
async fn test_donor_approval_enters_admin_queue() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let donor = insert_user(&pool, "u1", "Donor", false).await;
    let student = insert_user(&pool, "u2", "Reader", false).await;
    let book = donated_book(&pool, "Gift", &donor).await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let confirms = DonorConfirmations::new(pool.clone());

    let record = borrows
        .request_borrow(book.id, student.user_id, &LibrarySettings::default())
        .await
        .unwrap();

    // Admin cannot approve before the donor has
    let err = borrows.approve(record.id, &admin).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidState(_)));

    let confirm_id = confirms.list_pending(donor.user_id).await.unwrap()[0].id;
    let decided = confirms.approve(confirm_id, &donor).await.unwrap();
    assert_eq!(decided.status, RequestStatus::Approved);
    assert_eq!(decided.borrow_record.status, BorrowStatus::Pending);

    let err = confirms.approve(confirm_id, &donor).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidState(_)));

    let record = borrows.approve(record.id, &admin).await.unwrap();
    assert_eq!(record.status, BorrowStatus::Approved);
    assert_eq!(book_status(&pool, book.id).await, "borrowed");
}

#[tokio::test]
async fn test_only_donor_can_confirm() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let donor = insert_user(&pool, "u1", "Donor", false).await;
    let student = insert_user(&pool, "u2", "Reader", false).await;
    let book = donated_book(&pool, "Gift", &donor).await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let confirms = DonorConfirmations::new(pool.clone());

    borrows
        .request_borrow(book.id, student.user_id, &LibrarySettings::default())
        .await
        .unwrap();
    let confirm_id = confirms.list_pending(donor.user_id).await.unwrap()[0].id;

    for actor in [&student, &admin] {
        let err = confirms.approve(confirm_id, actor).await.unwrap_err();
        assert!(matches!(err, StorageError::Forbidden(_)));
    }

    let still = confirms.get_confirm(confirm_id).await.unwrap();
    assert_eq!(still.status, RequestStatus::Pending);
    assert_eq!(still.borrow_record.status, BorrowStatus::DonorPending);

    let err = confirms.approve(999, &donor).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_donated_book_without_donor_skips_gate() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let donor = insert_user(&pool, "u1", "Donor", false).await;
    let student = insert_user(&pool, "u2", "Reader", false).await;
    let book = donated_book(&pool, "Orphan", &donor).await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(donor.user_id)
        .execute(&pool)
        .await
        .unwrap();

    let borrows = BorrowWorkflow::new(pool.clone());
    let record = borrows
        .request_borrow(book.id, student.user_id, &LibrarySettings::default())
        .await
        .unwrap();
    assert_eq!(record.status, BorrowStatus::Pending);

    borrows.approve(record.id, &admin).await.unwrap();
}

#[tokio::test]
async fn test_second_request_conflicts() {
    let pool = memory_pool().await.unwrap();
    let alice = insert_user(&pool, "s1", "Alice", false).await;
    let bob = insert_user(&pool, "s2", "Bob", false).await;
    let book = class_book(&pool, "Dune").await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let settings = LibrarySettings::default();

    borrows.request_borrow(book.id, alice.user_id, &settings).await.unwrap();
    let err = borrows.request_borrow(book.id, bob.user_id, &settings).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
    assert_eq!(active_records(&pool, book.id).await, 1);

    let err = borrows.request_borrow(999, bob.user_id, &settings).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_borrow_limit() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let student = insert_user(&pool, "s1", "Alice", false).await;
    let first = class_book(&pool, "First").await;
    let second = class_book(&pool, "Second").await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let settings = LibrarySettings {
        max_books_per_user: 1,
        ..LibrarySettings::default()
    };

    let record = borrows.request_borrow(first.id, student.user_id, &settings).await.unwrap();
    borrows.approve(record.id, &admin).await.unwrap();

    let err = borrows.request_borrow(second.id, student.user_id, &settings).await.unwrap_err();
    assert!(matches!(err, StorageError::LimitExceeded(_)));
    // The refused request left nothing behind
    assert_eq!(book_status(&pool, second.id).await, "available");
    assert_eq!(active_records(&pool, second.id).await, 0);

    borrows.request_return(record.id, student.user_id).await.unwrap();
    borrows.confirm_return(record.id, &admin).await.unwrap();

    borrows.request_borrow(second.id, student.user_id, &settings).await.unwrap();
}

#[tokio::test]
async fn test_reject_frees_book_once() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let student = insert_user(&pool, "s1", "Alice", false).await;
    let book = class_book(&pool, "Dune").await;
    let borrows = BorrowWorkflow::new(pool.clone());

    let record = borrows
        .request_borrow(book.id, student.user_id, &LibrarySettings::default())
        .await
        .unwrap();

    let rejected = borrows.reject(record.id, &admin).await.unwrap();
    assert_eq!(rejected.status, BorrowStatus::Rejected);
    assert_eq!(book_status(&pool, book.id).await, "available");

    let err = borrows.reject(record.id, &admin).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidState(_)));
    let err = borrows.approve(record.id, &admin).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidState(_)));
    assert_eq!(book_status(&pool, book.id).await, "available");
}

#[tokio::test]
async fn test_admin_reject_closes_donor_confirmation() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let donor = insert_user(&pool, "u1", "Donor", false).await;
    let student = insert_user(&pool, "u2", "Reader", false).await;
    let book = donated_book(&pool, "Gift", &donor).await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let confirms = DonorConfirmations::new(pool.clone());

    let record = borrows
        .request_borrow(book.id, student.user_id, &LibrarySettings::default())
        .await
        .unwrap();
    let confirm_id = confirms.list_pending(donor.user_id).await.unwrap()[0].id;

    borrows.reject(record.id, &admin).await.unwrap();
    assert_eq!(book_status(&pool, book.id).await, "available");
    assert!(confirms.list_pending(donor.user_id).await.unwrap().is_empty());

    let err = confirms.approve(confirm_id, &donor).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidState(_)));
}

#[tokio::test]
async fn test_non_admin_cannot_decide() {
    let pool = memory_pool().await.unwrap();
    let student = insert_user(&pool, "s1", "Alice", false).await;
    let book = class_book(&pool, "Dune").await;
    let borrows = BorrowWorkflow::new(pool.clone());

    let record = borrows
        .request_borrow(book.id, student.user_id, &LibrarySettings::default())
        .await
        .unwrap();

    let err = borrows.approve(record.id, &student).await.unwrap_err();
    assert!(matches!(err, StorageError::Forbidden(_)));
    let err = borrows.confirm_return(record.id, &student).await.unwrap_err();
    assert!(matches!(err, StorageError::Forbidden(_)));

    assert_eq!(borrows.get_record(record.id).await.unwrap().status, BorrowStatus::Pending);
    assert_eq!(book_status(&pool, book.id).await, "pending_borrow");
}

#[tokio::test]
async fn test_return_rules() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let alice = insert_user(&pool, "s1", "Alice", false).await;
    let bob = insert_user(&pool, "s2", "Bob", false).await;
    let book = class_book(&pool, "Dune").await;
    let borrows = BorrowWorkflow::new(pool.clone());

    let record = borrows
        .request_borrow(book.id, alice.user_id, &LibrarySettings::default())
        .await
        .unwrap();

    let err = borrows.request_return(record.id, alice.user_id).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidState(_)));

    borrows.approve(record.id, &admin).await.unwrap();

    let err = borrows.request_return(record.id, bob.user_id).await.unwrap_err();
    assert!(matches!(err, StorageError::Forbidden(_)));

    let err = borrows.confirm_return(record.id, &admin).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidState(_)));

    let err = borrows.request_return(999, alice.user_id).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_listing_records() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let alice = insert_user(&pool, "s1", "Alice", false).await;
    let bob = insert_user(&pool, "s2", "Bob", false).await;
    let dune = class_book(&pool, "Dune").await;
    let emma = class_book(&pool, "Emma").await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let settings = LibrarySettings::default();

    let first = borrows.request_borrow(dune.id, alice.user_id, &settings).await.unwrap();
    borrows.request_borrow(emma.id, bob.user_id, &settings).await.unwrap();
    borrows.approve(first.id, &admin).await.unwrap();

    let mine = borrows.list_for_borrower(alice.user_id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].book_title, "Dune");

    let all = borrows.list_all(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].book_title, "Emma", "newest first");

    let pending = borrows.list_all(Some(BorrowStatus::Pending)).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].borrower_student_id, "s2");
}

#[tokio::test]
async fn test_scrap_only_available_books() {
    let pool = memory_pool().await.unwrap();
    let admin = insert_user(&pool, "admin", "Admin", true).await;
    let student = insert_user(&pool, "s1", "Alice", false).await;
    let spare = class_book(&pool, "Spare").await;
    let lent = class_book(&pool, "Lent").await;
    let borrows = BorrowWorkflow::new(pool.clone());
    let availability = BookAvailability::new(pool.clone());
    let settings = LibrarySettings::default();

    let record = borrows.request_borrow(lent.id, student.user_id, &settings).await.unwrap();
    borrows.approve(record.id, &admin).await.unwrap();

    let err = availability
        .set_status(lent.id, BookStatus::Unavailable, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
    assert_eq!(book_status(&pool, lent.id).await, "borrowed");

    let err = availability
        .set_status(spare.id, BookStatus::Borrowed, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));

    let err = availability
        .set_status(spare.id, BookStatus::Unavailable, &student)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Forbidden(_)));

    let scrapped = availability
        .set_status(spare.id, BookStatus::Unavailable, &admin)
        .await
        .unwrap();
    assert_eq!(scrapped.status, BookStatus::Unavailable);

    // Scrapping is final
    let err = availability
        .set_status(spare.id, BookStatus::Unavailable, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
    let err = borrows.request_borrow(spare.id, student.user_id, &settings).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));

    let book = BookStorage::new(pool).get_book(spare.id).await.unwrap();
    assert_eq!(book.status, BookStatus::Unavailable);
}
