// ABOUTME: Shared application state for HTTP handlers
// ABOUTME: Holds the pool plus one instance of every storage and workflow

use std::sync::Arc;

use bookshare_catalog::{BookStorage, ReviewStorage};
use bookshare_circulation::{
    BookAvailability, BorrowWorkflow, DonationWorkflow, DonorConfirmations, Reports, Wishlists,
};
use bookshare_security::{SessionStorage, UserStorage};
use bookshare_settings::SettingsStorage;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub users: Arc<UserStorage>,
    pub sessions: Arc<SessionStorage>,
    pub settings: Arc<SettingsStorage>,
    pub books: Arc<BookStorage>,
    pub reviews: Arc<ReviewStorage>,
    pub availability: Arc<BookAvailability>,
    pub borrows: Arc<BorrowWorkflow>,
    pub donor_confirms: Arc<DonorConfirmations>,
    pub donations: Arc<DonationWorkflow>,
    pub wishlists: Arc<Wishlists>,
    pub reports: Arc<Reports>,
}

impl DbState {
    /// Create state from a migrated pool; sessions last `session_ttl`
    pub fn new(pool: SqlitePool, session_ttl: chrono::Duration) -> Self {
        Self {
            users: Arc::new(UserStorage::new(pool.clone())),
            sessions: Arc::new(SessionStorage::new(pool.clone(), session_ttl)),
            settings: Arc::new(SettingsStorage::new(pool.clone())),
            books: Arc::new(BookStorage::new(pool.clone())),
            reviews: Arc::new(ReviewStorage::new(pool.clone())),
            availability: Arc::new(BookAvailability::new(pool.clone())),
            borrows: Arc::new(BorrowWorkflow::new(pool.clone())),
            donor_confirms: Arc::new(DonorConfirmations::new(pool.clone())),
            donations: Arc::new(DonationWorkflow::new(pool.clone())),
            wishlists: Arc::new(Wishlists::new(pool.clone())),
            reports: Arc::new(Reports::new(pool.clone())),
            pool,
        }
    }
}
