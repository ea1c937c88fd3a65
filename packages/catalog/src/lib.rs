// ABOUTME: Book catalog for Bookshare
// ABOUTME: Provides book and review types plus their storage layer

pub mod reviews;
pub mod storage;
pub mod types;

// Re-export main types
pub use reviews::{RatingSummary, Review, ReviewCreateInput, ReviewStorage, ReviewType};
pub use storage::{fetch_book, insert_book, BookStorage, NewBook};
pub use types::{Book, BookCreateInput, BookFilter, BookSource, BookStatus, BookUpdateInput};
