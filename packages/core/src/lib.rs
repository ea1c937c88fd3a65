// ABOUTME: Core constants and utilities for Bookshare
// ABOUTME: Foundational package shared by every other Bookshare package

pub mod constants;
pub mod utils;

// Re-export constants
pub use constants::{
    bookshare_dir, database_file, DEFAULT_MAX_BOOKS_PER_USER, DEFAULT_MAX_BORROW_DAYS,
    DEFAULT_USER_PASSWORD, SESSION_COOKIE,
};

// Re-export utilities
pub use utils::{join_tags, split_tags, TagList};
