// ABOUTME: User management module
// ABOUTME: Provides types and storage for student and admin accounts

pub mod storage;
pub mod types;

pub use storage::*;
pub use types::*;
