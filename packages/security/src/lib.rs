// ABOUTME: Accounts, password hashing and login sessions for Bookshare
// ABOUTME: Provides user storage and session token management

pub mod password;
pub mod sessions;
pub mod users;

// Re-export main types for convenience
pub use sessions::{SessionStorage, SessionToken};
pub use users::{User, UserCreateInput, UserStorage};
