use std::env;
use std::path::PathBuf;

/// Loan period used when the `max_borrow_days` setting has never been written
pub const DEFAULT_MAX_BORROW_DAYS: i64 = 30;

/// Concurrent borrow cap used when `max_books_per_user` has never been written
pub const DEFAULT_MAX_BOOKS_PER_USER: i64 = 5;

/// Password given to accounts created by an admin without an explicit one
pub const DEFAULT_USER_PASSWORD: &str = "123456";

/// Name of the cookie carrying the login session token
pub const SESSION_COOKIE: &str = "bookshare_session";

/// Get the path to the Bookshare directory (~/.bookshare)
pub fn bookshare_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".bookshare")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bookshare")
    }
}

/// Get the path to the default database file (~/.bookshare/bookshare.db)
pub fn database_file() -> PathBuf {
    bookshare_dir().join("bookshare.db")
}
