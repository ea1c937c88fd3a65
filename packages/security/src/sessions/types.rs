// ABOUTME: Type definitions for login sessions
// ABOUTME: Token issued at login, shown to the client once

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Issued session. `token` is the only copy of the plaintext value.
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}
