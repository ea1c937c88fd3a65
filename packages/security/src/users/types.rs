// ABOUTME: User type definitions
// ABOUTME: Account record and creation input

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account as exposed to callers. The password hash never leaves storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub student_id: String,
    pub name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreateInput {
    pub student_id: String,
    pub name: String,
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}
