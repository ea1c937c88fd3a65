// ABOUTME: Login session module
// ABOUTME: Opaque bearer tokens mapped to users with expiry

pub mod storage;
pub mod types;

pub use storage::*;
pub use types::*;
