// ABOUTME: Type definitions for library settings
// ABOUTME: Typed record read by the borrow workflow plus raw update items

use std::collections::BTreeMap;
use std::str::FromStr;

use bookshare_core::{DEFAULT_MAX_BOOKS_PER_USER, DEFAULT_MAX_BORROW_DAYS};
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Library rules consulted by the borrow workflow.
///
/// Loaded once per request and passed explicitly into workflow calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySettings {
    pub max_borrow_days: i64,
    pub max_books_per_user: i64,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            max_borrow_days: DEFAULT_MAX_BORROW_DAYS,
            max_books_per_user: DEFAULT_MAX_BOOKS_PER_USER,
        }
    }
}

impl LibrarySettings {
    /// Build from stored key/value pairs, falling back to defaults for
    /// missing or unparseable entries
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let read = |key: SettingKey, default: i64| {
            pairs
                .get(key.as_str())
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default)
        };

        Self {
            max_borrow_days: read(SettingKey::MaxBorrowDays, defaults.max_borrow_days),
            max_books_per_user: read(SettingKey::MaxBooksPerUser, defaults.max_books_per_user),
        }
    }

    /// Key/value view returned to admins
    pub fn to_pairs(&self) -> BTreeMap<String, String> {
        let mut pairs = BTreeMap::new();
        pairs.insert(
            SettingKey::MaxBorrowDays.as_str().to_string(),
            self.max_borrow_days.to_string(),
        );
        pairs.insert(
            SettingKey::MaxBooksPerUser.as_str().to_string(),
            self.max_books_per_user.to_string(),
        );
        pairs
    }
}

/// Known setting keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    MaxBorrowDays,
    MaxBooksPerUser,
}

impl SettingKey {
    pub const ALL: [SettingKey; 2] = [SettingKey::MaxBorrowDays, SettingKey::MaxBooksPerUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::MaxBorrowDays => "max_borrow_days",
            SettingKey::MaxBooksPerUser => "max_books_per_user",
        }
    }

    /// Inclusive bounds accepted for the value
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            SettingKey::MaxBorrowDays => (1, 365),
            SettingKey::MaxBooksPerUser => (1, 100),
        }
    }
}

impl FromStr for SettingKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max_borrow_days" => Ok(SettingKey::MaxBorrowDays),
            "max_books_per_user" => Ok(SettingKey::MaxBooksPerUser),
            _ => Err(ValidationError::UnknownKey(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingUpdateItem {
    pub key: String,
    pub value: String,
}
