// ABOUTME: Book type definitions
// ABOUTME: Book record, status machine and catalog inputs

use std::fmt;
use std::str::FromStr;

use bookshare_core::TagList;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a book is on its lending loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Available,
    PendingBorrow,
    Borrowed,
    PendingReturn,
    Unavailable,
}

impl BookStatus {
    pub const ALL: [BookStatus; 5] = [
        BookStatus::Available,
        BookStatus::PendingBorrow,
        BookStatus::Borrowed,
        BookStatus::PendingReturn,
        BookStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::PendingBorrow => "pending_borrow",
            BookStatus::Borrowed => "borrowed",
            BookStatus::PendingReturn => "pending_return",
            BookStatus::Unavailable => "unavailable",
        }
    }

    /// Legal edges of the lending loop.
    ///
    /// available -> pending_borrow -> borrowed -> pending_return -> available,
    /// pending_borrow -> available on rejection, and available -> unavailable
    /// as a one-way scrap.
    pub fn can_transition_to(&self, next: BookStatus) -> bool {
        use BookStatus::*;
        matches!(
            (self, next),
            (Available, PendingBorrow)
                | (PendingBorrow, Borrowed)
                | (PendingBorrow, Available)
                | (Borrowed, PendingReturn)
                | (PendingReturn, Available)
                | (Available, Unavailable)
        )
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown book status '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookSource {
    #[default]
    Class,
    Donated,
}

impl BookSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSource::Class => "class",
            BookSource::Donated => "donated",
        }
    }
}

impl fmt::Display for BookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(BookSource::Class),
            "donated" => Ok(BookSource::Donated),
            other => Err(format!("Unknown book source '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub isbn: String,
    pub tags: Vec<String>,
    pub source: BookSource,
    pub donor_id: Option<i64>,
    pub donor_name: Option<String>,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreateInput {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub isbn: Option<String>,
    pub tags: Option<TagList>,
    pub source: Option<BookSource>,
    pub donor_id: Option<i64>,
}

/// Descriptive fields only; status belongs to the workflows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookUpdateInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub tags: Option<TagList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub keyword: Option<String>,
    pub status: Option<BookStatus>,
    pub source: Option<BookSource>,
}
