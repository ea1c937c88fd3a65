// ABOUTME: Status enums for single-gate requests
// ABOUTME: Donor confirmations, donation requests and wishlist items

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of a donor confirmation or a donation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("Unknown request status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishlistStatus {
    Pending,
    Fulfilled,
    Rejected,
}

impl WishlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WishlistStatus::Pending => "pending",
            WishlistStatus::Fulfilled => "fulfilled",
            WishlistStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for WishlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WishlistStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WishlistStatus::Pending),
            "fulfilled" => Ok(WishlistStatus::Fulfilled),
            "rejected" => Ok(WishlistStatus::Rejected),
            other => Err(format!("Unknown wishlist status '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_parse() {
        assert_eq!("approved".parse::<RequestStatus>().unwrap(), RequestStatus::Approved);
        assert!("fulfilled".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_wishlist_status_parse() {
        assert_eq!("fulfilled".parse::<WishlistStatus>().unwrap(), WishlistStatus::Fulfilled);
        assert!("approved".parse::<WishlistStatus>().is_err());
    }
}
