// ABOUTME: Query-string helpers shared by list endpoints
// ABOUTME: Parses optional status filters, treating blank values as absent

use std::str::FromStr;

use bookshare_storage::StorageError;
use serde::Deserialize;

/// `?status=` filter accepted by admin list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// Parse an optional filter value. Blank means "no filter"; anything else
/// must name a known variant.
pub fn parse_filter<T>(value: Option<&str>) -> Result<Option<T>, StorageError>
where
    T: FromStr<Err = String>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map(Some).map_err(StorageError::Validation),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshare_circulation::BorrowStatus;

    #[test]
    fn test_blank_filter_is_none() {
        assert_eq!(parse_filter::<BorrowStatus>(None).unwrap(), None);
        assert_eq!(parse_filter::<BorrowStatus>(Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_known_filter_parses() {
        assert_eq!(
            parse_filter::<BorrowStatus>(Some("approved")).unwrap(),
            Some(BorrowStatus::Approved)
        );
    }

    #[test]
    fn test_unknown_filter_is_validation_error() {
        let err = parse_filter::<BorrowStatus>(Some("lost")).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }
}
