// ABOUTME: Input validation for library settings
// ABOUTME: Key lookup plus bounded integer checks

use bookshare_storage::StorageError;
use thiserror::Error;

use crate::types::SettingKey;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid integer value: {0}. {1}")]
    InvalidInteger(String, String),

    #[error("Value cannot be empty")]
    EmptyValue,

    #[error("Unknown setting key: {0}")]
    UnknownKey(String),
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::Validation(err.to_string())
    }
}

/// Validate a setting value for its key, returning the parsed integer
pub fn validate_setting_value(key: &str, value: &str) -> Result<i64, ValidationError> {
    let key: SettingKey = key.parse()?;

    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyValue);
    }

    let (min, max) = key.bounds();
    validate_integer(value, Some(min), Some(max))
}

/// Validate integer value with optional min/max bounds
fn validate_integer(value: &str, min: Option<i64>, max: Option<i64>) -> Result<i64, ValidationError> {
    let parsed = value.parse::<i64>().map_err(|_| {
        ValidationError::InvalidInteger(value.to_string(), "Not a valid integer".to_string())
    })?;

    if let Some(min_val) = min {
        if parsed < min_val {
            return Err(ValidationError::InvalidInteger(
                value.to_string(),
                format!("Must be >= {}", min_val),
            ));
        }
    }

    if let Some(max_val) = max {
        if parsed > max_val {
            return Err(ValidationError::InvalidInteger(
                value.to_string(),
                format!("Must be <= {}", max_val),
            ));
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_integer() {
        assert_eq!(validate_integer("123", None, None).unwrap(), 123);
        assert!(validate_integer("-1", None, None).is_ok());
        assert!(validate_integer("abc", None, None).is_err());
        assert!(validate_integer("1.5", None, None).is_err());
    }

    #[test]
    fn test_validate_integer_with_bounds() {
        assert!(validate_integer("1", Some(1), Some(10)).is_ok());
        assert!(validate_integer("10", Some(1), Some(10)).is_ok());
        assert!(validate_integer("0", Some(1), Some(10)).is_err());
        assert!(validate_integer("11", Some(1), Some(10)).is_err());
    }

    #[test]
    fn test_validate_setting_value_known_keys() {
        assert_eq!(validate_setting_value("max_borrow_days", "14").unwrap(), 14);
        assert_eq!(validate_setting_value("max_books_per_user", " 3 ").unwrap(), 3);
        assert!(validate_setting_value("max_borrow_days", "0").is_err());
        assert!(validate_setting_value("max_borrow_days", "366").is_err());
        assert!(validate_setting_value("max_books_per_user", "101").is_err());
    }

    #[test]
    fn test_validate_setting_value_empty() {
        assert!(matches!(
            validate_setting_value("max_borrow_days", "  "),
            Err(ValidationError::EmptyValue)
        ));
    }

    #[test]
    fn test_validate_setting_value_unknown_key() {
        assert!(matches!(
            validate_setting_value("fine_per_day", "1"),
            Err(ValidationError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_validation_error_converts_to_storage_validation() {
        let err: StorageError = ValidationError::EmptyValue.into();
        assert!(matches!(err, StorageError::Validation(_)));
    }
}
