// ABOUTME: Library-wide borrowing rules with database persistence
// ABOUTME: Exposes the typed LibrarySettings record, validation and storage

pub mod storage;
pub mod types;
pub mod validation;

pub use storage::SettingsStorage;
pub use types::{LibrarySettings, SettingKey, SettingUpdateItem};
pub use validation::{validate_setting_value, ValidationError};
