// ABOUTME: HTTP request handlers for library administration
// ABOUTME: User accounts, the dashboard, library settings and overdue reminders

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use bookshare_security::UserCreateInput;
use bookshare_settings::SettingUpdateItem;
use bookshare_storage::StorageError;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::auth::AdminUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::DbState;

pub async fn list_users(State(db): State<DbState>, _admin: AdminUser) -> ApiResult {
    let users = db.users.list_users().await?;
    Ok(ApiResponse::ok().with("users", users))
}

pub async fn create_user(
    State(db): State<DbState>,
    admin: AdminUser,
    Json(input): Json<UserCreateInput>,
) -> ApiResult {
    info!("User {} creating account {}", admin.id(), input.student_id);

    let user = db.users.create_user(input).await?;
    Ok(ApiResponse::created().with("user", user))
}

pub async fn delete_user(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(user_id): Path<i64>,
) -> ApiResult {
    db.users.delete_user(admin.id(), user_id).await?;
    Ok(ApiResponse::message("User deleted"))
}

/// Counters, rankings and overdue loans in one payload
pub async fn get_dashboard(State(db): State<DbState>, _admin: AdminUser) -> ApiResult {
    let settings = db.settings.load().await?;
    let dashboard = db.reports.dashboard(&settings).await?;

    Ok(ApiResponse::ok()
        .with("stats", dashboard.stats)
        .with("popular_books", dashboard.popular_books)
        .with("top_readers", dashboard.top_readers)
        .with("overdue", dashboard.overdue))
}

pub async fn get_settings(State(db): State<DbState>, _admin: AdminUser) -> ApiResult {
    let settings = db.settings.load().await?;
    Ok(ApiResponse::ok().with("settings", settings))
}

/// Update settings from `{key: value}` where values are integers or
/// numeric strings
pub async fn update_settings(
    State(db): State<DbState>,
    admin: AdminUser,
    Json(body): Json<BTreeMap<String, Value>>,
) -> ApiResult {
    info!("User {} updating {} setting(s)", admin.id(), body.len());

    let updates = body
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s,
                other => {
                    return Err(StorageError::Validation(format!(
                        "Setting '{}' must be a number, got {}",
                        key, other
                    )))
                }
            };
            Ok(SettingUpdateItem { key, value })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;

    let settings = db.settings.update(&updates).await?;
    Ok(ApiResponse::ok().with("settings", settings))
}

#[derive(Deserialize)]
pub struct ReminderRequest {
    #[serde(default)]
    pub record_ids: Vec<i64>,
}

/// Remind borrowers of the selected loans
pub async fn send_reminders(
    State(db): State<DbState>,
    _admin: AdminUser,
    Json(request): Json<ReminderRequest>,
) -> ApiResult {
    let sent = db.reports.send_reminders(&request.record_ids).await?;

    Ok(ApiResponse::message(format!("Sent {} reminder(s)", sent.len()))
        .with("reminder_sent", sent))
}
