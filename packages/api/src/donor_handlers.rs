// ABOUTME: HTTP request handlers for donor confirmations
// ABOUTME: Donors approve or decline requests to borrow the books they gave

use axum::extract::{Path, State};
use tracing::info;

use crate::auth::CurrentUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::DbState;

/// Requests waiting on the caller as donor
pub async fn list_confirms(State(db): State<DbState>, user: CurrentUser) -> ApiResult {
    info!("Listing donor confirmations for user {}", user.id());

    let confirms = db.donor_confirms.list_pending(user.id()).await?;
    Ok(ApiResponse::ok().with("confirms", confirms))
}

pub async fn approve_confirm(
    State(db): State<DbState>,
    user: CurrentUser,
    Path(confirm_id): Path<i64>,
) -> ApiResult {
    let confirm = db.donor_confirms.approve(confirm_id, &user.actor()).await?;
    Ok(ApiResponse::ok().with("confirm", confirm))
}

pub async fn reject_confirm(
    State(db): State<DbState>,
    user: CurrentUser,
    Path(confirm_id): Path<i64>,
) -> ApiResult {
    let confirm = db.donor_confirms.reject(confirm_id, &user.actor()).await?;
    Ok(ApiResponse::ok().with("confirm", confirm))
}
