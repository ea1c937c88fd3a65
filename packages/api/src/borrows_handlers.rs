// ABOUTME: HTTP request handlers for borrowing and returning books
// ABOUTME: Student requests plus the admin approval and return queues

use axum::{
    extract::{Path, Query, State},
    Json,
};
use bookshare_circulation::BorrowStatus;
use serde::Deserialize;
use tracing::info;

use crate::auth::{AdminUser, CurrentUser};
use crate::filters::{parse_filter, StatusQuery};
use crate::response::{ApiResponse, ApiResult};
use crate::state::DbState;

#[derive(Deserialize)]
pub struct CreateBorrowRequest {
    pub book_id: i64,
}

/// The caller's own borrow records
pub async fn list_my_borrows(State(db): State<DbState>, user: CurrentUser) -> ApiResult {
    info!("Listing borrows for user {}", user.id());

    let records = db.borrows.list_for_borrower(user.id()).await?;
    Ok(ApiResponse::ok().with("records", records))
}

/// Request to borrow a book under the current library rules
pub async fn create_borrow(
    State(db): State<DbState>,
    user: CurrentUser,
    Json(request): Json<CreateBorrowRequest>,
) -> ApiResult {
    info!("User {} requesting book {}", user.id(), request.book_id);

    let settings = db.settings.load().await?;
    let record = db
        .borrows
        .request_borrow(request.book_id, user.id(), &settings)
        .await?;

    Ok(ApiResponse::created().with("record", record))
}

/// Hand a borrowed book back for admin confirmation
pub async fn return_borrow(
    State(db): State<DbState>,
    user: CurrentUser,
    Path(record_id): Path<i64>,
) -> ApiResult {
    info!("User {} returning record {}", user.id(), record_id);

    let record = db.borrows.request_return(record_id, user.id()).await?;
    Ok(ApiResponse::ok().with("record", record))
}

/// Every borrow record, optionally filtered by status
pub async fn list_borrows(
    State(db): State<DbState>,
    _admin: AdminUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult {
    let status = parse_filter::<BorrowStatus>(query.status.as_deref())?;
    info!("Listing borrow records (status: {:?})", status);

    let records = db.borrows.list_all(status).await?;
    Ok(ApiResponse::ok().with("records", records))
}

pub async fn approve_borrow(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(record_id): Path<i64>,
) -> ApiResult {
    let record = db.borrows.approve(record_id, &admin.actor()).await?;
    Ok(ApiResponse::ok().with("record", record))
}

pub async fn reject_borrow(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(record_id): Path<i64>,
) -> ApiResult {
    let record = db.borrows.reject(record_id, &admin.actor()).await?;
    Ok(ApiResponse::ok().with("record", record))
}

pub async fn confirm_return(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(record_id): Path<i64>,
) -> ApiResult {
    let record = db.borrows.confirm_return(record_id, &admin.actor()).await?;
    Ok(ApiResponse::ok().with("record", record))
}
