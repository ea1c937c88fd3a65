// ABOUTME: HTTP request handlers for book donations
// ABOUTME: Donors offer books; admins accept them into the catalog or decline

use axum::{
    extract::{Path, Query, State},
    Json,
};
use bookshare_circulation::{DonationCreateInput, RequestStatus};
use tracing::info;

use crate::auth::{AdminUser, CurrentUser};
use crate::filters::{parse_filter, StatusQuery};
use crate::response::{ApiResponse, ApiResult};
use crate::state::DbState;

/// The caller's donation requests and the books already accepted from them
pub async fn list_my_donations(State(db): State<DbState>, user: CurrentUser) -> ApiResult {
    info!("Listing donations for user {}", user.id());

    let donations = db.donations.list_for_user(user.id()).await?;
    let donated_books = db.donations.donated_books(user.id()).await?;

    Ok(ApiResponse::ok()
        .with("donations", donations)
        .with("donated_books", donated_books))
}

pub async fn create_donation(
    State(db): State<DbState>,
    user: CurrentUser,
    Json(input): Json<DonationCreateInput>,
) -> ApiResult {
    let donation = db.donations.submit(user.id(), input).await?;
    Ok(ApiResponse::created().with("donation", donation))
}

pub async fn list_donations(
    State(db): State<DbState>,
    _admin: AdminUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult {
    let status = parse_filter::<RequestStatus>(query.status.as_deref())?;
    info!("Listing donation requests (status: {:?})", status);

    let donations = db.donations.list_all(status).await?;
    Ok(ApiResponse::ok().with("donations", donations))
}

/// Accept a donation; the new book joins the catalog
pub async fn approve_donation(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(request_id): Path<i64>,
) -> ApiResult {
    let book = db.donations.approve(request_id, &admin.actor()).await?;
    Ok(ApiResponse::ok().with("book", book))
}

pub async fn reject_donation(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(request_id): Path<i64>,
) -> ApiResult {
    let donation = db.donations.reject(request_id, &admin.actor()).await?;
    Ok(ApiResponse::ok().with("donation", donation))
}
