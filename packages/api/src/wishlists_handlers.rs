// ABOUTME: HTTP request handlers for wishlists
// ABOUTME: Users manage their own wishes; admins fulfill or reject them

use axum::{
    extract::{Path, Query, State},
    Json,
};
use bookshare_circulation::{WishlistCreateInput, WishlistStatus};
use tracing::info;

use crate::auth::{AdminUser, CurrentUser};
use crate::filters::{parse_filter, StatusQuery};
use crate::response::{ApiResponse, ApiResult};
use crate::state::DbState;

pub async fn list_my_wishlist(State(db): State<DbState>, user: CurrentUser) -> ApiResult {
    let items = db.wishlists.list_for_user(user.id()).await?;
    Ok(ApiResponse::ok().with("wishlists", items))
}

pub async fn create_wishlist_item(
    State(db): State<DbState>,
    user: CurrentUser,
    Json(input): Json<WishlistCreateInput>,
) -> ApiResult {
    info!("User {} adding wishlist item '{}'", user.id(), input.book_title);

    let item = db.wishlists.add(user.id(), input).await?;
    Ok(ApiResponse::created().with("wishlist", item))
}

/// Withdraw a pending wish
pub async fn delete_wishlist_item(
    State(db): State<DbState>,
    user: CurrentUser,
    Path(item_id): Path<i64>,
) -> ApiResult {
    db.wishlists.remove(item_id, user.id()).await?;
    Ok(ApiResponse::message("Wishlist item deleted"))
}

pub async fn list_wishlists(
    State(db): State<DbState>,
    _admin: AdminUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult {
    let status = parse_filter::<WishlistStatus>(query.status.as_deref())?;
    info!("Listing wishlist items (status: {:?})", status);

    let items = db.wishlists.list_all(status).await?;
    Ok(ApiResponse::ok().with("wishlists", items))
}

pub async fn fulfill_wishlist_item(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(item_id): Path<i64>,
) -> ApiResult {
    let item = db.wishlists.fulfill(item_id, &admin.actor()).await?;
    Ok(ApiResponse::ok().with("wishlist", item))
}

pub async fn reject_wishlist_item(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(item_id): Path<i64>,
) -> ApiResult {
    let item = db.wishlists.reject(item_id, &admin.actor()).await?;
    Ok(ApiResponse::ok().with("wishlist", item))
}
