// ABOUTME: HTTP request handlers for the book catalog
// ABOUTME: Browsing, admin edits, scrapping and book reviews

use axum::{
    extract::{Path, Query, State},
    Json,
};
use bookshare_catalog::{BookCreateInput, BookFilter, BookStatus, BookUpdateInput, ReviewCreateInput};
use bookshare_storage::StorageError;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{AdminUser, CurrentUser};
use crate::filters::parse_filter;
use crate::response::{ApiResponse, ApiResult};
use crate::state::DbState;

#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
}

/// List books with optional keyword, status and source filters
pub async fn list_books(
    State(db): State<DbState>,
    Query(params): Query<ListBooksQuery>,
) -> ApiResult {
    info!("Listing books (keyword: {:?})", params.keyword);

    let filter = BookFilter {
        keyword: params.keyword,
        status: parse_filter(params.status.as_deref())?,
        source: parse_filter(params.source.as_deref())?,
    };

    let books = db.books.list_books(&filter).await?;
    Ok(ApiResponse::ok().with("books", books))
}

/// Get a book; the rating summary is best-effort
pub async fn get_book(State(db): State<DbState>, Path(book_id): Path<i64>) -> ApiResult {
    info!("Getting book: {}", book_id);

    let book = db.books.get_book(book_id).await?;
    let mut response = ApiResponse::ok().with("book", book);

    match db.reviews.rating_summary(book_id).await {
        Ok(summary) => response = response.with("rating_summary", summary),
        Err(e) => warn!("Rating summary for book {} unavailable: {}", book_id, e),
    }

    Ok(response)
}

/// Add a book to the catalog
pub async fn create_book(
    State(db): State<DbState>,
    admin: AdminUser,
    Json(input): Json<BookCreateInput>,
) -> ApiResult {
    info!("User {} adding book '{}'", admin.id(), input.title);

    let book = db.books.create_book(input).await?;
    Ok(ApiResponse::created().with("book", book))
}

/// Edit a book's descriptive fields
pub async fn update_book(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(book_id): Path<i64>,
    Json(input): Json<BookUpdateInput>,
) -> ApiResult {
    info!("User {} updating book {}", admin.id(), book_id);

    let book = db.books.update_book(book_id, input).await?;
    Ok(ApiResponse::ok().with("book", book))
}

/// Request body for a direct status change
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Set a book's status; only scrapping is allowed here
pub async fn update_book_status(
    State(db): State<DbState>,
    admin: AdminUser,
    Path(book_id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult {
    info!("User {} setting book {} to {}", admin.id(), book_id, request.status);

    let status: BookStatus = request
        .status
        .trim()
        .parse()
        .map_err(StorageError::Validation)?;

    let book = db.availability.set_status(book_id, status, &admin.actor()).await?;
    Ok(ApiResponse::ok().with("book", book))
}

/// Reviews of a book, newest first
pub async fn list_reviews(State(db): State<DbState>, Path(book_id): Path<i64>) -> ApiResult {
    info!("Listing reviews for book {}", book_id);

    let reviews = db.reviews.list_reviews(book_id).await?;
    Ok(ApiResponse::ok().with("reviews", reviews))
}

/// Review a book (once per user)
pub async fn create_review(
    State(db): State<DbState>,
    user: CurrentUser,
    Path(book_id): Path<i64>,
    Json(input): Json<ReviewCreateInput>,
) -> ApiResult {
    info!("User {} reviewing book {}", user.id(), book_id);

    let review = db.reviews.create_review(book_id, user.id(), input).await?;
    Ok(ApiResponse::created().with("review", review))
}
