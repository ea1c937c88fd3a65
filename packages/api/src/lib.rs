// ABOUTME: HTTP API layer for Bookshare providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

pub mod admin_handlers;
pub mod auth;
pub mod auth_handlers;
pub mod books_handlers;
pub mod borrows_handlers;
pub mod donations_handlers;
pub mod donor_handlers;
pub mod error;
pub mod filters;
pub mod health;
pub mod response;
pub mod state;
pub mod wishlists_handlers;

pub use error::ApiError;
pub use response::{ApiResponse, ApiResult};
pub use state::DbState;

/// Login, logout and the current user
pub fn create_auth_router() -> Router<DbState> {
    Router::new()
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/auth/me", get(auth_handlers::me))
}

/// Catalog browsing, admin edits and reviews
pub fn create_books_router() -> Router<DbState> {
    Router::new()
        .route(
            "/books",
            get(books_handlers::list_books).post(books_handlers::create_book),
        )
        .route(
            "/books/{id}",
            get(books_handlers::get_book).put(books_handlers::update_book),
        )
        .route("/books/{id}/status", put(books_handlers::update_book_status))
        .route(
            "/books/{id}/reviews",
            get(books_handlers::list_reviews).post(books_handlers::create_review),
        )
}

/// Borrowing for students plus the admin approval queues
pub fn create_borrows_router() -> Router<DbState> {
    Router::new()
        .route(
            "/borrows",
            get(borrows_handlers::list_my_borrows).post(borrows_handlers::create_borrow),
        )
        .route("/borrows/{id}/return", put(borrows_handlers::return_borrow))
        .route("/admin/borrows", get(borrows_handlers::list_borrows))
        .route(
            "/admin/borrows/{id}/approve",
            put(borrows_handlers::approve_borrow),
        )
        .route(
            "/admin/borrows/{id}/reject",
            put(borrows_handlers::reject_borrow),
        )
        .route(
            "/admin/borrows/{id}/confirm-return",
            put(borrows_handlers::confirm_return),
        )
}

/// Donor decisions on requests for their books
pub fn create_donor_router() -> Router<DbState> {
    Router::new()
        .route("/donor/confirms", get(donor_handlers::list_confirms))
        .route(
            "/donor/confirms/{id}/approve",
            put(donor_handlers::approve_confirm),
        )
        .route(
            "/donor/confirms/{id}/reject",
            put(donor_handlers::reject_confirm),
        )
}

pub fn create_wishlists_router() -> Router<DbState> {
    Router::new()
        .route(
            "/wishlists",
            get(wishlists_handlers::list_my_wishlist).post(wishlists_handlers::create_wishlist_item),
        )
        .route(
            "/wishlists/{id}",
            delete(wishlists_handlers::delete_wishlist_item),
        )
        .route("/admin/wishlists", get(wishlists_handlers::list_wishlists))
        .route(
            "/admin/wishlists/{id}/fulfill",
            put(wishlists_handlers::fulfill_wishlist_item),
        )
        .route(
            "/admin/wishlists/{id}/reject",
            put(wishlists_handlers::reject_wishlist_item),
        )
}

pub fn create_donations_router() -> Router<DbState> {
    Router::new()
        .route(
            "/donations",
            get(donations_handlers::list_my_donations).post(donations_handlers::create_donation),
        )
        .route("/admin/donations", get(donations_handlers::list_donations))
        .route(
            "/admin/donations/{id}/approve",
            put(donations_handlers::approve_donation),
        )
        .route(
            "/admin/donations/{id}/reject",
            put(donations_handlers::reject_donation),
        )
}

/// Users, dashboard, settings and reminders
pub fn create_admin_router() -> Router<DbState> {
    Router::new()
        .route(
            "/admin/users",
            get(admin_handlers::list_users).post(admin_handlers::create_user),
        )
        .route(
            "/admin/users/{id}",
            delete(admin_handlers::delete_user),
        )
        .route("/admin/dashboard", get(admin_handlers::get_dashboard))
        .route(
            "/admin/settings",
            get(admin_handlers::get_settings).put(admin_handlers::update_settings),
        )
        .route(
            "/admin/overdue/send-reminder",
            post(admin_handlers::send_reminders),
        )
}

/// The complete application: every area under `/api`, with session
/// cookies and request tracing
pub fn create_router(state: DbState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .merge(create_auth_router())
        .merge(create_books_router())
        .merge(create_borrows_router())
        .merge(create_donor_router())
        .merge(create_wishlists_router())
        .merge(create_donations_router())
        .merge(create_admin_router());

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
}
