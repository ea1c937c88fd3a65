// ABOUTME: HTTP request handlers for login sessions
// ABOUTME: Login issues a session cookie and token; logout revokes it

use axum::{extract::State, Json};
use bookshare_core::SESSION_COOKIE;
use chrono::Utc;
use serde::Deserialize;
use tower_cookies::cookie::{time::Duration, SameSite};
use tower_cookies::{Cookie, Cookies};
use tracing::info;

use crate::auth::{CurrentUser, SessionToken};
use crate::response::{ApiResponse, ApiResult};
use crate::state::DbState;

/// Request body for logging in
#[derive(Deserialize)]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
}

/// Verify credentials and start a session
pub async fn login(
    State(db): State<DbState>,
    cookies: Cookies,
    Json(request): Json<LoginRequest>,
) -> ApiResult {
    let student_id = request.student_id.trim();
    info!("Login attempt for {}", student_id);

    let user = db.users.authenticate(student_id, &request.password).await?;
    let session = db.sessions.create_session(user.id).await?;

    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    cookies.add(
        Cookie::build((SESSION_COOKIE, session.token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(max_age))
            .build(),
    );

    Ok(ApiResponse::ok()
        .with("user", &user)
        .with("token", &session.token)
        .with("expires_at", session.expires_at))
}

/// End the current session, if any, and clear the cookie
pub async fn logout(
    State(db): State<DbState>,
    cookies: Cookies,
    SessionToken(token): SessionToken,
) -> ApiResult {
    if let Some(token) = token {
        db.sessions.delete_session(&token).await?;
    }

    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());

    Ok(ApiResponse::message("Logged out"))
}

/// The logged-in user
pub async fn me(CurrentUser(user): CurrentUser) -> ApiResult {
    Ok(ApiResponse::ok().with("user", &user))
}
