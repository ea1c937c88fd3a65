// ABOUTME: Authentication extractors for API requests
// ABOUTME: Resolves the session token from the cookie or a bearer header

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use bookshare_circulation::Actor;
use bookshare_core::SESSION_COOKIE;
use bookshare_security::User;
use bookshare_storage::StorageError;
use std::convert::Infallible;
use tower_cookies::Cookies;

use crate::error::ApiError;
use crate::state::DbState;

/// Raw session token presented by the client, if any.
/// `Authorization: Bearer` wins over the cookie.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(token_from_parts(parts)))
    }
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        parts
            .extensions
            .get::<Cookies>()
            .and_then(|cookies| cookies.get(SESSION_COOKIE))
            .map(|cookie| cookie.value().to_string())
    })
}

/// Logged-in user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.0.id, self.0.is_admin)
    }
}

impl FromRequestParts<DbState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &DbState) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(ApiError::Unauthenticated)?;

        match state.sessions.resolve(&token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(ApiError::Unauthenticated),
        }
    }
}

/// Logged-in admin; anyone else gets 403
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl AdminUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.0.id, true)
    }
}

impl FromRequestParts<DbState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &DbState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin {
            Ok(AdminUser(user))
        } else {
            Err(StorageError::Forbidden("Admin privileges required".to_string()).into())
        }
    }
}
