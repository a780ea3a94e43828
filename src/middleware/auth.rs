// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ID token authentication middleware.

use crate::error::AppError;
use crate::services::identity::Identity;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie carrying the provider ID token.
pub const SESSION_COOKIE: &str = "eventboard_token";

/// Authenticated principal for the current request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
    /// Raw provider ID token, needed for provider calls made on the user's behalf
    pub id_token: String,
}

/// Middleware that requires a valid provider ID token.
///
/// On success both [`AuthUser`] and the resolved
/// [`Session`](crate::session::Session) are inserted as request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => return Err(AppError::Unauthorized),
        }
    };

    let identity = state.identity.verify_id_token(&token).await.map_err(|e| {
        tracing::debug!(error = %e, "Rejected ID token");
        AppError::InvalidToken
    })?;

    let session = state.sessions.resolve(&identity).await;

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(AuthUser {
        identity,
        id_token: token,
    });

    Ok(next.run(request).await)
}
