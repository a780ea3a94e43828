// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::auth::{AuthUser, SESSION_COOKIE};
use crate::services::auth::{SignUpOutcome, SignUpRequest};
use crate::AppState;

/// Where the client navigates after a successful sign-in.
const SIGNED_IN_REDIRECT: &str = "/profile";

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/signout", post(sign_out))
}

#[derive(Deserialize)]
pub struct SignInRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignInResponse {
    pub redirect: String,
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpOutcome>)> {
    let outcome = state.auth.sign_up(&request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignInRequest>,
) -> Result<(CookieJar, Json<SignInResponse>)> {
    let credential = state.auth.sign_in(&request.email, &request.password).await?;

    let cookie = session_cookie(credential.id_token, state.config.is_local());

    Ok((
        jar.add(cookie),
        Json(SignInResponse {
            redirect: SIGNED_IN_REDIRECT.to_string(),
        }),
    ))
}

async fn sign_out(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    state.auth.sign_out(&user.identity, &user.id_token).await;

    // Removal must carry the same path the cookie was set with
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// Session cookie holding the provider ID token.
fn session_cookie(id_token: String, local: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!local)
        .build()
}
