// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the catalog and for signed-in users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Event;
use crate::services::favorites::{ProfileView, ToggleOutcome};
use crate::session::Session;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Catalog routes, readable without signing in.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/events", get(list_events))
}

/// API routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/profile", get(get_profile))
        .route(
            "/api/profile/verification-email",
            post(resend_verification_email),
        )
        .route("/api/favorites/{event_id}", post(toggle_favorite))
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct CatalogQuery {
    date: Option<String>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogQuery>,
) -> Result<Json<Vec<Event>>> {
    let events = state.events.catalog(params.date.as_deref()).await?;
    Ok(Json(events))
}

// ─── Session & Profile ───────────────────────────────────────

async fn get_session(Extension(session): Extension<Session>) -> Json<Session> {
    Json(session)
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ProfileView>> {
    let page = state.favorites.load(&session).await?;
    let view = page
        .view()
        .ok_or_else(|| AppError::NotFound("Please sign in to view your profile.".to_string()))?;
    Ok(Json(view))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerificationEmailResponse {
    pub verification_sent: bool,
}

async fn resend_verification_email(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<VerificationEmailResponse> {
    let verification_sent = state
        .auth
        .resend_verification_email(&user.identity, &user.id_token)
        .await;
    Json(VerificationEmailResponse { verification_sent })
}

// ─── Favorites ───────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ToggleFavoriteResponse {
    pub outcome: ToggleOutcome,
    pub favorite_events: Vec<String>,
}

/// Toggle membership of `event_id` in the caller's favorites.
async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(event_id): Path<String>,
) -> Result<Json<ToggleFavoriteResponse>> {
    let mut page = state.favorites.load(&session).await?;

    let event = page
        .find_event(&event_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

    let outcome = state.favorites.toggle(&mut page, event).await?;

    Ok(Json(ToggleFavoriteResponse {
        outcome,
        favorite_events: page
            .profile
            .map(|p| p.favorite_events)
            .unwrap_or_default(),
    }))
}
