// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin event management routes.
//!
//! `require_auth` and `require_admin` are applied in routes/mod.rs; the
//! [`EventManager`](crate::services::EventManager) checks the role again.

use crate::error::Result;
use crate::models::{Event, EventInput};
use crate::session::Session;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/events", get(list_events).post(create_event))
        .route(
            "/api/admin/events/{id}",
            put(update_event).delete(delete_event),
        )
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Event>>> {
    Ok(Json(state.events.list(&session).await?))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(input): Json<EventInput>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = state.events.create(&session, &input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(input): Json<EventInput>,
) -> Result<Json<Event>> {
    Ok(Json(state.events.update(&session, &id, &input).await?))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.events.delete(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
