// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Eventboard: event listings with favorites and an admin catalog
//!
//! This crate provides the backend API. Authentication is delegated to
//! Firebase Auth and persistence to Firestore; in-memory implementations of
//! both are available for local runs and tests.

pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;

use config::Config;
use db::DocumentStore;
use services::{AuthService, EventManager, FavoritesService, IdentityProvider};
use session::{AuthStateChange, SessionStore, AUTH_EVENT_CAPACITY};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: Arc<SessionStore>,
    pub auth: AuthService,
    pub events: EventManager,
    pub favorites: FavoritesService,
}

impl AppState {
    /// Wire the services together and attach the session store to the
    /// auth-state stream. Must be called inside a Tokio runtime.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Arc<Self> {
        let (changes, receiver) = broadcast::channel::<AuthStateChange>(AUTH_EVENT_CAPACITY);

        let sessions = SessionStore::new(store.clone());
        sessions.attach(receiver);

        Arc::new(Self {
            auth: AuthService::new(identity.clone(), store.clone(), changes),
            events: EventManager::new(store.clone()),
            favorites: FavoritesService::new(store),
            config,
            identity,
            sessions,
        })
    }
}
