// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Eventboard API Server
//!
//! Serves the event catalog, the auth flows and the admin event manager on
//! top of Firebase Auth and Firestore.

use eventboard::{
    config::{Backend, Config},
    db::{DocumentStore, FirestoreDb, MemoryStore},
    services::{FirebaseAuthClient, IdentityProvider, MemoryIdentityProvider},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.backend, "Starting Eventboard API");

    let (store, identity) = build_backends(&config).await?;

    // Build shared state; this also attaches the session store
    let state = AppState::new(config.clone(), store, identity);

    // Build router
    let app = eventboard::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.sessions.shutdown();
    Ok(())
}

async fn build_backends(
    config: &Config,
) -> anyhow::Result<(Arc<dyn DocumentStore>, Arc<dyn IdentityProvider>)> {
    match config.backend {
        Backend::Memory => {
            tracing::warn!("Using in-memory backends; data is lost on restart");
            // No mailbox locally: sending the verification email verifies.
            Ok((
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryIdentityProvider::new().with_verify_on_send()),
            ))
        }
        Backend::Firebase => {
            let db = FirestoreDb::new(&config.firebase_project_id).await?;

            let auth = match &config.auth_emulator_host {
                Some(host) => FirebaseAuthClient::new_emulator(host, &config.firebase_api_key)?,
                None => {
                    FirebaseAuthClient::new(&config.firebase_project_id, &config.firebase_api_key)?
                }
            };
            tracing::info!(project = %config.firebase_project_id, "Firebase backends initialized");

            Ok((Arc::new(db), Arc::new(auth)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eventboard=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
