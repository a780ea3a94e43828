// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use eventboard::config::Config;
use eventboard::db::{DocumentStore, FirestoreDb, MemoryStore};
use eventboard::error::AppError;
use eventboard::models::{Event, EventInput, Role, UserProfile};
use eventboard::routes::create_router;
use eventboard::services::{IdentityProvider, MemoryIdentityProvider};
use eventboard::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// App wired to in-memory backends, with handles to both for assertions.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentityProvider>,
}

/// Create a test app with in-memory dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    create_test_app_with(config, MemoryIdentityProvider::new())
}

/// Create a test app around a specific in-memory identity provider.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, identity: MemoryIdentityProvider) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(identity);

    let state = AppState::new(config, store.clone(), identity.clone());

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        identity,
    }
}

/// A registered account with its profile, signed in at the provider.
#[allow(dead_code)]
pub struct TestUser {
    pub uid: String,
    pub email: String,
    pub id_token: String,
}

/// Register `email`, write its profile with `role`, optionally verify it,
/// and sign in directly at the provider.
#[allow(dead_code)]
pub async fn seed_user(app: &TestApp, email: &str, role: Role, verified: bool) -> TestUser {
    let password = "password123";
    let created = app.identity.create_user(email, password).await.unwrap();
    let uid = created.identity.uid.clone();

    let profile = UserProfile {
        role,
        ..UserProfile::new_signup("Test", "User", email)
    };
    app.store.create_profile(&uid, &profile).await.unwrap();

    if verified {
        assert!(app.identity.mark_verified(email));
    }

    let credential = app.identity.sign_in(email, password).await.unwrap();

    TestUser {
        uid,
        email: email.to_string(),
        id_token: credential.id_token,
    }
}

/// Event fixture with a valid date and image URL.
#[allow(dead_code)]
pub fn event(id: &str, name: &str, date: &str) -> Event {
    Event {
        id: id.to_string(),
        name: name.to_string(),
        date: date.to_string(),
        image: format!("https://images.example.com/{id}.png"),
        description: format!("{name} description"),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Store wrapper that fails selected operations on demand.
#[allow(dead_code)]
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_profile_reads: std::sync::atomic::AtomicBool,
    pub fail_verified_writes: std::sync::atomic::AtomicBool,
    pub fail_favorite_writes: std::sync::atomic::AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            ..Default::default()
        }
    }

    fn check(flag: &std::sync::atomic::AtomicBool, op: &str) -> Result<(), AppError> {
        if flag.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::Database(format!("injected {op} failure")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for FlakyStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        Self::check(&self.fail_profile_reads, "profile read")?;
        self.inner.get_profile(uid).await
    }

    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), AppError> {
        self.inner.create_profile(uid, profile).await
    }

    async fn set_profile_verified(&self, uid: &str, verified: bool) -> Result<(), AppError> {
        Self::check(&self.fail_verified_writes, "verified write")?;
        self.inner.set_profile_verified(uid, verified).await
    }

    async fn add_favorite(&self, uid: &str, event_id: &str) -> Result<(), AppError> {
        Self::check(&self.fail_favorite_writes, "favorite write")?;
        self.inner.add_favorite(uid, event_id).await
    }

    async fn remove_favorite(&self, uid: &str, event_id: &str) -> Result<(), AppError> {
        Self::check(&self.fail_favorite_writes, "favorite write")?;
        self.inner.remove_favorite(uid, event_id).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        self.inner.list_events().await
    }

    async fn events_on(&self, date: &str) -> Result<Vec<Event>, AppError> {
        self.inner.events_on(date).await
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        self.inner.get_event(id).await
    }

    async fn add_event(&self, input: &EventInput) -> Result<Event, AppError> {
        self.inner.add_event(input).await
    }

    async fn update_event(&self, id: &str, input: &EventInput) -> Result<Event, AppError> {
        self.inner.update_event(id, input).await
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete_event(id).await
    }
}
