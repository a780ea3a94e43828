//! Database layer (Firestore, plus an in-memory store for local runs and tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Event, EventInput, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
}

/// Field names written by partial updates.
pub mod fields {
    pub const IS_VERIFIED: &str = "isVerified";
    pub const FAVORITE_EVENTS: &str = "favoriteEvents";
    pub const DATE: &str = "date";
}

/// Typed operations against the `users` and `events` collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── User Profiles ───────────────────────────────────────────

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError>;

    /// Write the full profile document, replacing any existing one.
    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), AppError>;

    /// Merge-write only the `isVerified` field.
    async fn set_profile_verified(&self, uid: &str, verified: bool) -> Result<(), AppError>;

    /// Array-union `event_id` into `favoriteEvents`.
    async fn add_favorite(&self, uid: &str, event_id: &str) -> Result<(), AppError>;

    /// Array-remove `event_id` from `favoriteEvents`.
    async fn remove_favorite(&self, uid: &str, event_id: &str) -> Result<(), AppError>;

    // ─── Events ──────────────────────────────────────────────────

    async fn list_events(&self) -> Result<Vec<Event>, AppError>;

    /// Events whose `date` equals `date`.
    async fn events_on(&self, date: &str) -> Result<Vec<Event>, AppError>;

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError>;

    /// Insert a new event under a generated id.
    async fn add_event(&self, input: &EventInput) -> Result<Event, AppError>;

    /// Overwrite the four fields of an existing event.
    async fn update_event(&self, id: &str, input: &EventInput) -> Result<Event, AppError>;

    async fn delete_event(&self, id: &str) -> Result<(), AppError>;
}

/// Generate a document id for a new event.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
