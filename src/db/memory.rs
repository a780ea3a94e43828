// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with the same semantics as the Firestore
//! collections. Used by `EVENTBOARD_BACKEND=memory` and by the test suite.

use crate::db::{new_document_id, DocumentStore};
use crate::error::AppError;
use crate::models::{Event, EventInput, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

/// In-memory `users` and `events` collections.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, UserProfile>,
    /// Insertion order is the store-default order.
    events: RwLock<Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event under a caller-chosen id (fixtures).
    pub async fn insert_event(&self, event: Event) {
        let mut events = self.events.write().await;
        events.retain(|e| e.id != event.id);
        events.push(event);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.get(uid).map(|p| p.clone()))
    }

    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), AppError> {
        self.users.insert(uid.to_string(), profile.clone());
        Ok(())
    }

    async fn set_profile_verified(&self, uid: &str, verified: bool) -> Result<(), AppError> {
        self.users.entry(uid.to_string()).or_default().is_verified = verified;
        Ok(())
    }

    async fn add_favorite(&self, uid: &str, event_id: &str) -> Result<(), AppError> {
        let mut profile = self.users.entry(uid.to_string()).or_default();
        if !profile.favorite_events.iter().any(|id| id == event_id) {
            profile.favorite_events.push(event_id.to_string());
        }
        Ok(())
    }

    async fn remove_favorite(&self, uid: &str, event_id: &str) -> Result<(), AppError> {
        let mut profile = self.users.entry(uid.to_string()).or_default();
        profile.favorite_events.retain(|id| id != event_id);
        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.events.read().await.clone())
    }

    async fn events_on(&self, date: &str) -> Result<Vec<Event>, AppError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect())
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        Ok(self.events.read().await.iter().find(|e| e.id == id).cloned())
    }

    async fn add_event(&self, input: &EventInput) -> Result<Event, AppError> {
        let event = Event::from_input(new_document_id(), input);
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: &str, input: &EventInput) -> Result<Event, AppError> {
        let mut events = self.events.write().await;
        let slot = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
        *slot = Event::from_input(id, input);
        Ok(slot.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        self.events.write().await.retain(|e| e.id != id);
        Ok(())
    }
}
