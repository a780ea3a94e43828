// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event catalog management.
//!
//! Every mutating operation, and the admin listing, goes through
//! [`require_role`] with [`Role::Admin`]. The public catalog read does not.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::guard::require_role;
use crate::models::{Event, EventInput, Role};
use crate::session::Session;
use std::sync::Arc;
use validator::Validate;

/// Admin operations on the `events` collection.
#[derive(Clone)]
pub struct EventManager {
    store: Arc<dyn DocumentStore>,
}

impl EventManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Public catalog, optionally restricted to one date.
    pub async fn catalog(&self, date: Option<&str>) -> Result<Vec<Event>, AppError> {
        match date {
            Some(date) => self.list_on(date).await,
            None => self.store.list_events().await,
        }
    }

    /// Events whose `date` equals `date` exactly.
    pub async fn list_on(&self, date: &str) -> Result<Vec<Event>, AppError> {
        self.store.events_on(date).await
    }

    pub async fn list(&self, session: &Session) -> Result<Vec<Event>, AppError> {
        require_role(session, Role::Admin)?;
        self.store.list_events().await
    }

    pub async fn create(&self, session: &Session, input: &EventInput) -> Result<Event, AppError> {
        require_role(session, Role::Admin)?;
        input.validate()?;

        let event = self.store.add_event(input).await?;
        tracing::info!(event_id = %event.id, name = %event.name, "Event created");
        Ok(event)
    }

    pub async fn update(
        &self,
        session: &Session,
        id: &str,
        input: &EventInput,
    ) -> Result<Event, AppError> {
        require_role(session, Role::Admin)?;
        input.validate()?;

        let event = self.store.update_event(id, input).await?;
        tracing::info!(event_id = %id, "Event updated");
        Ok(event)
    }

    /// Remove the event. Favorites that reference it are left in place.
    pub async fn delete(&self, session: &Session, id: &str) -> Result<(), AppError> {
        require_role(session, Role::Admin)?;
        self.store.delete_event(id).await?;
        tracing::info!(event_id = %id, "Event deleted");
        Ok(())
    }
}

/// Single-record edit form: submit creates, or updates the record being edited.
#[derive(Debug, Clone, Default)]
pub struct EventForm {
    editing: Option<String>,
    pub input: EventInput,
}

impl EventForm {
    pub fn new(input: EventInput) -> Self {
        Self {
            editing: None,
            input,
        }
    }

    /// Populate the form from `event` and switch submit to update mode.
    pub fn edit(&mut self, event: &Event) {
        self.editing = Some(event.id.clone());
        self.input = EventInput::from(event);
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Create or update, then clear the form and leave edit mode.
    ///
    /// On error the form keeps its contents and mode.
    pub async fn submit(
        &mut self,
        manager: &EventManager,
        session: &Session,
    ) -> Result<Event, AppError> {
        let event = match &self.editing {
            Some(id) => manager.update(session, id, &self.input).await?,
            None => manager.create(session, &self.input).await?,
        };

        self.editing = None;
        self.input = EventInput::default();
        Ok(event)
    }
}
