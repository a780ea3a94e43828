// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile page state and favorite toggling.
//!
//! A toggle is a [`FavoriteCommand`]: it is applied to the local page state
//! first, then sent to the store as an array-union or array-remove. If the
//! store write fails, the inverse command is applied locally and the failure
//! is reported as [`FavoriteError::RolledBack`].

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{Event, UserProfile};
use crate::services::identity::Identity;
use crate::session::Session;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One favorites mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteCommand {
    Add(Event),
    Remove(Event),
}

impl FavoriteCommand {
    pub fn event(&self) -> &Event {
        match self {
            FavoriteCommand::Add(event) | FavoriteCommand::Remove(event) => event,
        }
    }

    /// The compensating command.
    pub fn inverse(&self) -> Self {
        match self {
            FavoriteCommand::Add(event) => FavoriteCommand::Remove(event.clone()),
            FavoriteCommand::Remove(event) => FavoriteCommand::Add(event.clone()),
        }
    }
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// No identity, no profile, or not verified. Nothing changed.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum FavoriteError {
    #[error("favorite change for event {} rolled back: {source}", .command.event().id)]
    RolledBack {
        command: FavoriteCommand,
        source: AppError,
    },
}

impl From<FavoriteError> for AppError {
    fn from(error: FavoriteError) -> Self {
        match error {
            FavoriteError::RolledBack { source, .. } => source,
        }
    }
}

/// Profile fields shown on the page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileSummary {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Verification-gated rendering of the profile page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ProfileView {
    /// Only the resend-verification affordance is offered.
    Unverified { profile: ProfileSummary },
    Verified {
        profile: ProfileSummary,
        favorites: Vec<Event>,
        events: Vec<Event>,
    },
}

/// Local state of one user's profile page.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    identity: Option<Identity>,
    is_verified: bool,
    pub profile: Option<UserProfile>,
    /// Resolved favorites, dangling ids already dropped
    pub favorites: Vec<Event>,
    /// Full catalog
    pub events: Vec<Event>,
}

impl ProfilePage {
    pub fn new(
        identity: Option<Identity>,
        is_verified: bool,
        profile: Option<UserProfile>,
        favorites: Vec<Event>,
        events: Vec<Event>,
    ) -> Self {
        Self {
            identity,
            is_verified,
            profile,
            favorites,
            events,
        }
    }

    pub fn is_favorite(&self, event_id: &str) -> bool {
        self.favorites.iter().any(|e| e.id == event_id)
    }

    /// Find an event shown on the page, favorites first.
    pub fn find_event(&self, event_id: &str) -> Option<&Event> {
        self.favorites
            .iter()
            .chain(self.events.iter())
            .find(|e| e.id == event_id)
    }

    pub fn view(&self) -> Option<ProfileView> {
        let profile = self.profile.as_ref()?;
        let summary = ProfileSummary {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
        };

        Some(if self.is_verified {
            ProfileView::Verified {
                profile: summary,
                favorites: self.favorites.clone(),
                events: self.events.clone(),
            }
        } else {
            ProfileView::Unverified { profile: summary }
        })
    }

    fn apply(&mut self, command: &FavoriteCommand) {
        let event = command.event();
        match command {
            FavoriteCommand::Add(_) => {
                if !self.is_favorite(&event.id) {
                    self.favorites.push(event.clone());
                }
                if let Some(profile) = self.profile.as_mut() {
                    if !profile.favorite_events.contains(&event.id) {
                        profile.favorite_events.push(event.id.clone());
                    }
                }
            }
            FavoriteCommand::Remove(_) => {
                self.favorites.retain(|e| e.id != event.id);
                if let Some(profile) = self.profile.as_mut() {
                    profile.favorite_events.retain(|id| id != &event.id);
                }
            }
        }
    }
}

/// Builds profile pages and executes favorite commands.
#[derive(Clone)]
pub struct FavoritesService {
    store: Arc<dyn DocumentStore>,
}

impl FavoritesService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load the profile, its resolved favorites and the full catalog.
    pub async fn load(&self, session: &Session) -> Result<ProfilePage, AppError> {
        let identity = session.identity.clone().ok_or(AppError::Unauthorized)?;

        let (profile, events) = tokio::try_join!(
            self.store.get_profile(&identity.uid),
            self.store.list_events()
        )?;

        let profile = profile.ok_or_else(|| {
            AppError::NotFound("Please sign in to view your profile.".to_string())
        })?;

        let favorites = self.resolve_favorites(&profile.favorite_events).await?;

        Ok(ProfilePage::new(
            Some(identity),
            session.is_verified,
            Some(profile),
            favorites,
            events,
        ))
    }

    /// Point-read each id concurrently, keeping order and dropping ids whose
    /// event no longer exists.
    pub async fn resolve_favorites(&self, ids: &[String]) -> Result<Vec<Event>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let reads = join_all(ids.iter().map(|id| self.store.get_event(id))).await;

        let mut resolved = Vec::with_capacity(ids.len());
        for read in reads {
            if let Some(event) = read? {
                resolved.push(event);
            }
        }

        let dangling = ids.len() - resolved.len();
        if dangling > 0 {
            tracing::debug!(dangling, "Skipped favorites referencing deleted events");
        }

        Ok(resolved)
    }

    /// Toggle `event` in the page's favorites.
    pub async fn toggle(
        &self,
        page: &mut ProfilePage,
        event: Event,
    ) -> Result<ToggleOutcome, FavoriteError> {
        let uid = match (&page.identity, &page.profile, page.is_verified) {
            (Some(identity), Some(_), true) => identity.uid.clone(),
            _ => return Ok(ToggleOutcome::Skipped),
        };

        let command = if page.is_favorite(&event.id) {
            FavoriteCommand::Remove(event)
        } else {
            FavoriteCommand::Add(event)
        };

        page.apply(&command);

        let event_id = &command.event().id;
        let result = match &command {
            FavoriteCommand::Add(_) => self.store.add_favorite(&uid, event_id).await,
            FavoriteCommand::Remove(_) => self.store.remove_favorite(&uid, event_id).await,
        };

        match result {
            Ok(()) => Ok(match command {
                FavoriteCommand::Add(_) => ToggleOutcome::Added,
                FavoriteCommand::Remove(_) => ToggleOutcome::Removed,
            }),
            Err(source) => {
                page.apply(&command.inverse());
                tracing::warn!(
                    uid = %uid,
                    event_id = %event_id,
                    error = %source,
                    "Favorite write failed, local change rolled back"
                );
                Err(FavoriteError::RolledBack { command, source })
            }
        }
    }
}
