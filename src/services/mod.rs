// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod events;
pub mod favorites;
pub mod firebase_auth;
pub mod firebase_token;
pub mod identity;
pub mod memory_identity;

pub use auth::{AuthService, SignUpOutcome, SignUpRequest};
pub use events::{EventForm, EventManager};
pub use favorites::{
    FavoriteCommand, FavoriteError, FavoritesService, ProfilePage, ProfileView, ToggleOutcome,
};
pub use firebase_auth::FirebaseAuthClient;
pub use firebase_token::FirebaseTokenVerifier;
pub use identity::{Credential, Identity, IdentityError, IdentityProvider};
pub use memory_identity::MemoryIdentityProvider;
