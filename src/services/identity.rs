// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider boundary.
//!
//! The provider owns accounts, passwords and the email-verification flag.
//! Everything the application knows about a signed-in principal comes from
//! an [`Identity`] returned here.

use async_trait::async_trait;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Authenticated principal as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    /// Authoritative verification flag
    pub email_verified: bool,
}

/// Identity plus the provider ID token that proves it.
#[derive(Debug, Clone)]
pub struct Credential {
    pub identity: Identity,
    pub id_token: String,
}

/// Identity provider error categories.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider refused the request (EMAIL_EXISTS, WEAK_PASSWORD, ...).
    #[error("identity provider rejected request: {0}")]
    Rejected(String),

    /// The ID token is missing, malformed, expired or mis-issued.
    #[error("invalid ID token: {0}")]
    InvalidToken(String),

    /// Network or decoding failure talking to the provider.
    #[error("identity provider unavailable: {0}")]
    Transport(String),
}

/// Operations consumed from the managed auth service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account with email and password. The new identity is unverified.
    async fn create_user(&self, email: &str, password: &str) -> Result<Credential, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, IdentityError>;

    async fn sign_out(&self, id_token: &str) -> Result<(), IdentityError>;

    async fn send_verification_email(&self, id_token: &str) -> Result<(), IdentityError>;

    /// Resolve an ID token to the identity it was issued for.
    async fn verify_id_token(&self, id_token: &str) -> Result<Identity, IdentityError>;
}
