// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in and sign-out against the identity provider.
//!
//! Every auth-state change this service causes is published on the
//! broadcast channel the [`SessionStore`](crate::session::SessionStore)
//! listens to.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::UserProfile;
use crate::services::identity::{Credential, Identity, IdentityProvider};
use crate::session::AuthStateChange;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Sign-up form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignUpRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Result of a successful sign-up: the account exists but is not verified.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignUpOutcome {
    pub email: String,
    pub verification_sent: bool,
}

/// Auth flows shared by the HTTP layer.
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    changes: broadcast::Sender<AuthStateChange>,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        changes: broadcast::Sender<AuthStateChange>,
    ) -> Self {
        Self {
            identity,
            store,
            changes,
        }
    }

    /// Create the account, write the initial profile and send the
    /// verification email. No session is established.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AppError> {
        request.validate()?;

        let credential = self
            .identity
            .create_user(&request.email, &request.password)
            .await
            .map_err(|e| auth_failure("create account", e))?;
        let uid = &credential.identity.uid;

        let profile =
            UserProfile::new_signup(&request.first_name, &request.last_name, &request.email);
        self.store
            .create_profile(uid, &profile)
            .await
            .map_err(|e| auth_failure("write initial profile", e))?;

        self.identity
            .send_verification_email(&credential.id_token)
            .await
            .map_err(|e| auth_failure("send verification email", e))?;

        tracing::info!(uid = %uid, "Account created, verification email sent");

        Ok(SignUpOutcome {
            email: credential.identity.email,
            verification_sent: true,
        })
    }

    /// Authenticate. Unverified identities are signed straight back out.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, AppError> {
        let credential = self
            .identity
            .sign_in(email, password)
            .await
            .map_err(|e| auth_failure("sign in", e))?;

        if !credential.identity.email_verified {
            self.identity
                .sign_out(&credential.id_token)
                .await
                .map_err(|e| auth_failure("sign out unverified identity", e))?;
            tracing::info!(
                uid = %credential.identity.uid,
                "Sign-in refused: email not verified"
            );
            return Err(AppError::EmailNotVerified);
        }

        tracing::info!(uid = %credential.identity.uid, "Signed in");
        self.publish(AuthStateChange::SignedIn(credential.identity.clone()));
        Ok(credential)
    }

    /// End the session for `identity`.
    pub async fn sign_out(&self, identity: &Identity, id_token: &str) {
        if let Err(e) = self.identity.sign_out(id_token).await {
            tracing::warn!(uid = %identity.uid, error = %e, "Provider sign-out failed");
        }
        tracing::info!(uid = %identity.uid, "Signed out");
        self.publish(AuthStateChange::SignedOut {
            uid: identity.uid.clone(),
        });
    }

    /// Re-send the verification email. Failures are logged, not surfaced.
    pub async fn resend_verification_email(&self, identity: &Identity, id_token: &str) -> bool {
        match self.identity.send_verification_email(id_token).await {
            Ok(()) => {
                tracing::info!(uid = %identity.uid, "Verification email re-sent");
                true
            }
            Err(e) => {
                tracing::error!(uid = %identity.uid, error = %e, "Error sending verification email");
                false
            }
        }
    }

    fn publish(&self, change: AuthStateChange) {
        if self.changes.send(change).is_err() {
            tracing::debug!("No session listener attached");
        }
    }
}

fn auth_failure(step: &str, error: impl std::fmt::Display) -> AppError {
    tracing::warn!(step, error = %error, "Authentication failed");
    AppError::Authentication
}
