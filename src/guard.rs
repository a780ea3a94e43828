// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Capability guard shared by every role-restricted operation.

use crate::error::AppError;
use crate::models::Role;
use crate::session::Session;
use axum::{extract::Request, middleware::Next, response::Response};

/// Why a guarded operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("no signed-in identity")]
    NotSignedIn,

    #[error("requires role {required:?}, session has {actual:?}")]
    InsufficientRole { required: Role, actual: Role },
}

impl From<AccessDenied> for AppError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::NotSignedIn => AppError::Unauthorized,
            AccessDenied::InsufficientRole { .. } => AppError::Forbidden,
        }
    }
}

/// Allow when the session has an identity and at least `required`.
pub fn require_role(session: &Session, required: Role) -> Result<(), AccessDenied> {
    if session.identity.is_none() {
        return Err(AccessDenied::NotSignedIn);
    }
    if session.role < required {
        return Err(AccessDenied::InsufficientRole {
            required,
            actual: session.role,
        });
    }
    Ok(())
}

/// Middleware for admin routes. Must run after `require_auth`, which puts
/// the resolved [`Session`] in the request extensions.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let session = request
        .extensions()
        .get::<Session>()
        .ok_or(AppError::Unauthorized)?;

    if let Err(denied) = require_role(session, Role::Admin) {
        tracing::warn!(
            uid = session.identity.as_ref().map(|i| i.uid.as_str()).unwrap_or("<none>"),
            reason = %denied,
            "Blocked admin request"
        );
        return Err(denied.into());
    }

    Ok(next.run(request).await)
}
