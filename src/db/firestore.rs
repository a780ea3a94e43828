// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, verification mirror, favorites)
//! - Events (admin-managed catalog)

use crate::db::{collections, fields, new_document_id, DocumentStore};
use crate::error::AppError;
use crate::models::{Event, EventInput, UserProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Partial document used for the `isVerified` merge write.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifiedPatch {
    is_verified: bool,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any bearer token, so skip credential discovery.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Apply an array transform to `users/{uid}.favoriteEvents`.
    ///
    /// Transforms only go through transactions/batches in the fluent API, so
    /// each mutation is a single-write transaction.
    async fn transform_favorites(
        &self,
        uid: &str,
        event_id: &str,
        add: bool,
    ) -> Result<(), AppError> {
        let client = &self.client;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let values = [event_id.to_string()];
        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .transforms(|t| {
                let field = t.field(fields::FAVORITE_EVENTS);
                if add {
                    t.fields([field.append_missing_elements(values.clone())])
                } else {
                    t.fields([field.remove_all_from_array(values.clone())])
                }
            })
            .only_transform()
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add favorites transform: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn set_profile_verified(&self, uid: &str, verified: bool) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .fields([fields::IS_VERIFIED])
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&VerifiedPatch {
                is_verified: verified,
            })
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn add_favorite(&self, uid: &str, event_id: &str) -> Result<(), AppError> {
        self.transform_favorites(uid, event_id, true).await
    }

    async fn remove_favorite(&self, uid: &str, event_id: &str) -> Result<(), AppError> {
        self.transform_favorites(uid, event_id, false).await
    }

    // ─── Event Operations ────────────────────────────────────────

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::EVENTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn events_on(&self, date: &str) -> Result<Vec<Event>, AppError> {
        let date = date.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::EVENTS)
            .filter(move |q| q.field(fields::DATE).eq(date.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::EVENTS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn add_event(&self, input: &EventInput) -> Result<Event, AppError> {
        let id = new_document_id();
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::EVENTS)
            .document_id(&id)
            .object(input)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Event::from_input(id, input))
    }

    async fn update_event(&self, id: &str, input: &EventInput) -> Result<Event, AppError> {
        if self.get_event(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }

        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::EVENTS)
            .document_id(id)
            .object(input)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Event::from_input(id, input))
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::EVENTS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
