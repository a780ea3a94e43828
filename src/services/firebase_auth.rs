// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Auth (Identity Toolkit REST API) client.
//!
//! Handles:
//! - Email/password sign-up and sign-in
//! - Verification email dispatch
//! - ID token resolution (JWKS in production, `accounts:lookup` on the emulator)

use crate::services::firebase_token::FirebaseTokenVerifier;
use crate::services::identity::{Credential, Identity, IdentityError, IdentityProvider};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity Toolkit client bound to one project's web API key.
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// `None` when talking to the emulator, whose tokens are unsigned.
    verifier: Option<FirebaseTokenVerifier>,
}

impl FirebaseAuthClient {
    /// Create a client against production Firebase Auth.
    pub fn new(project_id: &str, api_key: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            base_url: IDENTITY_TOOLKIT_URL.to_string(),
            api_key: api_key.to_string(),
            verifier: Some(FirebaseTokenVerifier::new(project_id)?),
        })
    }

    /// Create a client against the Auth emulator (`host:port`).
    pub fn new_emulator(emulator_host: &str, api_key: &str) -> anyhow::Result<Self> {
        tracing::info!(host = %emulator_host, "Using Firebase Auth emulator");
        Ok(Self {
            http: build_http_client()?,
            base_url: format!("http://{}/identitytoolkit.googleapis.com/v1", emulator_host),
            api_key: api_key.to_string(),
            verifier: None,
        })
    }

    /// POST `{base}/accounts:{method}?key=...` and parse the JSON reply.
    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, IdentityError> {
        let url = format!("{}/accounts:{}", self.base_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(format!("{method} request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("{method} JSON parse error: {e}")))
    }

    /// Look up the account behind an ID token.
    async fn lookup(&self, id_token: &str) -> Result<Identity, IdentityError> {
        let response: LookupResponse = self.call("lookup", &IdTokenRequest { id_token }).await?;

        let user = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::InvalidToken("no account for ID token".to_string()))?;

        Ok(Identity {
            uid: user.local_id,
            email: user.email.unwrap_or_default(),
            email_verified: user.email_verified,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn create_user(&self, email: &str, password: &str) -> Result<Credential, IdentityError> {
        let response: PasswordAuthResponse = self
            .call(
                "signUp",
                &PasswordAuthRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        tracing::info!(uid = %response.local_id, "Created Firebase account");

        Ok(Credential {
            identity: Identity {
                uid: response.local_id,
                email: response.email,
                email_verified: false,
            },
            id_token: response.id_token,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, IdentityError> {
        let response: PasswordAuthResponse = self
            .call(
                "signInWithPassword",
                &PasswordAuthRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        // signInWithPassword does not report the verification flag.
        let identity = self.lookup(&response.id_token).await?;

        Ok(Credential {
            identity,
            id_token: response.id_token,
        })
    }

    async fn sign_out(&self, _id_token: &str) -> Result<(), IdentityError> {
        // ID tokens are stateless; dropping the cookie ends the session.
        tracing::debug!("Firebase sign-out is client-side only");
        Ok(())
    }

    async fn send_verification_email(&self, id_token: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "VERIFY_EMAIL",
                    id_token,
                },
            )
            .await?;
        Ok(())
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<Identity, IdentityError> {
        match &self.verifier {
            Some(verifier) => verifier.verify(id_token).await,
            None => self.lookup(id_token).await,
        }
    }
}

fn build_http_client() -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .context("failed building Identity Toolkit HTTP client")
}

/// Map an Identity Toolkit error reply to an [`IdentityError`].
///
/// Bodies look like `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`;
/// some messages carry a suffix (`WEAK_PASSWORD : Password should be ...`).
fn classify_error(status: reqwest::StatusCode, body: &str) -> IdentityError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {}", status));

    let code = message
        .split(" : ")
        .next()
        .unwrap_or(&message)
        .trim()
        .to_string();

    match code.as_str() {
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "USER_DISABLED" => {
            IdentityError::InvalidToken(code)
        }
        _ if status.is_client_error() => IdentityError::Rejected(code),
        _ => IdentityError::Transport(code),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordAuthRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'a str,
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordAuthResponse {
    id_token: String,
    local_id: String,
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
