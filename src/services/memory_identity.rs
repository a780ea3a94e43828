// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process identity provider for local runs and tests.
//!
//! Mirrors the Firebase rules the application depends on: duplicate emails
//! and passwords shorter than six characters are rejected, new accounts are
//! unverified, and ID tokens expire after an hour.
//!
//! There is no mailbox behind it. A provider built
//! [`with_verify_on_send`](MemoryIdentityProvider::with_verify_on_send) treats
//! a sent verification email as followed, so local runs can complete sign-up
//! and sign-in end to end.

use crate::services::identity::{Credential, Identity, IdentityError, IdentityProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const MIN_PASSWORD_LEN: usize = 6;

/// Lifetime of an issued ID token, matching Firebase.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password: String,
    email_verified: bool,
}

struct IssuedToken {
    email: String,
    issued: Instant,
}

/// Identity provider backed by process memory.
pub struct MemoryIdentityProvider {
    /// Keyed by email
    accounts: DashMap<String, Account>,
    /// ID token -> holder
    tokens: DashMap<String, IssuedToken>,
    /// uid -> verification emails sent
    verification_emails: DashMap<String, u32>,
    sign_outs: AtomicUsize,
    fail_verification_emails: AtomicBool,
    verify_on_send: bool,
    token_lifetime: Duration,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            tokens: DashMap::new(),
            verification_emails: DashMap::new(),
            sign_outs: AtomicUsize::new(0),
            fail_verification_emails: AtomicBool::new(false),
            verify_on_send: false,
            token_lifetime: TOKEN_LIFETIME,
        }
    }

    /// Verify the account as soon as its verification email is sent.
    pub fn with_verify_on_send(mut self) -> Self {
        self.verify_on_send = true;
        self
    }

    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Flip the verification flag, as following the emailed link would.
    pub fn mark_verified(&self, email: &str) -> bool {
        match self.accounts.get_mut(email) {
            Some(mut account) => {
                account.email_verified = true;
                true
            }
            None => false,
        }
    }

    pub fn verification_emails_sent(&self, uid: &str) -> u32 {
        self.verification_emails.get(uid).map(|n| *n).unwrap_or(0)
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    /// Make `send_verification_email` fail until switched back.
    pub fn set_fail_verification_emails(&self, fail: bool) {
        self.fail_verification_emails.store(fail, Ordering::SeqCst);
    }

    fn issue_token(&self, account: &Account) -> Credential {
        let lifetime = self.token_lifetime;
        self.tokens.retain(|_, token| token.issued.elapsed() < lifetime);

        let id_token = uuid::Uuid::new_v4().to_string();
        self.tokens.insert(
            id_token.clone(),
            IssuedToken {
                email: account.email.clone(),
                issued: Instant::now(),
            },
        );
        Credential {
            identity: identity_of(account),
            id_token,
        }
    }

    fn account_for_token(&self, id_token: &str) -> Result<Account, IdentityError> {
        let (email, expired) = self
            .tokens
            .get(id_token)
            .map(|t| (t.email.clone(), t.issued.elapsed() >= self.token_lifetime))
            .ok_or_else(|| IdentityError::InvalidToken("INVALID_ID_TOKEN".to_string()))?;
        if expired {
            self.tokens.remove(id_token);
            return Err(IdentityError::InvalidToken("TOKEN_EXPIRED".to_string()));
        }
        self.accounts
            .get(&email)
            .map(|a| a.clone())
            .ok_or_else(|| IdentityError::InvalidToken("USER_NOT_FOUND".to_string()))
    }
}

fn identity_of(account: &Account) -> Identity {
    Identity {
        uid: account.uid.clone(),
        email: account.email.clone(),
        email_verified: account.email_verified,
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> Result<Credential, IdentityError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Rejected("WEAK_PASSWORD".to_string()));
        }

        let account = match self.accounts.entry(email.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(IdentityError::Rejected("EMAIL_EXISTS".to_string()));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => slot
                .insert(Account {
                    uid: uuid::Uuid::new_v4().simple().to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    email_verified: false,
                })
                .clone(),
        };

        Ok(self.issue_token(&account))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, IdentityError> {
        let account = self
            .accounts
            .get(email)
            .filter(|a| a.password == password)
            .map(|a| a.clone())
            .ok_or_else(|| IdentityError::Rejected("INVALID_LOGIN_CREDENTIALS".to_string()))?;

        Ok(self.issue_token(&account))
    }

    async fn sign_out(&self, id_token: &str) -> Result<(), IdentityError> {
        self.tokens.remove(id_token);
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_verification_email(&self, id_token: &str) -> Result<(), IdentityError> {
        let account = self.account_for_token(id_token)?;
        if self.fail_verification_emails.load(Ordering::SeqCst) {
            return Err(IdentityError::Transport("TOO_MANY_ATTEMPTS_TRY_LATER".to_string()));
        }
        *self
            .verification_emails
            .entry(account.uid.clone())
            .or_insert(0) += 1;

        if self.verify_on_send && self.mark_verified(&account.email) {
            tracing::info!(uid = %account.uid, "Verification email auto-followed");
        }
        Ok(())
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<Identity, IdentityError> {
        self.account_for_token(id_token).map(|a| identity_of(&a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_and_weak_password() {
        let provider = MemoryIdentityProvider::new();
        provider.create_user("a@b.com", "secret1").await.unwrap();

        assert!(matches!(
            provider.create_user("a@b.com", "secret2").await,
            Err(IdentityError::Rejected(ref c)) if c == "EMAIL_EXISTS"
        ));
        assert!(matches!(
            provider.create_user("c@d.com", "123").await,
            Err(IdentityError::Rejected(ref c)) if c == "WEAK_PASSWORD"
        ));
    }

    #[tokio::test]
    async fn test_token_reflects_current_verification_and_sign_out() {
        let provider = MemoryIdentityProvider::new();
        let credential = provider.create_user("a@b.com", "secret1").await.unwrap();
        assert!(!credential.identity.email_verified);

        assert!(provider.mark_verified("a@b.com"));
        let identity = provider.verify_id_token(&credential.id_token).await.unwrap();
        assert!(identity.email_verified);

        provider.sign_out(&credential.id_token).await.unwrap();
        assert!(provider.verify_id_token(&credential.id_token).await.is_err());
        assert_eq!(provider.sign_outs(), 1);
    }

    #[tokio::test]
    async fn test_verify_on_send_marks_account_verified() {
        let provider = MemoryIdentityProvider::new().with_verify_on_send();
        let credential = provider.create_user("a@b.com", "secret1").await.unwrap();

        provider
            .send_verification_email(&credential.id_token)
            .await
            .unwrap();
        assert_eq!(provider.verification_emails_sent(&credential.identity.uid), 1);

        let signed_in = provider.sign_in("a@b.com", "secret1").await.unwrap();
        assert!(signed_in.identity.email_verified);
    }

    #[tokio::test]
    async fn test_send_without_verify_on_send_leaves_account_unverified() {
        let provider = MemoryIdentityProvider::new();
        let credential = provider.create_user("a@b.com", "secret1").await.unwrap();

        provider
            .send_verification_email(&credential.id_token)
            .await
            .unwrap();
        let identity = provider.verify_id_token(&credential.id_token).await.unwrap();
        assert!(!identity.email_verified);
    }

    #[tokio::test]
    async fn test_expired_tokens_rejected_and_pruned() {
        let provider = MemoryIdentityProvider::new().with_token_lifetime(Duration::ZERO);
        let first = provider.create_user("a@b.com", "secret1").await.unwrap();

        assert!(matches!(
            provider.verify_id_token(&first.id_token).await,
            Err(IdentityError::InvalidToken(ref c)) if c == "TOKEN_EXPIRED"
        ));
        // Second lookup no longer finds it at all.
        assert!(matches!(
            provider.verify_id_token(&first.id_token).await,
            Err(IdentityError::InvalidToken(ref c)) if c == "INVALID_ID_TOKEN"
        ));

        provider.sign_in("a@b.com", "secret1").await.unwrap();
        provider.sign_in("a@b.com", "secret1").await.unwrap();
        // Each issue prunes everything already expired.
        assert_eq!(provider.tokens.len(), 1);
    }
}
