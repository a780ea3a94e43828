// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide session mirror.
//!
//! [`SessionStore`] is built once at startup. It owns its subscription to the
//! auth-state stream and keeps one [`Session`] per signed-in uid, derived from
//! the identity provider and the user's profile document. Observers register
//! callbacks with [`SessionStore::subscribe`] and are told about every change.

use crate::db::DocumentStore;
use crate::models::Role;
use crate::services::identity::Identity;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Capacity of the auth-state broadcast channel.
pub const AUTH_EVENT_CAPACITY: usize = 64;

/// Sessions untouched for this long are dropped from the mirror.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// How often the listener sweeps idle sessions.
const EVICTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Mirrored session state for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Session {
    pub identity: Option<Identity>,
    pub loading: bool,
    pub role: Role,
    pub is_verified: bool,
}

impl Session {
    /// State after sign-out, or for a principal we know nothing about.
    pub fn signed_out() -> Self {
        Self {
            identity: None,
            loading: false,
            role: Role::User,
            is_verified: false,
        }
    }
}

struct Entry {
    session: Session,
    touched: Instant,
}

/// Auth-state change emitted by the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateChange {
    SignedIn(Identity),
    /// An existing provider session presented again (e.g. a request carrying a token).
    Restored(Identity),
    SignedOut { uid: String },
}

impl AuthStateChange {
    pub fn uid(&self) -> &str {
        match self {
            AuthStateChange::SignedIn(identity) | AuthStateChange::Restored(identity) => {
                &identity.uid
            }
            AuthStateChange::SignedOut { uid } => uid,
        }
    }
}

type Callback = Arc<dyn Fn(&str, &Session) + Send + Sync>;

/// Observable per-uid session store.
pub struct SessionStore {
    profiles: Arc<dyn DocumentStore>,
    sessions: DashMap<String, Entry>,
    subscribers: DashMap<u64, Callback>,
    next_subscriber: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(profiles: Arc<dyn DocumentStore>) -> Arc<Self> {
        Arc::new(Self {
            profiles,
            sessions: DashMap::new(),
            subscribers: DashMap::new(),
            next_subscriber: AtomicU64::new(0),
            listener: Mutex::new(None),
        })
    }

    /// Start consuming auth-state changes. Replaces any previous listener.
    pub fn attach(self: &Arc<Self>, mut changes: broadcast::Receiver<AuthStateChange>) {
        let store = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut sweep = tokio::time::interval_at(
                tokio::time::Instant::now() + EVICTION_INTERVAL,
                EVICTION_INTERVAL,
            );

            loop {
                tokio::select! {
                    received = changes.recv() => match received {
                        Ok(change) => {
                            let Some(store) = store.upgrade() else {
                                break;
                            };
                            store.apply(change).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Session listener lagged behind auth stream");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::debug!("Auth stream closed, session listener exiting");
                            break;
                        }
                    },
                    _ = sweep.tick() => {
                        let Some(store) = store.upgrade() else {
                            break;
                        };
                        store.evict_idle(SESSION_IDLE_TTL);
                    }
                }
            }
        });

        if let Some(previous) = self.lock_listener().replace(handle) {
            previous.abort();
        }
    }

    /// Stop the listener and drop all subscribers.
    pub fn shutdown(&self) {
        if let Some(handle) = self.lock_listener().take() {
            handle.abort();
        }
        self.subscribers.clear();
        tracing::info!("Session store shut down");
    }

    /// Register a callback invoked with `(uid, session)` on every change.
    ///
    /// The callback stays registered until the returned handle is dropped or
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&str, &Session) + Send + Sync + 'static,
    {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, Arc::new(callback));
        Subscription {
            id,
            store: Arc::downgrade(self),
        }
    }

    /// Current snapshot for `uid`, if a session exists.
    pub fn current(&self, uid: &str) -> Option<Session> {
        self.sessions.get(uid).map(|entry| entry.session.clone())
    }

    /// Restore the session for `identity` and return it once resolved.
    ///
    /// The profile is read on every call, so a role or verification change in
    /// the store takes effect on the next request carrying the token.
    pub async fn resolve(&self, identity: &Identity) -> Session {
        self.apply(AuthStateChange::Restored(identity.clone())).await
    }

    /// Drop sessions not touched within `ttl`. Returns how many were dropped.
    ///
    /// Subscribers are not notified: the principal has not signed out, and
    /// the next request carrying its token restores the entry.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.touched.elapsed() < ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle sessions");
        }
        evicted
    }

    /// Apply one auth-state change and return the resulting session.
    pub async fn apply(&self, change: AuthStateChange) -> Session {
        match change {
            AuthStateChange::SignedIn(identity) | AuthStateChange::Restored(identity) => {
                self.resolve_identity(identity).await
            }
            AuthStateChange::SignedOut { uid } => {
                let session = Session::signed_out();
                self.sessions.remove(&uid);
                self.notify(&uid, &session);
                tracing::debug!(uid = %uid, "Session cleared");
                session
            }
        }
    }

    async fn resolve_identity(&self, identity: Identity) -> Session {
        let uid = identity.uid.clone();
        let previous = self.current(&uid);

        let mut session = Session {
            identity: Some(identity.clone()),
            loading: true,
            role: previous.as_ref().map(|s| s.role).unwrap_or_default(),
            is_verified: previous.as_ref().is_some_and(|s| s.is_verified),
        };
        self.publish(&uid, &session);

        match self.profiles.get_profile(&uid).await {
            Ok(Some(profile)) => {
                session.role = profile.role;
                // The provider flag is authoritative; the profile only mirrors it.
                session.is_verified = identity.email_verified;

                if profile.is_verified != identity.email_verified {
                    match self
                        .profiles
                        .set_profile_verified(&uid, identity.email_verified)
                        .await
                    {
                        Ok(()) => tracing::info!(
                            uid = %uid,
                            is_verified = identity.email_verified,
                            "Reconciled profile verification flag"
                        ),
                        Err(e) => tracing::error!(
                            uid = %uid,
                            error = %e,
                            "Failed to reconcile profile verification flag"
                        ),
                    }
                }
            }
            Ok(None) => {
                tracing::error!(uid = %uid, "User profile does not exist");
                session.role = Role::User;
            }
            Err(e) => {
                tracing::error!(uid = %uid, error = %e, "Error fetching user profile");
                session.role = Role::User;
            }
        }

        session.loading = false;
        self.publish(&uid, &session);
        session
    }

    fn publish(&self, uid: &str, session: &Session) {
        self.sessions.insert(
            uid.to_string(),
            Entry {
                session: session.clone(),
                touched: Instant::now(),
            },
        );
        self.notify(uid, session);
    }

    fn notify(&self, uid: &str, session: &Session) {
        // Snapshot first so callbacks may (un)subscribe without deadlocking.
        let callbacks: Vec<Callback> = self
            .subscribers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for callback in callbacks {
            callback(uid, session);
        }
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.listener.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_listener().take() {
            handle.abort();
        }
    }
}

/// Handle for a registered session callback. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    store: Weak<SessionStore>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.subscribers.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::UserProfile;

    fn identity(verified: bool) -> Identity {
        Identity {
            uid: "u1".to_string(),
            email: "a@b.com".to_string(),
            email_verified: verified,
        }
    }

    #[tokio::test]
    async fn test_resolve_rereads_profile_every_time() {
        let db = Arc::new(MemoryStore::new());
        db.create_profile("u1", &UserProfile::new_signup("A", "B", "a@b.com"))
            .await
            .unwrap();
        let store = SessionStore::new(db.clone());

        let seen = Arc::new(AtomicU64::new(0));
        let counter = seen.clone();
        let _sub = store.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let first = store.resolve(&identity(false)).await;
        assert!(!first.loading);
        assert_eq!(first.role, Role::User);
        // loading + resolved
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        db.create_profile(
            "u1",
            &UserProfile {
                role: Role::Admin,
                ..UserProfile::new_signup("A", "B", "a@b.com")
            },
        )
        .await
        .unwrap();

        let promoted = store.resolve(&identity(false)).await;
        assert_eq!(promoted.role, Role::Admin);
        assert_eq!(seen.load(Ordering::SeqCst), 4);

        let verified = store.resolve(&identity(true)).await;
        assert!(verified.is_verified);
        assert_eq!(seen.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_evict_idle_drops_stale_sessions() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        store.resolve(&identity(true)).await;
        assert!(store.current("u1").is_some());

        assert_eq!(store.evict_idle(SESSION_IDLE_TTL), 0);
        assert!(store.current("u1").is_some());

        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(store.current("u1").is_none());

        // The next request restores it.
        let restored = store.resolve(&identity(true)).await;
        assert!(!restored.loading);
        assert!(store.current("u1").is_some());
    }

    #[test]
    fn test_change_uid() {
        assert_eq!(AuthStateChange::Restored(identity(true)).uid(), "u1");
        assert_eq!(
            AuthStateChange::SignedOut {
                uid: "u2".to_string()
            }
            .uid(),
            "u2"
        );
    }
}
