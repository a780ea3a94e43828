// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session mirror tests: profile-derived role, verification reconciliation,
//! failure defaults, sign-out and the subscription lifecycle.

use eventboard::db::{DocumentStore, MemoryStore};
use eventboard::models::{Role, UserProfile};
use eventboard::services::Identity;
use eventboard::session::{AuthStateChange, Session, SessionStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

mod common;
use common::FlakyStore;

fn identity(uid: &str, verified: bool) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: format!("{uid}@example.com"),
        email_verified: verified,
    }
}

async fn store_with_profile(uid: &str, role: Role, is_verified: bool) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let profile = UserProfile {
        role,
        is_verified,
        ..UserProfile::new_signup("Test", "User", &format!("{uid}@example.com"))
    };
    store.create_profile(uid, &profile).await.unwrap();
    store
}

#[tokio::test]
async fn test_admin_role_from_profile() {
    let store = store_with_profile("u1", Role::Admin, true).await;
    let sessions = SessionStore::new(store);

    let session = sessions
        .apply(AuthStateChange::SignedIn(identity("u1", true)))
        .await;

    assert_eq!(session.role, Role::Admin);
    assert!(session.is_verified);
    assert!(!session.loading);
    assert_eq!(sessions.current("u1"), Some(session));
}

#[tokio::test]
async fn test_verification_flag_is_reconciled() {
    let store = store_with_profile("u1", Role::User, false).await;
    let sessions = SessionStore::new(store.clone());

    let session = sessions
        .apply(AuthStateChange::SignedIn(identity("u1", true)))
        .await;

    assert!(session.is_verified);
    let profile = store.get_profile("u1").await.unwrap().unwrap();
    assert!(profile.is_verified);
    // Only the flag was merged
    assert_eq!(profile.role, Role::User);
    assert_eq!(profile.first_name, "Test");
}

#[tokio::test]
async fn test_reconcile_failure_is_not_surfaced() {
    let store = Arc::new(FlakyStore::new());
    store
        .create_profile("u1", &UserProfile::new_signup("A", "B", "u1@example.com"))
        .await
        .unwrap();
    store.fail_verified_writes.store(true, Ordering::SeqCst);

    let sessions = SessionStore::new(store.clone());
    let session = sessions
        .apply(AuthStateChange::SignedIn(identity("u1", true)))
        .await;

    assert!(session.is_verified);
    assert!(!session.loading);
    assert!(!store.get_profile("u1").await.unwrap().unwrap().is_verified);
}

#[tokio::test]
async fn test_missing_profile_defaults_to_user() {
    let sessions = SessionStore::new(Arc::new(MemoryStore::new()));

    let session = sessions
        .apply(AuthStateChange::SignedIn(identity("ghost", true)))
        .await;

    assert_eq!(session.role, Role::User);
    assert!(!session.loading);
    assert_eq!(session.identity, Some(identity("ghost", true)));
    // No previous value to keep
    assert!(!session.is_verified);
}

#[tokio::test]
async fn test_profile_fetch_failure_defaults_to_user() {
    let store = Arc::new(FlakyStore::new());
    let profile = UserProfile {
        role: Role::Admin,
        ..UserProfile::new_signup("A", "B", "u1@example.com")
    };
    store.create_profile("u1", &profile).await.unwrap();
    store.fail_profile_reads.store(true, Ordering::SeqCst);

    let sessions = SessionStore::new(store);
    let session = sessions
        .apply(AuthStateChange::SignedIn(identity("u1", true)))
        .await;

    assert_eq!(session.role, Role::User);
    assert!(!session.loading);
}

#[tokio::test]
async fn test_sign_out_resets_and_removes_entry() {
    let store = store_with_profile("u1", Role::Admin, true).await;
    let sessions = SessionStore::new(store);
    sessions
        .apply(AuthStateChange::SignedIn(identity("u1", true)))
        .await;

    let seen: Arc<Mutex<Vec<Session>>> = Arc::default();
    let sink = seen.clone();
    let _sub = sessions.subscribe(move |_, session| sink.lock().unwrap().push(session.clone()));

    let session = sessions
        .apply(AuthStateChange::SignedOut {
            uid: "u1".to_string(),
        })
        .await;

    assert_eq!(session, Session::signed_out());
    assert_eq!(session.role, Role::User);
    assert!(!session.is_verified);
    assert!(sessions.current("u1").is_none());
    assert_eq!(*seen.lock().unwrap(), vec![Session::signed_out()]);
}

#[tokio::test]
async fn test_subscribers_see_loading_then_resolved() {
    let store = store_with_profile("u1", Role::Admin, true).await;
    let sessions = SessionStore::new(store);

    let seen: Arc<Mutex<Vec<(String, bool, Role)>>> = Arc::default();
    let sink = seen.clone();
    let sub = sessions.subscribe(move |uid, session| {
        sink.lock()
            .unwrap()
            .push((uid.to_string(), session.loading, session.role));
    });

    sessions
        .apply(AuthStateChange::SignedIn(identity("u1", true)))
        .await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("u1".to_string(), true, Role::User),
            ("u1".to_string(), false, Role::Admin),
        ]
    );

    sub.unsubscribe();
    sessions
        .apply(AuthStateChange::Restored(identity("u1", false)))
        .await;
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dropping_subscription_unsubscribes() {
    let sessions = SessionStore::new(Arc::new(MemoryStore::new()));
    let calls = Arc::new(AtomicUsize::new(0));

    {
        let counter = calls.clone();
        let _sub = sessions.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sessions
            .apply(AuthStateChange::SignedOut {
                uid: "u1".to_string(),
            })
            .await;
    }

    sessions
        .apply(AuthStateChange::SignedOut {
            uid: "u1".to_string(),
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listener_applies_broadcast_changes() {
    let store = store_with_profile("u1", Role::Admin, true).await;
    let sessions = SessionStore::new(store);
    let (tx, rx) = broadcast::channel(16);
    sessions.attach(rx);

    let (resolved_tx, mut resolved_rx) = mpsc::unbounded_channel();
    let _sub = sessions.subscribe(move |uid, session| {
        if !session.loading {
            let _ = resolved_tx.send((uid.to_string(), session.clone()));
        }
    });

    tx.send(AuthStateChange::SignedIn(identity("u1", true)))
        .unwrap();
    let (uid, session) = tokio::time::timeout(Duration::from_secs(5), resolved_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(uid, "u1");
    assert_eq!(session.role, Role::Admin);

    tx.send(AuthStateChange::SignedOut {
        uid: "u1".to_string(),
    })
    .unwrap();
    let (_, session) = tokio::time::timeout(Duration::from_secs(5), resolved_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session, Session::signed_out());
    assert!(sessions.current("u1").is_none());

    sessions.shutdown();
}

#[tokio::test]
async fn test_sign_in_through_auth_service_reaches_session_store() {
    let app = common::create_test_app();
    let user = common::seed_user(&app, "admin@example.com", Role::Admin, true).await;

    let (resolved_tx, mut resolved_rx) = mpsc::unbounded_channel();
    let _sub = app.state.sessions.subscribe(move |uid, session| {
        if !session.loading {
            let _ = resolved_tx.send((uid.to_string(), session.role));
        }
    });

    app.state
        .auth
        .sign_in("admin@example.com", "password123")
        .await
        .unwrap();

    let (uid, role) = tokio::time::timeout(Duration::from_secs(5), resolved_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(uid, user.uid);
    assert_eq!(role, Role::Admin);
}
