//! End-to-end session lifecycle: login, rotation, revocation, and the
//! rotation race, driven through an in-memory credential store whose
//! compare-and-set behaves like the production single-row update.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use clipstream_core::auth::{
    AuthCrypto, AuthError, SessionManager, TokenCodec, TokenKind, TokenSettings,
};
use clipstream_core::error::{Result as StoreResult, StoreError};
use clipstream_core::users::store::{SwapOutcome, UserStore};
use clipstream_core::users::{NewUser, User};

/// Credential store backed by a mutex-guarded map. The mutex makes each
/// store call atomic, which is exactly the guarantee the Postgres
/// implementation gets from its single-statement conditional update.
#[derive(Default)]
struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    lookups: AtomicUsize,
}

impl InMemoryUserStore {
    async fn insert(&self, user: User) {
        self.users.lock().await.insert(user.id, user);
    }

    async fn stored_refresh_token(&self, id: Uuid) -> Option<String> {
        self.users
            .lock()
            .await
            .get(&id)
            .and_then(|user| user.refresh_token.clone())
    }

    fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_identifier(&self, identifier: &str) -> StoreResult<Option<User>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| {
                user.username.eq_ignore_ascii_case(identifier)
                    || user.email.eq_ignore_ascii_case(identifier)
            })
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn create(&self, _new_user: NewUser) -> StoreResult<User> {
        unimplemented!("registration is not exercised by these tests")
    }

    async fn swap_refresh_token<'a>(
        &self,
        id: Uuid,
        expected: Option<&'a str>,
        new: Option<&'a str>,
    ) -> StoreResult<SwapOutcome> {
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("user".to_string()))?;

        if user.refresh_token.as_deref() == expected {
            user.refresh_token = new.map(str::to_string);
            Ok(SwapOutcome::Updated)
        } else {
            Ok(SwapOutcome::Conflict)
        }
    }

    async fn store_refresh_token<'a>(&self, id: Uuid, token: Option<&'a str>) -> StoreResult<()> {
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("user".to_string()))?;
        user.refresh_token = token.map(str::to_string);
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("user".to_string()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

fn codec() -> TokenCodec {
    TokenCodec::new(&TokenSettings {
        access_secret: "lifecycle-access-secret".to_string(),
        refresh_secret: "lifecycle-refresh-secret".to_string(),
        access_ttl: Duration::seconds(900),
        refresh_ttl: Duration::days(30),
    })
}

/// Seed one account and return (store, sessions, user_id).
async fn harness(password: &str) -> (Arc<InMemoryUserStore>, SessionManager, Uuid) {
    let crypto = AuthCrypto::new();
    let now = Utc::now();
    let user = User {
        id: Uuid::now_v7(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        full_name: "Alice".to_string(),
        avatar_url: "https://media.example/avatars/alice.png".to_string(),
        cover_image_url: None,
        password_hash: crypto.hash_password(password).unwrap(),
        refresh_token: None,
        created_at: now,
        updated_at: now,
    };
    let user_id = user.id;

    let store = Arc::new(InMemoryUserStore::default());
    store.insert(user).await;

    let sessions = SessionManager::new(store.clone(), codec(), crypto);

    (store, sessions, user_id)
}

#[tokio::test]
async fn login_issues_tokens_for_the_right_subject_and_persists_the_refresh_token() {
    let (store, sessions, user_id) = harness("correctpw").await;

    let outcome = sessions.login("alice", "correctpw").await.unwrap();

    let claims = codec()
        .verify(&outcome.tokens.refresh_token, TokenKind::Refresh)
        .unwrap();
    assert_eq!(claims.sub, user_id);

    let access_claims = sessions.verify_access(&outcome.tokens.access_token).unwrap();
    assert_eq!(access_claims.sub, user_id);

    assert_eq!(
        store.stored_refresh_token(user_id).await.as_deref(),
        Some(outcome.tokens.refresh_token.as_str())
    );
    assert_eq!(outcome.user.username, "alice");
}

#[tokio::test]
async fn login_by_email_works_too() {
    let (_, sessions, _) = harness("correctpw").await;

    assert!(sessions.login("alice@example.com", "correctpw").await.is_ok());
}

#[tokio::test]
async fn failed_login_leaves_the_stored_token_unchanged() {
    let (store, sessions, user_id) = harness("correctpw").await;

    let first = sessions.login("alice", "correctpw").await.unwrap();

    let result = sessions.login("alice", "wrongpw").await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));

    assert_eq!(
        store.stored_refresh_token(user_id).await.as_deref(),
        Some(first.tokens.refresh_token.as_str())
    );
}

#[tokio::test]
async fn refresh_rotates_and_the_consumed_token_is_dead() {
    let (store, sessions, user_id) = harness("correctpw").await;

    let login = sessions.login("alice", "correctpw").await.unwrap();
    let first_refresh = login.tokens.refresh_token;

    let rotated = sessions.refresh(&first_refresh).await.unwrap();
    assert_ne!(rotated.refresh_token, first_refresh);
    assert_eq!(
        store.stored_refresh_token(user_id).await.as_deref(),
        Some(rotated.refresh_token.as_str())
    );

    // Replaying the consumed token must fail even though it is still a
    // well-formed, unexpired credential.
    let replay = sessions.refresh(&first_refresh).await;
    assert!(matches!(replay, Err(AuthError::TokenMismatch)));
}

#[tokio::test]
async fn a_well_formed_token_that_was_never_stored_is_a_mismatch() {
    let (_, sessions, user_id) = harness("correctpw").await;

    sessions.login("alice", "correctpw").await.unwrap();

    // Same subject, same signing key, but not the stored token.
    let forged = codec().mint(user_id, TokenKind::Refresh).unwrap();

    let result = sessions.refresh(&forged).await;
    assert!(matches!(result, Err(AuthError::TokenMismatch)));
}

#[tokio::test]
async fn refresh_after_logout_is_a_mismatch() {
    let (store, sessions, user_id) = harness("correctpw").await;

    let login = sessions.login("alice", "correctpw").await.unwrap();

    sessions.logout(user_id).await.unwrap();
    assert_eq!(store.stored_refresh_token(user_id).await, None);

    let result = sessions.refresh(&login.tokens.refresh_token).await;
    assert!(matches!(result, Err(AuthError::TokenMismatch)));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let (_, sessions, user_id) = harness("correctpw").await;

    sessions.logout(user_id).await.unwrap();
    sessions.logout(user_id).await.unwrap();
}

#[tokio::test]
async fn malformed_and_expired_tokens_fail_before_any_store_lookup() {
    let (store, sessions, _) = harness("correctpw").await;

    let result = sessions.refresh("not-a-real-token").await;
    assert!(matches!(result, Err(AuthError::TokenInvalid)));
    assert_eq!(store.lookup_count(), 0);

    // An access token is not acceptable where a refresh token is expected,
    // and is likewise rejected without touching the store.
    let login = sessions.login("alice", "correctpw").await.unwrap();
    let lookups_after_login = store.lookup_count();

    let result = sessions.refresh(&login.tokens.access_token).await;
    assert!(matches!(result, Err(AuthError::TokenInvalid)));
    assert_eq!(store.lookup_count(), lookups_after_login);
}

#[tokio::test]
async fn concurrent_refreshes_of_one_token_resolve_to_exactly_one_winner() {
    let (store, sessions, user_id) = harness("correctpw").await;
    let sessions = Arc::new(sessions);

    let login = sessions.login("alice", "correctpw").await.unwrap();
    let token = login.tokens.refresh_token;

    let (left, right) = tokio::join!(
        {
            let sessions = sessions.clone();
            let token = token.clone();
            async move { sessions.refresh(&token).await }
        },
        {
            let sessions = sessions.clone();
            let token = token.clone();
            async move { sessions.refresh(&token).await }
        }
    );

    let winners = [&left, &right]
        .iter()
        .filter(|outcome| outcome.is_ok())
        .count();
    assert_eq!(winners, 1, "exactly one rotation may win");

    let loser = if left.is_ok() { right } else { left };
    assert!(matches!(loser, Err(AuthError::TokenMismatch)));

    // The stored token is the winner's new refresh token, never the
    // consumed one.
    let stored = store.stored_refresh_token(user_id).await;
    assert_ne!(stored.as_deref(), Some(token.as_str()));
    assert!(stored.is_some());
}

#[tokio::test]
async fn change_password_keeps_the_session_alive() {
    let (store, sessions, user_id) = harness("old-pw").await;

    let login = sessions.login("alice", "old-pw").await.unwrap();

    sessions
        .change_password(user_id, "old-pw", "new-pw")
        .await
        .unwrap();

    // The rotated credential landscape: old password dead, session alive.
    assert!(matches!(
        sessions.login("alice", "old-pw").await,
        Err(AuthError::InvalidCredentials)
    ));
    sessions.login("alice", "new-pw").await.unwrap();

    // And the pre-change refresh token still matched until that login
    // replaced it; what counts is that change_password itself left it be.
    assert!(store.stored_refresh_token(user_id).await.is_some());
    drop(login);
}

#[tokio::test]
async fn change_password_with_wrong_current_password_is_rejected() {
    let (_, sessions, user_id) = harness("old-pw").await;

    let result = sessions.change_password(user_id, "not-old-pw", "new-pw").await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}
