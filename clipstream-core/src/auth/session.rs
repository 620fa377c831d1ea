//! Login, logout, and refresh orchestration.
//!
//! Each account is in one of two states: no session (`refresh_token` NULL)
//! or active (`refresh_token` set). Expiry is never persisted; it is read
//! from the token's own claim at refresh time. The rotation invariant
//! (a refresh token, once consumed, can never be consumed again) rests
//! entirely on the store's compare-and-set.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::crypto::{AuthCrypto, CryptoError};
use crate::auth::tokens::{Claims, TokenCodec, TokenError, TokenKind};
use crate::error::StoreError;
use crate::users::store::{SwapOutcome, UserStore};
use crate::users::UserProfile;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("user does not exist")]
    UserNotFound,

    #[error("invalid user credentials")]
    InvalidCredentials,

    #[error("malformed or expired token")]
    TokenInvalid,

    #[error("refresh token has been used or superseded")]
    TokenMismatch,

    #[error("credential store failure")]
    Store(#[from] StoreError),

    #[error("internal auth failure: {0}")]
    Internal(String),
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

/// Orchestrates credential verification and token lifecycle against the
/// credential store and the token codec.
pub struct SessionManager {
    store: Arc<dyn UserStore>,
    codec: TokenCodec,
    crypto: AuthCrypto,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn UserStore>, codec: TokenCodec, crypto: AuthCrypto) -> Self {
        Self {
            store,
            codec,
            crypto,
        }
    }

    /// Verify an access token and return its claims. Pure: signature and
    /// expiry only, no store access.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.codec
            .verify(token, TokenKind::Access)
            .map_err(|_| AuthError::TokenInvalid)
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.codec.access_ttl().num_seconds()
    }

    /// Verify credentials and open a session.
    ///
    /// An unknown identifier answers differently from a wrong password,
    /// mirroring the public API this service has always had.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = self
            .store
            .find_by_identifier(identifier)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.crypto.verify_password(password, &user.password_hash)? {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.mint_pair(user.id)?;

        // A fresh login supersedes whatever session was active; the store
        // write is a single atomic overwrite, so the last login wins.
        self.store
            .store_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;

        debug!(user_id = %user.id, "session opened");

        Ok(LoginOutcome {
            user: UserProfile::from(&user),
            tokens,
        })
    }

    /// Close the account's session. Idempotent: clearing an already-absent
    /// session is not an error.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.store.store_refresh_token(user_id, None).await?;
        debug!(user_id = %user_id, "session closed");
        Ok(())
    }

    /// Exchange a refresh token for a new pair, rotating the stored token.
    ///
    /// Ordering matters: signature/expiry are checked before any store
    /// lookup, and the rotation itself is a compare-and-set keyed on the
    /// presented token. Of two concurrent calls presenting the same token,
    /// exactly one wins; the loser observes a mismatch.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .verify(presented, TokenKind::Refresh)
            .map_err(|err| match err {
                TokenError::Expired | TokenError::Invalid => AuthError::TokenInvalid,
                TokenError::Signing => AuthError::Internal(err.to_string()),
            })?;

        let user = self
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.refresh_token.as_deref() != Some(presented) {
            debug!(user_id = %user.id, "refresh rejected: token does not match stored session");
            return Err(AuthError::TokenMismatch);
        }

        let tokens = self.mint_pair(user.id)?;

        match self
            .store
            .swap_refresh_token(user.id, Some(presented), Some(&tokens.refresh_token))
            .await?
        {
            SwapOutcome::Updated => {
                debug!(user_id = %user.id, "refresh token rotated");
                Ok(tokens)
            }
            SwapOutcome::Conflict => {
                // Someone else rotated between our read and our write.
                // Surfacing a mismatch (not silently overwriting) is what
                // keeps a consumed token single-use.
                warn!(user_id = %user.id, "refresh lost rotation race");
                Err(AuthError::TokenMismatch)
            }
        }
    }

    /// Replace the account password after verifying the current one.
    ///
    /// The stored refresh token is deliberately left untouched: an existing
    /// session survives a password change.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::Validation("new password is required".to_string()));
        }

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .crypto
            .verify_password(old_password, &user.password_hash)?
        {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = self.crypto.hash_password(new_password)?;
        self.store.update_password(user.id, &new_hash).await?;

        Ok(())
    }

    fn mint_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let access_token = self
            .codec
            .mint(user_id, TokenKind::Access)
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        let refresh_token = self
            .codec
            .mint(user_id, TokenKind::Refresh)
            .map_err(|err| AuthError::Internal(err.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::TokenSettings;
    use crate::users::store::MockUserStore;
    use crate::users::User;
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;

    fn codec() -> TokenCodec {
        TokenCodec::new(&TokenSettings {
            access_secret: "unit-access-secret".to_string(),
            refresh_secret: "unit-refresh-secret".to_string(),
            access_ttl: Duration::seconds(900),
            refresh_ttl: Duration::days(30),
        })
    }

    fn user_with(password_hash: String, refresh_token: Option<String>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            avatar_url: "https://media.example/avatars/alice.png".to_string(),
            cover_image_url: None,
            password_hash,
            refresh_token,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn login_with_unknown_identifier_is_not_found() {
        let mut store = MockUserStore::new();
        store
            .expect_find_by_identifier()
            .with(eq("ghost"))
            .returning(|_| Ok(None));

        let sessions = SessionManager::new(Arc::new(store), codec(), AuthCrypto::new());
        let result = sessions.login("ghost", "whatever").await;

        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn login_with_wrong_password_does_not_touch_the_store() {
        let crypto = AuthCrypto::new();
        let hash = crypto.hash_password("right").unwrap();
        let user = user_with(hash, None);

        let mut store = MockUserStore::new();
        store
            .expect_find_by_identifier()
            .returning(move |_| Ok(Some(user.clone())));
        // No expectation on store_refresh_token: a call would panic.

        let sessions = SessionManager::new(Arc::new(store), codec(), crypto);
        let result = sessions.login("alice", "wrong").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn refresh_rejects_before_lookup_when_token_is_garbage() {
        // No expectations at all: any store access panics the test.
        let store = MockUserStore::new();
        let sessions = SessionManager::new(Arc::new(store), codec(), AuthCrypto::new());

        let result = sessions.refresh("not-a-real-token").await;

        assert!(matches!(result, Err(AuthError::TokenInvalid)));
    }

    #[tokio::test]
    async fn refresh_conflict_surfaces_as_mismatch() {
        let crypto = AuthCrypto::new();
        let codec = codec();
        let user = user_with(crypto.hash_password("pw").unwrap(), None);
        let user_id = user.id;

        let presented = codec.mint(user_id, TokenKind::Refresh).unwrap();
        let stored = presented.clone();

        let mut store = MockUserStore::new();
        store.expect_find_by_id().with(eq(user_id)).returning({
            let presented = presented.clone();
            move |_| {
                let mut u = user.clone();
                u.refresh_token = Some(presented.clone());
                Ok(Some(u))
            }
        });
        store
            .expect_swap_refresh_token()
            .withf(move |id, expected, _new| *id == user_id && expected == &Some(stored.as_str()))
            .returning(|_, _, _| Ok(SwapOutcome::Conflict));

        let sessions = SessionManager::new(Arc::new(store), codec, crypto);
        let result = sessions.refresh(&presented).await;

        assert!(matches!(result, Err(AuthError::TokenMismatch)));
    }

    #[tokio::test]
    async fn change_password_leaves_refresh_token_alone() {
        let crypto = AuthCrypto::new();
        let user = user_with(
            crypto.hash_password("old-pw").unwrap(),
            Some("an-active-session".to_string()),
        );
        let user_id = user.id;

        let mut store = MockUserStore::new();
        store
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| Ok(Some(user.clone())));
        store
            .expect_update_password()
            .withf(move |id, _| *id == user_id)
            .returning(|_, _| Ok(()));
        // No expectation on swap/store of the refresh token.

        let sessions = SessionManager::new(Arc::new(store), codec(), crypto);
        sessions
            .change_password(user_id, "old-pw", "new-pw")
            .await
            .unwrap();
    }
}
