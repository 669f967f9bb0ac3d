//! # Auth Session
//!
//! Owns the signed-in identity. The token and the cached profile live in the store under
//! `token` and `user`; the identity itself is published on a `watch` channel so the
//! registry can swap its storage partition whenever it changes.

pub mod error;

pub use error::*;

use crate::model::{Credentials, UserId, UserProfile};
use crate::storage::{JsonStore, KeyValueStore, TOKEN_KEY, USER_KEY};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Authentication endpoints of the API.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError>;

    /// `GET /auth/me`, authorized by the stored bearer token.
    async fn me(&self) -> Result<UserProfile, AuthError>;
}

/// Body of a successful login: the token next to the profile fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// The current session and its persisted token/profile.
#[derive(Clone)]
pub struct AuthSession {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn KeyValueStore>,
    identity: Arc<watch::Sender<Option<UserId>>>,
}

impl AuthSession {
    /// Starts signed out; call [`restore`](Self::restore) to pick up a stored token.
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn KeyValueStore>) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            api,
            store,
            identity: Arc::new(identity),
        }
    }

    #[instrument(skip(self))]
    pub async fn login(&self, credentials: Credentials) -> Result<UserProfile, AuthError> {
        let LoginResponse { token, profile } = self.api.login(&credentials).await?;
        self.store.set(TOKEN_KEY, &token)?;
        self.store.save_json(USER_KEY, &profile)?;
        info!(user = %profile.id, username = %profile.username, "Signed in");
        self.publish(Some(profile.id.clone()));
        Ok(profile)
    }

    /// Clears token and profile. The identity is withdrawn even if the store fails.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), AuthError> {
        let token = self.store.remove(TOKEN_KEY);
        let user = self.store.remove(USER_KEY);
        self.publish(None);
        info!("Signed out");
        token?;
        user?;
        Ok(())
    }

    /// Re-establishes a session from a stored token.
    ///
    /// The token is verified with `/auth/me`. A refusal clears token and profile. When the
    /// API cannot be reached the cached profile is trusted, so the user stays signed in
    /// while offline.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<UserProfile>, AuthError> {
        if self.store.get(TOKEN_KEY)?.is_none() {
            return Ok(None);
        }
        match self.api.me().await {
            Ok(profile) => {
                self.store.save_json(USER_KEY, &profile)?;
                info!(user = %profile.id, "Session restored");
                self.publish(Some(profile.id.clone()));
                Ok(Some(profile))
            }
            Err(e @ (AuthError::Rejected { .. } | AuthError::Decode(_) | AuthError::NotAuthenticated)) => {
                warn!(error = %e, "Stored token refused, clearing session");
                self.logout()?;
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Could not verify stored token, using cached profile");
                let cached = self.profile()?;
                self.publish(cached.as_ref().map(|p| p.id.clone()));
                Ok(cached)
            }
        }
    }

    /// The cached profile, if any. An unreadable blob counts as absent.
    pub fn profile(&self) -> Result<Option<UserProfile>, AuthError> {
        match self.store.load_json(USER_KEY) {
            Ok(profile) => Ok(profile),
            Err(crate::storage::StorageError::Serialization(e)) => {
                warn!(error = %e, "Cached profile unreadable");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the cached profile. Requires a signed-in session.
    pub fn update_profile(&self, profile: UserProfile) -> Result<(), AuthError> {
        if self.current_identity().is_none() {
            return Err(AuthError::NotAuthenticated);
        }
        self.store.save_json(USER_KEY, &profile)?;
        self.publish(Some(profile.id));
        Ok(())
    }

    pub fn current_identity(&self) -> Option<UserId> {
        self.identity.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.borrow().is_some()
    }

    /// Receiver of identity changes; the current value is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.identity.subscribe()
    }

    // Only a real change notifies subscribers; re-publishing the same identity would make
    // the registry reload its partition for nothing.
    fn publish(&self, identity: Option<UserId>) {
        self.identity.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAuth;
    use crate::storage::MemoryStore;

    fn session(store: &Arc<MemoryStore>) -> AuthSession {
        let api = MockAuth::new().with_user("emilys", "emilyspass", UserProfile::new(1u64, "emilys"));
        AuthSession::new(Arc::new(api), store.clone())
    }

    #[tokio::test]
    async fn test_login_persists_and_publishes() {
        let store = Arc::new(MemoryStore::new());
        let auth = session(&store);
        let mut changes = auth.subscribe();

        let profile = auth.login(Credentials::new("emilys", "emilyspass")).await.unwrap();

        assert_eq!(profile.id, UserId::from("1"));
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("token-1"));
        assert!(store.get(USER_KEY).unwrap().is_some());
        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow(), Some(UserId::from("1")));
    }

    #[tokio::test]
    async fn test_bad_credentials_leave_session_empty() {
        let store = Arc::new(MemoryStore::new());
        let auth = session(&store);

        let err = auth.login(Credentials::new("emilys", "wrong")).await.unwrap_err();

        assert!(matches!(err, AuthError::Rejected { status: 400, .. }));
        assert!(auth.current_identity().is_none());
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_keys() {
        let store = Arc::new(MemoryStore::new());
        let auth = session(&store);
        auth.login(Credentials::new("emilys", "emilyspass")).await.unwrap();

        auth.logout().unwrap();

        assert!(auth.current_identity().is_none());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_restore_with_refused_token_clears_session() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "expired").unwrap();
        let auth = session(&store);

        assert!(auth.restore().await.unwrap().is_none());
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_offline_trusts_cached_profile() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "token-1").unwrap();
        store.save_json(USER_KEY, &UserProfile::new(1u64, "emilys")).unwrap();
        let auth = AuthSession::new(Arc::new(MockAuth::offline()), store.clone());

        let restored = auth.restore().await.unwrap();

        assert_eq!(restored.map(|p| p.username), Some("emilys".to_string()));
        assert_eq!(auth.current_identity(), Some(UserId::from("1")));
        assert!(store.get(TOKEN_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_profile_requires_session() {
        let store = Arc::new(MemoryStore::new());
        let auth = session(&store);
        let err = auth.update_profile(UserProfile::new(1u64, "x")).unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
    }

    #[test]
    fn test_login_response_accepts_access_token() {
        let json = r#"{"id":1,"username":"emilys","accessToken":"abc","refreshToken":"r"}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.token, "abc");
        assert_eq!(response.profile.username, "emilys");
    }
}
