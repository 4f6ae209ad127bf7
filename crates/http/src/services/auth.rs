//! Authentication service owning the access token lifecycle

use super::user_message;
use crate::client::{ApiClient, ClientError};
use crate::session::Session;
use crate::types::{LoginRequest, RegisterRequest, UserProfile};
use kipesa_core::KeyValueStore;
use kipesa_core::config::DEFAULT_TOKEN_KEY;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// User-facing authentication state
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    /// Profile of the signed-in user
    pub user: Option<UserProfile>,
    /// Message describing the last failed operation
    pub error: Option<String>,
}

/// Authentication service
///
/// Writes the token into the client's [`Session`] and mirrors it into a
/// [`KeyValueStore`] so a later process can [`restore`](Self::restore) it.
pub struct AuthService {
    client: ApiClient,
    store: Arc<dyn KeyValueStore>,
    token_key: String,
    state: Mutex<AuthState>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(client: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client,
            store,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            state: Mutex::new(AuthState::default()),
        }
    }

    /// Persist the token under a different key
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state().user.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Snapshot of the current state
    pub fn snapshot(&self) -> AuthState {
        self.state().clone()
    }

    /// Log in and load the user's profile
    ///
    /// A profile that fails to load is recorded in [`last_error`](Self::last_error)
    /// but does not undo the login.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        self.state().error = None;

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = match self.client.login(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.state().error = Some(user_message(&err, "Login failed"));
                self.forget_token().await;
                return Err(err);
            }
        };

        self.session().set_token(response.access_token.clone());
        if let Err(e) = self
            .store
            .set(&self.token_key, response.access_token.as_str())
            .await
        {
            warn!(error = %e, "Failed to persist access token");
        }
        info!("Logged in");

        if let Err(e) = self.fetch_profile().await {
            warn!(error = %e, "Logged in but failed to load profile");
        }
        Ok(())
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ClientError> {
        self.state().error = None;

        self.client.register(request).await.inspect_err(|err| {
            self.state().error = Some(user_message(err, "Registration failed"));
        })
    }

    /// Load the profile for the current token
    ///
    /// Returns `Ok(None)` without touching the network when no token is set.
    pub async fn fetch_profile(&self) -> Result<Option<UserProfile>, ClientError> {
        if !self.is_authenticated() {
            return Ok(None);
        }

        match self.client.profile().await {
            Ok(profile) => {
                self.state().user = Some(profile.clone());
                Ok(Some(profile))
            }
            Err(err) => {
                let mut state = self.state();
                state.user = None;
                state.error = Some(user_message(&err, "Failed to fetch profile"));
                Err(err)
            }
        }
    }

    /// Drop the user, the token and its persisted copy
    pub async fn logout(&self) {
        self.state().user = None;
        self.forget_token().await;
        info!("Logged out");
    }

    /// Rehydrate from a persisted token
    ///
    /// A token the server rejects as unauthorized (401 or 403) is discarded.
    /// Any other failure, such as a transport error or a 5xx, keeps it.
    pub async fn restore(&self) -> Result<Option<UserProfile>, ClientError> {
        let stored = self.store.get(&self.token_key).await?;
        let Some(token) = stored.filter(|token| !token.trim().is_empty()) else {
            debug!("No persisted access token");
            return Ok(None);
        };

        self.session().set_token(token.trim());
        match self.fetch_profile().await {
            Ok(profile) => Ok(profile),
            Err(err) => {
                if matches!(err.status(), Some(401 | 403)) {
                    info!(status = ?err.status(), "Persisted access token rejected");
                    self.forget_token().await;
                }
                Err(err)
            }
        }
    }

    async fn forget_token(&self) {
        self.session().clear();
        if let Err(e) = self.store.remove(&self.token_key).await {
            warn!(error = %e, "Failed to remove persisted access token");
        }
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
