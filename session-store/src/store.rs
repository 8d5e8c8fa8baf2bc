//! The session store: single source of truth for who is logged in.
//!
//! State lives in a `watch` channel so every subscribed view sees each
//! mutation. The store keeps the in-memory pair and the durable `token`/`user`
//! keys in step, and a generation counter makes sure a slow response from an
//! older operation never overwrites the effect of a newer one.

use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::config::{SessionOptions, Settings};
use crate::dtos::{Credentials, Registration};
use crate::error::{SessionError, StorageError};
use crate::guard::HOME_PATH;
use crate::models::{User, UserPatch};
use crate::services::{
    AuthBackend, AuthClient, DurableStorage, FileStorage, LoggingNavigator, Navigator, TOKEN_KEY,
    USER_KEY,
};
use crate::utils::jwt;

/// Snapshot of the session as views see it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    user: Option<User>,
    token: Option<String>,
    in_flight: u32,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// A session is authenticated only when it holds both a token and a user.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty()) && self.user.is_some()
    }

    /// True while any login/register/verification call is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("is_authenticated", &self.is_authenticated())
            .field("is_loading", &self.is_loading())
            .finish()
    }
}

/// Marks one outstanding network call; the loading flag drops back when the
/// last guard goes away, including when the calling future is cancelled.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<SessionState>) -> Self {
        state.send_modify(|s| s.in_flight += 1);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state
            .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

pub struct SessionStore {
    backend: Arc<dyn AuthBackend>,
    storage: Arc<dyn DurableStorage>,
    navigator: Arc<dyn Navigator>,
    options: SessionOptions,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
    // Serializes "is this response still current?" with the commit it guards.
    commit: Mutex<()>,
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        storage: Arc<dyn DurableStorage>,
        navigator: Arc<dyn Navigator>,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());

        Self {
            backend,
            storage,
            navigator,
            options,
            state,
            generation: AtomicU64::new(0),
            commit: Mutex::new(()),
        }
    }

    /// Production wiring: HTTP backend, file storage, logging navigator.
    pub fn from_settings(settings: &Settings) -> Result<Self, SessionError> {
        let backend = AuthClient::new(settings.auth_service.clone())?;
        let storage = FileStorage::open(&settings.storage.path);

        Ok(Self::new(
            Arc::new(backend),
            Arc::new(storage),
            Arc::new(LoggingNavigator),
            settings.session.clone(),
        ))
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn lock_commit(&self) -> MutexGuard<'_, ()> {
        self.commit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure (message taken from its body), a storage
    /// failure, or `Superseded` when a newer session operation started while
    /// this one was waiting on the backend.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let generation = self.next_generation();
        let _loading = LoadingGuard::begin(&self.state);

        let credentials = Credentials::new(email, password);
        let response = self.backend.login(&credentials).await.map_err(|e| {
            tracing::warn!(email = %email, error = %e, "Login failed");
            e
        })?;

        let _commit = self.lock_commit();
        if !self.is_current(generation) {
            tracing::info!(
                email = %email,
                generation,
                "Discarding login response superseded by a newer operation"
            );
            return Err(SessionError::Superseded);
        }

        self.persist_pair(&response.token, &response.user)?;

        tracing::info!(
            user_id = %response.user.id,
            email = %response.user.email,
            "User logged in successfully"
        );
        self.state.send_modify(|s| {
            s.token = Some(response.token);
            s.user = Some(response.user);
        });

        Ok(())
    }

    /// Create an account. The session is left untouched: the new account
    /// has to verify its email before its first login.
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<serde_json::Value, SessionError> {
        let _loading = LoadingGuard::begin(&self.state);

        match self.backend.register(registration).await {
            Ok(body) => {
                tracing::info!(email = %registration.email, "Registration accepted");
                Ok(body)
            }
            Err(e) => {
                tracing::warn!(email = %registration.email, error = %e, "Registration failed");
                Err(e)
            }
        }
    }

    pub async fn verify_email(&self, token: &str) -> Result<serde_json::Value, SessionError> {
        let _loading = LoadingGuard::begin(&self.state);

        self.backend.verify_email(token).await.map_err(|e| {
            tracing::warn!(error = %e, "Email verification failed");
            e
        })
    }

    pub async fn resend_verification(&self, email: &str) -> Result<serde_json::Value, SessionError> {
        let _loading = LoadingGuard::begin(&self.state);

        self.backend.resend_verification(email).await.map_err(|e| {
            tracing::warn!(email = %email, error = %e, "Resending verification failed");
            e
        })
    }

    /// End the session and hard-navigate to `/`.
    ///
    /// Memory is cleared and navigation happens even when removing the
    /// stored keys fails; that failure is still returned.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.next_generation();

        let cleared = {
            let _commit = self.lock_commit();
            self.state.send_modify(|s| {
                s.token = None;
                s.user = None;
            });
            self.clear_storage()
        };

        match &cleared {
            Ok(()) => tracing::info!("User logged out"),
            Err(e) => tracing::warn!(error = %e, "User logged out but stored session could not be removed"),
        }

        self.navigator.hard_navigate(HOME_PATH);
        cleared.map_err(Into::into)
    }

    /// Replace the user (e.g. from an external redirect callback).
    pub fn set_user(&self, user: User) -> Result<(), SessionError> {
        self.next_generation();
        let _commit = self.lock_commit();

        let encoded = serde_json::to_string(&user).map_err(StorageError::Encode)?;
        self.storage.set(USER_KEY, &encoded)?;

        tracing::debug!(user_id = %user.id, "Session user replaced");
        self.state.send_modify(|s| s.user = Some(user));
        Ok(())
    }

    /// Replace the bearer token. The session only counts as authenticated
    /// once a user is present as well.
    pub fn set_token(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();
        self.next_generation();
        let _commit = self.lock_commit();

        self.storage.set(TOKEN_KEY, &token)?;

        tracing::debug!("Session token replaced");
        self.state.send_modify(|s| s.token = Some(token));
        Ok(())
    }

    /// Merge `patch` into the in-memory user. Does nothing without a user.
    ///
    /// Durable storage is not touched; call [`SessionStore::persist_user`] to
    /// keep the change across reloads.
    pub fn update_user(&self, patch: UserPatch) {
        let applied = self.state.send_if_modified(|s| match s.user.as_mut() {
            Some(user) => {
                user.apply(patch);
                true
            }
            None => false,
        });

        if !applied {
            tracing::debug!("Ignoring user update without a signed-in user");
        }
    }

    /// Write the current in-memory user to durable storage.
    pub fn persist_user(&self) -> Result<(), SessionError> {
        let _commit = self.lock_commit();

        let Some(user) = self.user() else {
            return Ok(());
        };
        let encoded = serde_json::to_string(&user).map_err(StorageError::Encode)?;
        self.storage.set(USER_KEY, &encoded)?;
        Ok(())
    }

    /// Restore the session from durable storage. Run once at startup.
    ///
    /// Partial or unusable records leave the session anonymous and are
    /// removed from storage, except that with `demo_mode` a token without a
    /// user is restored under a placeholder identity.
    pub async fn initialize_auth(&self) -> Result<(), SessionError> {
        let generation = self.next_generation();

        let (stored_token, raw_user) = match self.read_stored() {
            Ok(pair) => pair,
            Err(StorageError::Corrupt(e)) => {
                tracing::warn!(error = %e, "Stored session is corrupt, clearing it");
                self.clear_storage()?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let stored_token = stored_token.filter(|t| !t.is_empty());
        let stored_user = match raw_user {
            None => None,
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored user record is unreadable, clearing stored session");
                    self.clear_storage()?;
                    return Ok(());
                }
            },
        };

        let Some(token) = stored_token else {
            if stored_user.is_some() {
                tracing::warn!("Stored user has no token, discarding it");
                self.storage.remove(USER_KEY)?;
            }
            return Ok(());
        };

        if self.options.reject_expired_tokens && jwt::is_expired(&token, Utc::now()) {
            tracing::info!("Stored token has expired, starting anonymous");
            self.clear_storage()?;
            return Ok(());
        }

        let user = match stored_user {
            Some(user) => user,
            None if self.options.demo_mode => {
                tracing::warn!("Stored token has no user, restoring demo placeholder identity");
                User::demo_placeholder()
            }
            None => {
                tracing::warn!("Stored token has no user, discarding it");
                self.storage.remove(TOKEN_KEY)?;
                return Ok(());
            }
        };

        let mut refreshed = false;
        let user = if self.options.verify_with_backend {
            let _loading = LoadingGuard::begin(&self.state);
            match self.backend.current_user(&token).await {
                Ok(fresh) => {
                    refreshed = true;
                    fresh
                }
                Err(e) if e.is_unauthorized() => {
                    let _commit = self.lock_commit();
                    if !self.is_current(generation) {
                        return Err(SessionError::Superseded);
                    }
                    tracing::info!(error = %e, "Backend rejected stored token, starting anonymous");
                    self.clear_storage()?;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not verify stored token, keeping stored session");
                    user
                }
            }
        } else {
            user
        };

        let _commit = self.lock_commit();
        if !self.is_current(generation) {
            return Err(SessionError::Superseded);
        }
        if refreshed {
            self.persist_pair(&token, &user)?;
        }

        tracing::info!(user_id = %user.id, "Session restored from storage");
        self.state.send_modify(|s| {
            s.token = Some(token);
            s.user = Some(user);
        });

        Ok(())
    }

    fn read_stored(&self) -> Result<(Option<String>, Option<String>), StorageError> {
        Ok((self.storage.get(TOKEN_KEY)?, self.storage.get(USER_KEY)?))
    }

    fn persist_pair(&self, token: &str, user: &User) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(user).map_err(StorageError::Encode)?;

        self.storage.set(TOKEN_KEY, token)?;
        if let Err(e) = self.storage.set(USER_KEY, &encoded) {
            // never leave a token behind without its user
            if let Err(rollback) = self.storage.remove(TOKEN_KEY) {
                tracing::error!(error = %rollback, "Failed to roll back stored token");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn clear_storage(&self) -> Result<(), StorageError> {
        let token_removed = self.storage.remove(TOKEN_KEY);
        let user_removed = self.storage.remove(USER_KEY);
        token_removed.and(user_removed)
    }
}
