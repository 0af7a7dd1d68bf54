//! Session provider: per-visitor authentication state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every visitor owns one `SessionProvider`. It is the only writer of the
//! identity/session/profile triple; pages and the route gate read it, and
//! forms change it only through the operations below.
//!
//! DESIGN
//! ======
//! State lives in a `watch` channel so readers always see the latest value
//! and can await the end of the initial restore. `init` is guarded by a
//! `OnceCell`, so concurrent first requests issue a single `get_session`.
//! Every mutating operation awaits `init` first; a restore can never land
//! on top of a newer sign-in.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{OnceCell, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::types::unix_now;
use crate::backend::{Backend, BackendError, ErrorKind, NewProfile, Profile, Session, SessionTokens, SignUpRequest, SignUpResponse};

/// Address stored on profiles created without user input.
pub const PLACEHOLDER_ADDRESS: &str = "123 Test Street";

/// Authentication state as seen by the rest of the application.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// The initial session restore has not finished.
    Loading,
    Anonymous,
    Authenticated {
        session: Session,
        /// `None` when no profile row exists or it could not be loaded.
        profile: Option<Profile>,
    },
}

impl AuthState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }
}

pub struct SessionProvider {
    backend: Arc<dyn Backend>,
    /// Tokens handed in at construction, consumed by the first `init`.
    stored: Mutex<Option<SessionTokens>>,
    state: watch::Sender<AuthState>,
    init: OnceCell<()>,
}

impl SessionProvider {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, stored: Option<SessionTokens>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self { backend, stored: Mutex::new(stored), state, init: OnceCell::new() }
    }

    /// Provider with nothing to restore: settled as `Anonymous` from the
    /// start, so `init` never calls the backend.
    #[must_use]
    pub fn anonymous(backend: Arc<dyn Backend>) -> Self {
        let (state, _) = watch::channel(AuthState::Anonymous);
        Self { backend, stored: Mutex::new(None), state, init: OnceCell::new_with(Some(())) }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Restore the stored session. Runs at most once per provider; later
    /// callers wait for the first run to finish.
    pub async fn init(&self) {
        self.init.get_or_init(|| self.restore()).await;
    }

    /// Run `init` in the background so a page can render the loading view
    /// while the restore is in flight.
    pub fn spawn_init(self: &Arc<Self>) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        tokio::spawn(async move { provider.init().await })
    }

    /// Wait up to `grace` for the restore to finish. Returns whatever the
    /// state is at that point, which may still be `Loading`.
    pub async fn wait_ready(&self, grace: Duration) -> AuthState {
        let mut rx = self.subscribe();
        if let Ok(Ok(state)) = tokio::time::timeout(grace, rx.wait_for(|s| !s.is_loading())).await {
            return (*state).clone();
        }
        self.state()
    }

    async fn restore(&self) {
        let stored = self
            .stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let next = match self.backend.get_session(stored.as_ref()).await {
            Ok(Some(session)) => {
                let profile = self.load_profile(&session).await;
                tracing::info!(user_id = %session.user.id, "session restored");
                AuthState::Authenticated { session, profile }
            }
            Ok(None) => AuthState::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "session restore failed; continuing anonymous");
                AuthState::Anonymous
            }
        };
        self.state.send_replace(next);
    }

    // =========================================================================
    // AUTH OPERATIONS
    // =========================================================================

    /// Sign in with email and password. On error the state is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; classify it with [`BackendError::kind`].
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Session>, BackendError> {
        self.init().await;
        let session = self.backend.sign_in_with_password(email, password).await?;
        if let Some(session) = &session {
            self.establish(session.clone()).await;
        }
        Ok(session)
    }

    /// Create an identity. Never changes state: the caller follows up with
    /// `sign_in`, since confirmation may be pending.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, BackendError> {
        self.init().await;
        self.backend.sign_up(request).await
    }

    /// Destroy the session. Local state always becomes `Anonymous`; a failed
    /// remote sign-out is only logged.
    pub async fn sign_out(&self) {
        self.init().await;
        let previous = self.state.send_replace(AuthState::Anonymous);
        if let AuthState::Authenticated { session, .. } = previous {
            if let Err(e) = self.backend.sign_out(&session).await {
                tracing::warn!(user_id = %session.user.id, error = %e, "remote sign-out failed");
            }
            tracing::info!(user_id = %session.user.id, "signed out");
        }
    }

    /// # Errors
    ///
    /// Returns the backend failure.
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), BackendError> {
        self.backend.resend_confirmation(email).await
    }

    /// Finish an OAuth flow with the callback code and the PKCE verifier
    /// issued when the flow started.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; state is unchanged.
    pub async fn complete_oauth(&self, code: &str, code_verifier: &str) -> Result<Session, BackendError> {
        self.init().await;
        let session = self.backend.exchange_code(code, code_verifier).await?;
        self.establish(session.clone()).await;
        Ok(session)
    }

    /// Current session, refreshed first if its access token has expired.
    /// An unrecoverable session signs the visitor out locally.
    pub async fn active_session(&self) -> Option<Session> {
        self.init().await;
        let session = self.session()?;
        if !session.tokens().is_expired(unix_now()) {
            return Some(session);
        }

        match self.backend.get_session(Some(&session.tokens())).await {
            Ok(Some(fresh)) => {
                self.state.send_modify(|state| {
                    if let AuthState::Authenticated { session, .. } = state {
                        *session = fresh.clone();
                    }
                });
                Some(fresh)
            }
            Ok(None) => {
                self.state.send_replace(AuthState::Anonymous);
                None
            }
            Err(e) => {
                tracing::warn!(user_id = %session.user.id, error = %e, "session refresh failed");
                self.state.send_replace(AuthState::Anonymous);
                None
            }
        }
    }

    /// Refresh token to persist in the visitor's cookie, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        if let Some(session) = self.state.borrow().session() {
            return Some(session.refresh_token.clone());
        }
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
    }

    // =========================================================================
    // PROFILE
    // =========================================================================

    /// Re-fetch the profile row and replace the profile slice of the state.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; state is unchanged.
    pub async fn refresh_profile(&self) -> Result<(), BackendError> {
        let Some(session) = self.active_session().await else {
            return Ok(());
        };
        let profile = self
            .backend
            .select_profile(&session, session.user.id)
            .await?;
        self.replace_profile(session.user.id, profile);
        Ok(())
    }

    /// Replace the profile slice when `user_id` is still the signed-in identity.
    pub fn replace_profile(&self, user_id: Uuid, profile: Option<Profile>) {
        self.state.send_if_modified(|state| match state {
            AuthState::Authenticated { session, profile: slot } if session.user.id == user_id => {
                *slot = profile;
                true
            }
            _ => false,
        });
    }

    /// Fetch the profile for `session`, inserting a minimal row when the
    /// backend trigger did not create one. A duplicate-key failure on that
    /// insert means another writer got there first and is not an error.
    ///
    /// # Errors
    ///
    /// Returns the backend failure from the select or a non-duplicate insert.
    pub async fn ensure_profile(&self, session: &Session) -> Result<Option<Profile>, BackendError> {
        let id = session.user.id;
        if let Some(profile) = self.backend.select_profile(session, id).await? {
            return Ok(Some(profile));
        }

        let row = NewProfile {
            id,
            full_name: session.user.fallback_name(),
            email: session.user.email.clone().unwrap_or_default(),
            address: PLACEHOLDER_ADDRESS.to_owned(),
        };
        match self.backend.insert_profile(session, &row).await {
            Ok(()) => tracing::info!(user_id = %id, "created missing profile"),
            Err(e) if e.kind() == ErrorKind::DuplicateKey => {
                tracing::debug!(user_id = %id, "profile already exists");
            }
            Err(e) => return Err(e),
        }
        self.backend.select_profile(session, id).await
    }

    async fn load_profile(&self, session: &Session) -> Option<Profile> {
        match self.ensure_profile(session).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(user_id = %session.user.id, error = %e, "profile load failed");
                None
            }
        }
    }

    async fn establish(&self, session: Session) {
        let profile = self.load_profile(&session).await;
        tracing::info!(user_id = %session.user.id, "signed in");
        self.state
            .send_replace(AuthState::Authenticated { session, profile });
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
