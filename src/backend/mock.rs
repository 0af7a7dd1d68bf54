//! Scripted in-memory backend for tests.
//!
//! Each operation pops a queued result (falling back to a benign default)
//! and records its name so tests can assert call sequences. Like the real
//! service, `get_session` without stored tokens is `Ok(None)` and leaves
//! its queue alone.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use uuid::Uuid;

use super::types::{
    Bucket, ContactMessage, Identity, NewProfile, OAuthProvider, OAuthRedirect, Profile, ProfileUpdate, Session,
    SessionTokens, SignUpRequest, SignUpResponse,
};
use super::{Backend, BackendError};

type Queue<T> = Mutex<VecDeque<Result<T, BackendError>>>;

#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<&'static str>>,
    get_session: Queue<Option<Session>>,
    sign_up: Queue<SignUpResponse>,
    sign_in: Queue<Option<Session>>,
    resend: Queue<()>,
    oauth: Queue<OAuthRedirect>,
    exchange: Queue<Session>,
    insert_profile: Queue<()>,
    update_profile: Queue<()>,
    contact: Queue<()>,
    probe_table: Queue<()>,
    buckets: Queue<Vec<Bucket>>,
    realtime: Queue<bool>,
    /// Rows visible to `select_profile` / `find_profile_by_email`.
    pub profiles: Mutex<HashMap<Uuid, Profile>>,
    pub contact_rows: Mutex<Vec<ContactMessage>>,
    pub profile_updates: Mutex<Vec<(Uuid, ProfileUpdate)>>,
    pub inserted_profiles: Mutex<Vec<NewProfile>>,
    /// Artificial latency for `get_session`, to observe the loading state.
    pub get_session_delay: Mutex<Option<Duration>>,
    /// Artificial latency for the credential calls, to observe a form mid-flight.
    pub sign_in_delay: Mutex<Option<Duration>>,
    pub sign_up_delay: Mutex<Option<Duration>>,
}

async fn pause(delay: &Mutex<Option<Duration>>) {
    let delay = *delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

fn push<T>(queue: &Queue<T>, result: Result<T, BackendError>) {
    queue.lock().unwrap().push_back(result);
}

fn pop<T>(queue: &Queue<T>, default: impl FnOnce() -> Result<T, BackendError>) -> Result<T, BackendError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(default)
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == name)
            .count()
    }

    pub fn push_get_session(&self, result: Result<Option<Session>, BackendError>) {
        push(&self.get_session, result);
    }

    pub fn push_sign_up(&self, result: Result<SignUpResponse, BackendError>) {
        push(&self.sign_up, result);
    }

    pub fn push_sign_in(&self, result: Result<Option<Session>, BackendError>) {
        push(&self.sign_in, result);
    }

    pub fn push_resend(&self, result: Result<(), BackendError>) {
        push(&self.resend, result);
    }

    pub fn push_oauth(&self, result: Result<OAuthRedirect, BackendError>) {
        push(&self.oauth, result);
    }

    pub fn push_exchange(&self, result: Result<Session, BackendError>) {
        push(&self.exchange, result);
    }

    pub fn push_insert_profile(&self, result: Result<(), BackendError>) {
        push(&self.insert_profile, result);
    }

    pub fn push_update_profile(&self, result: Result<(), BackendError>) {
        push(&self.update_profile, result);
    }

    pub fn push_contact(&self, result: Result<(), BackendError>) {
        push(&self.contact, result);
    }

    pub fn push_probe_table(&self, result: Result<(), BackendError>) {
        push(&self.probe_table, result);
    }

    pub fn push_buckets(&self, result: Result<Vec<Bucket>, BackendError>) {
        push(&self.buckets, result);
    }

    pub fn push_realtime(&self, result: Result<bool, BackendError>) {
        push(&self.realtime, result);
    }

    pub fn put_profile(&self, profile: Profile) {
        self.profiles.lock().unwrap().insert(profile.id, profile);
    }
}

#[async_trait::async_trait]
impl Backend for MockBackend {
    async fn get_session(&self, stored: Option<&SessionTokens>) -> Result<Option<Session>, BackendError> {
        self.record("get_session");
        pause(&self.get_session_delay).await;
        if stored.is_none() {
            return Ok(None);
        }
        pop(&self.get_session, || Ok(None))
    }

    async fn sign_up(&self, _request: &SignUpRequest) -> Result<SignUpResponse, BackendError> {
        self.record("sign_up");
        pause(&self.sign_up_delay).await;
        pop(&self.sign_up, || Ok(SignUpResponse::default()))
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Option<Session>, BackendError> {
        self.record("sign_in_with_password");
        pause(&self.sign_in_delay).await;
        pop(&self.sign_in, || Ok(None))
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), BackendError> {
        self.record("sign_out");
        Ok(())
    }

    async fn resend_confirmation(&self, _email: &str) -> Result<(), BackendError> {
        self.record("resend_confirmation");
        pop(&self.resend, || Ok(()))
    }

    async fn oauth_authorize(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthRedirect, BackendError> {
        self.record("oauth_authorize");
        pop(&self.oauth, || {
            Ok(OAuthRedirect {
                url: format!("https://auth.test/authorize?provider={}&redirect_to={redirect_to}", provider.as_str()),
                code_verifier: "verifier".into(),
            })
        })
    }

    async fn exchange_code(&self, _code: &str, _code_verifier: &str) -> Result<Session, BackendError> {
        self.record("exchange_code");
        pop(&self.exchange, || Err(BackendError::api(400, None, "invalid flow state")))
    }

    async fn select_profile(&self, _session: &Session, id: Uuid) -> Result<Option<Profile>, BackendError> {
        self.record("select_profile");
        Ok(self.profiles.lock().unwrap().get(&id).cloned())
    }

    async fn find_profile_by_email(
        &self,
        _session: Option<&Session>,
        email: &str,
    ) -> Result<Option<Profile>, BackendError> {
        self.record("find_profile_by_email");
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .find(|p| p.email.as_deref() == Some(email))
            .cloned())
    }

    async fn insert_profile(&self, _session: &Session, profile: &NewProfile) -> Result<(), BackendError> {
        self.record("insert_profile");
        let result = pop(&self.insert_profile, || Ok(()));
        if result.is_ok() {
            self.inserted_profiles.lock().unwrap().push(profile.clone());
            self.put_profile(Profile {
                id: profile.id,
                full_name: Some(profile.full_name.clone()),
                email: Some(profile.email.clone()),
                ..Profile::default()
            });
        }
        result
    }

    async fn update_profile(&self, _session: &Session, id: Uuid, update: &ProfileUpdate) -> Result<(), BackendError> {
        self.record("update_profile");
        let result = pop(&self.update_profile, || Ok(()));
        if result.is_ok() {
            self.profile_updates.lock().unwrap().push((id, update.clone()));
            let mut profiles = self.profiles.lock().unwrap();
            let row = profiles.entry(id).or_insert_with(|| Profile { id, ..Profile::default() });
            row.full_name = Some(update.full_name.clone());
            row.title = Some(update.title.clone());
            row.bio = Some(update.bio.clone());
            row.website = Some(update.website.clone());
            row.updated_at = Some(update.updated_at.clone());
        }
        result
    }

    async fn insert_contact_message(
        &self,
        _session: Option<&Session>,
        message: &ContactMessage,
    ) -> Result<(), BackendError> {
        self.record("insert_contact_message");
        let result = pop(&self.contact, || Ok(()));
        if result.is_ok() {
            self.contact_rows.lock().unwrap().push(message.clone());
        }
        result
    }

    async fn probe_table(&self, _session: Option<&Session>, _table: &str) -> Result<(), BackendError> {
        self.record("probe_table");
        pop(&self.probe_table, || Ok(()))
    }

    async fn list_buckets(&self, _session: Option<&Session>) -> Result<Vec<Bucket>, BackendError> {
        self.record("list_buckets");
        pop(&self.buckets, || Ok(Vec::new()))
    }

    async fn probe_realtime(&self, _channel: &str, _wait: Duration) -> Result<bool, BackendError> {
        self.record("probe_realtime");
        pop(&self.realtime, || Ok(true))
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

/// Identity with a fresh id and the given email.
#[must_use]
pub fn identity(email: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: Some(email.to_owned()),
        created_at: Some("2024-05-01T10:00:00Z".into()),
        identities: Some(vec![super::types::LinkedIdentity { provider: "email".into() }]),
        user_metadata: serde_json::json!({}),
    }
}

/// Live session for a fresh identity.
#[must_use]
pub fn session(email: &str) -> Session {
    Session {
        access_token: format!("access-{email}"),
        refresh_token: format!("refresh-{email}"),
        expires_at: Some(i64::MAX / 2),
        user: identity(email),
    }
}

#[must_use]
pub fn email_not_confirmed() -> BackendError {
    BackendError::api(400, Some("email_not_confirmed"), "Email not confirmed")
}

#[must_use]
pub fn invalid_credentials() -> BackendError {
    BackendError::api(400, Some("invalid_credentials"), "Invalid login credentials")
}
