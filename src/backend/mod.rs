//! Backend: the hosted auth, table, storage and realtime service.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything non-trivial (credential checks, row-level security,
//! persistence) happens on the remote service. This module only issues
//! calls and interprets responses. Handlers and the session provider talk
//! to it through the `Backend` trait so tests can swap in a scripted mock.

pub mod error;
pub mod realtime;
pub mod rest;
pub mod types;

#[cfg(test)]
pub mod mock;

use std::time::Duration;

use uuid::Uuid;

pub use error::{BackendError, ErrorKind};
pub use rest::RestBackend;
pub use types::{
    Bucket, ContactMessage, NewProfile, OAuthProvider, OAuthRedirect, Profile, ProfileUpdate, Session,
    SessionTokens, SignUpRequest, SignUpResponse,
};

/// Table holding one profile row per identity.
pub const PROFILES_TABLE: &str = "profiles";

/// Append-only table for contact form submissions.
pub const CONTACT_TABLE: &str = "contact_messages";

/// Request surface consumed from the hosted service.
///
/// Table operations take the caller's session so the service can apply
/// row-level security; `None` means the request runs with the public key.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Validate (and refresh if needed) a stored session. No stored session
    /// means no network call and `Ok(None)`.
    async fn get_session(&self, stored: Option<&SessionTokens>) -> Result<Option<Session>, BackendError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, BackendError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Option<Session>, BackendError>;

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError>;

    /// Re-deliver the sign-up confirmation email.
    async fn resend_confirmation(&self, email: &str) -> Result<(), BackendError>;

    /// Start a redirect-based OAuth flow. Fails when the provider is not enabled.
    async fn oauth_authorize(&self, provider: OAuthProvider, redirect_to: &str)
    -> Result<OAuthRedirect, BackendError>;

    /// Complete an OAuth flow with the code from the callback.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, BackendError>;

    async fn select_profile(&self, session: &Session, id: Uuid) -> Result<Option<Profile>, BackendError>;

    async fn find_profile_by_email(
        &self,
        session: Option<&Session>,
        email: &str,
    ) -> Result<Option<Profile>, BackendError>;

    async fn insert_profile(&self, session: &Session, profile: &NewProfile) -> Result<(), BackendError>;

    /// Update the profile row keyed by `id`. A row the caller may not touch
    /// surfaces as a `RowLevelSecurity` error.
    async fn update_profile(&self, session: &Session, id: Uuid, update: &ProfileUpdate) -> Result<(), BackendError>;

    async fn insert_contact_message(
        &self,
        session: Option<&Session>,
        message: &ContactMessage,
    ) -> Result<(), BackendError>;

    /// Cheap reachability check against a table.
    async fn probe_table(&self, session: Option<&Session>, table: &str) -> Result<(), BackendError>;

    async fn list_buckets(&self, session: Option<&Session>) -> Result<Vec<Bucket>, BackendError>;

    /// Join a realtime channel; `true` when the join is acknowledged within `wait`.
    async fn probe_realtime(&self, channel: &str, wait: Duration) -> Result<bool, BackendError>;
}
