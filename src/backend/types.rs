//! Backend wire types: identities, sessions, profiles, and table rows.
//!
//! These mirror what the hosted auth and table endpoints return. Unknown
//! fields are ignored so new service versions do not break decoding.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// Seconds before the advertised expiry at which a session counts as expired.
pub const EXPIRY_MARGIN_SECS: i64 = 30;

// =============================================================================
// IDENTITY
// =============================================================================

/// A login method linked to an identity (email, google, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedIdentity {
    #[serde(default)]
    pub provider: String,
}

/// An authenticated principal as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Linked login methods. An empty list on a sign-up response means the
    /// email was already registered.
    #[serde(default)]
    pub identities: Option<Vec<LinkedIdentity>>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl Identity {
    /// Display name chosen at sign-up, if any.
    #[must_use]
    pub fn metadata_name(&self) -> Option<&str> {
        self.user_metadata
            .get("full_name")
            .and_then(serde_json::Value::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    /// Local part of the email address (`jane` for `jane@example.com`).
    #[must_use]
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
    }

    /// Name used when a profile row has to be created without user input.
    #[must_use]
    pub fn fallback_name(&self) -> String {
        self.metadata_name()
            .or_else(|| self.email_local_part())
            .unwrap_or("User")
            .to_owned()
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// The token half of a session: enough to restore or refresh it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds. `None` when the service did not say.
    pub expires_at: Option<i64>,
}

impl SessionTokens {
    /// Tokens known only by their refresh half, e.g. restored from a cookie.
    #[must_use]
    pub fn from_refresh_token(refresh_token: impl Into<String>) -> Self {
        Self { access_token: String::new(), refresh_token: refresh_token.into(), expires_at: None }
    }

    /// Whether the access token must be refreshed before use at `now` (unix seconds).
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        if self.access_token.is_empty() {
            return true;
        }
        self.expires_at
            .is_some_and(|at| at - EXPIRY_MARGIN_SECS <= now)
    }
}

/// A live authentication grant for exactly one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Identity,
}

impl Session {
    #[must_use]
    pub fn tokens(&self) -> SessionTokens {
        SessionTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
        }
    }
}

// =============================================================================
// SIGN-UP / OAUTH
// =============================================================================

/// Parameters for creating an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    /// Where the confirmation email link should land.
    pub redirect_to: String,
}

/// Result of a sign-up call. A session is only present when the service
/// does not require email confirmation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignUpResponse {
    pub identity: Option<Identity>,
    pub session: Option<Session>,
}

impl SignUpResponse {
    /// The service reports zero linked identities for an email that is
    /// already registered.
    #[must_use]
    pub fn already_registered(&self) -> bool {
        self.identity
            .as_ref()
            .and_then(|identity| identity.identities.as_ref())
            .is_some_and(Vec::is_empty)
    }
}

/// External identity providers offered on the login surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Github => "GitHub",
        }
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            other => Err(format!("unknown oauth provider: {other}")),
        }
    }
}

/// Where to send the browser to start an OAuth flow, plus the PKCE verifier
/// that must be presented when the code comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRedirect {
    pub url: String,
    pub code_verifier: String,
}

// =============================================================================
// TABLE ROWS
// =============================================================================

/// Owner-editable metadata attached 1:1 to an identity (`profiles` table).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Minimal row inserted when the backend trigger did not create a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub address: String,
}

/// Full replacement of the four editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub title: String,
    pub bio: String,
    pub website: String,
    pub updated_at: String,
}

/// A visitor inquiry (`contact_messages` table). Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: String,
}

/// A storage bucket as listed by the storage endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

// =============================================================================
// TIME
// =============================================================================

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Current time as an RFC 3339 string, the format the table endpoints expect.
#[must_use]
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
