//! Backend errors and their classification.
//!
//! DESIGN
//! ======
//! Every failed call becomes a `BackendError`. Callers never inspect message
//! text themselves; they ask for an `ErrorKind`. Classification prefers the
//! structured code the service returns (`error_code` on auth endpoints,
//! Postgres SQLSTATE `code` on table endpoints) and only falls back to
//! message matching when the code is absent or not one we know.

use serde::Deserialize;

/// Errors produced by backend client operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, code: Option<String>, message: String },

    /// A success response body could not be decoded.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The realtime websocket could not be joined.
    #[error("realtime: {0}")]
    Realtime(String),
}

/// What a failure means to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmailNotConfirmed,
    InvalidCredentials,
    ProviderDisabled,
    AlreadyRegistered,
    DuplicateKey,
    RowLevelSecurity,
    Network,
    Other,
}

impl BackendError {
    /// Build an API error, e.g. for mocks or synthesized failures.
    #[must_use]
    pub fn api(status: u16, code: Option<&str>, message: impl Into<String>) -> Self {
        Self::Api { status, code: code.map(str::to_owned), message: message.into() }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Network,
            Self::Api { code, message, .. } => classify(code.as_deref(), message),
            Self::Parse(_) | Self::HttpClientBuild(_) | Self::Realtime(_) => ErrorKind::Other,
        }
    }

    /// HTTP status, when the service answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Map a structured code, falling back to the message text.
#[must_use]
pub fn classify(code: Option<&str>, message: &str) -> ErrorKind {
    code.and_then(classify_code)
        .unwrap_or_else(|| classify_message(message))
}

fn classify_code(code: &str) -> Option<ErrorKind> {
    let kind = match code {
        "email_not_confirmed" => ErrorKind::EmailNotConfirmed,
        "invalid_credentials" => ErrorKind::InvalidCredentials,
        "provider_disabled" | "oauth_provider_not_supported" => ErrorKind::ProviderDisabled,
        "user_already_exists" | "email_exists" => ErrorKind::AlreadyRegistered,
        "23505" => ErrorKind::DuplicateKey,
        "42501" => ErrorKind::RowLevelSecurity,
        _ => return None,
    };
    Some(kind)
}

fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_ascii_lowercase();
    if lower.contains("email not confirmed") {
        ErrorKind::EmailNotConfirmed
    } else if lower.contains("invalid login credentials") {
        ErrorKind::InvalidCredentials
    } else if lower.contains("not enabled") || lower.contains("not supported") {
        ErrorKind::ProviderDisabled
    } else if lower.contains("already registered") {
        ErrorKind::AlreadyRegistered
    } else if lower.contains("duplicate key") {
        ErrorKind::DuplicateKey
    } else if lower.contains("row-level security") {
        ErrorKind::RowLevelSecurity
    } else {
        ErrorKind::Other
    }
}

// =============================================================================
// ERROR BODIES
// =============================================================================

/// Union of the error shapes the auth, table and storage endpoints emit.
#[derive(Deserialize, Default)]
struct ErrorBody {
    error_code: Option<String>,
    code: Option<serde_json::Value>,
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Decode a non-success response body into a `BackendError::Api`.
#[must_use]
pub fn from_response(status: u16, body: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    // Auth endpoints put the HTTP status in a numeric `code`; only string
    // codes (SQLSTATE, storage codes) carry meaning.
    let code = parsed.error_code.or_else(|| {
        parsed
            .code
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
    });

    let message = parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() { format!("request failed with status {status}") } else { trimmed.to_owned() }
        });

    BackendError::Api { status, code, message }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
