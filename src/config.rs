//! Configuration parsed from environment variables.
//!
//! Parsing is written against a lookup closure so tests can feed a map
//! instead of mutating the process environment. A missing or malformed
//! backend endpoint is fatal: the server refuses to start without one.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS: u64 = 10;

const URL_VARS: [&str; 2] = ["SUPABASE_URL", "VITE_SUPABASE_URL"];
const KEY_VARS: [&str; 2] = ["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing backend configuration: set {0}")]
    Missing(&'static str),
    #[error("invalid {var} format; include the protocol (https://): {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Connection parameters for the hosted service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Service endpoint, without a trailing slash.
    pub url: String,
    /// Public (anonymous) API key.
    pub anon_key: String,
    pub timeouts: BackendTimeouts,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Public origin of this site, used for confirmation and OAuth redirects.
    pub site_url: String,
    pub cookie_secure: bool,
}

impl ServerConfig {
    #[must_use]
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/auth/callback", self.site_url)
    }
}

impl BackendConfig {
    /// Build from the process environment.
    ///
    /// Required:
    /// - `SUPABASE_URL` (or `VITE_SUPABASE_URL`)
    /// - `SUPABASE_ANON_KEY` (or `VITE_SUPABASE_ANON_KEY`)
    ///
    /// Optional:
    /// - `BACKEND_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BACKEND_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if either required value is missing or the URL is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`BackendConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let (url_var, raw_url) = first_present(&lookup, &URL_VARS).ok_or(ConfigError::Missing(URL_VARS[0]))?;
        let (_, anon_key) = first_present(&lookup, &KEY_VARS).ok_or(ConfigError::Missing(KEY_VARS[0]))?;
        let url = normalize_url(url_var, &raw_url)?;

        let timeouts = BackendTimeouts {
            request_secs: parse_or(&lookup, "BACKEND_REQUEST_TIMEOUT_SECS", DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(&lookup, "BACKEND_CONNECT_TIMEOUT_SECS", DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { url, anon_key, timeouts })
    }
}

impl ServerConfig {
    /// Build from the process environment (`PORT`, `SITE_URL`, `COOKIE_SECURE`).
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `SITE_URL` is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match non_empty(&lookup, "PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let site_url = match non_empty(&lookup, "SITE_URL") {
            Some(raw) => normalize_url("SITE_URL", &raw)?,
            None => format!("http://localhost:{port}"),
        };

        let cookie_secure = non_empty(&lookup, "COOKIE_SECURE")
            .and_then(|raw| parse_bool(&raw))
            .unwrap_or_else(|| site_url.starts_with("https://"));

        Ok(Self { port, site_url, cookie_secure })
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn first_present(
    lookup: &impl Fn(&str) -> Option<String>,
    keys: &[&'static str],
) -> Option<(&'static str, String)> {
    keys.iter()
        .find_map(|key| non_empty(lookup, key).map(|value| (*key, value.trim().to_owned())))
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    non_empty(lookup, key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate an absolute http(s) URL and strip any trailing slash.
fn normalize_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let parsed = reqwest::Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl { var, reason: e.to_string() })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl { var, reason: format!("unsupported URL: {raw}") });
    }
    Ok(parsed.as_str().trim_end_matches('/').to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
