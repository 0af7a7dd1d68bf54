//! REST client for the hosted service.
//!
//! Thin HTTP wrapper over the auth (`/auth/v1`), table (`/rest/v1`) and
//! storage (`/storage/v1`) endpoints. Response decoding lives in pure
//! functions (`parse_sign_up`, `parse_token`, ...) for testability.

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::error::{self, BackendError};
use super::types::{
    Bucket, ContactMessage, Identity, NewProfile, OAuthProvider, OAuthRedirect, Profile, ProfileUpdate, Session,
    SessionTokens, SignUpRequest, SignUpResponse, unix_now,
};
use super::{Backend, CONTACT_TABLE, PROFILES_TABLE, realtime};
use crate::config::BackendConfig;

// =============================================================================
// CLIENT
// =============================================================================

pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestBackend {
    /// Build a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.url.clone(), anon_key: config.anon_key.clone() })
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(self.anon_key.as_str()))
    }

    fn table(&self, method: Method, table: &str, session: Option<&Session>) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{table}"), session.map(|s| s.access_token.as_str()))
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Identity, BackendError> {
        let response = self
            .request(Method::GET, "/auth/v1/user", Some(access_token))
            .send()
            .await?;
        read_json(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, BackendError> {
        let response = self
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let body = read_text(response).await?;
        parse_token(&body, unix_now())
    }

    async fn select_profiles(
        &self,
        session: Option<&Session>,
        column: &str,
        value: &str,
    ) -> Result<Vec<Profile>, BackendError> {
        let response = self
            .table(Method::GET, PROFILES_TABLE, session)
            .query(&[(column, format!("eq.{value}")), ("select", "*".to_owned())])
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl Backend for RestBackend {
    async fn get_session(&self, stored: Option<&SessionTokens>) -> Result<Option<Session>, BackendError> {
        let Some(tokens) = stored else {
            return Ok(None);
        };

        if tokens.is_expired(unix_now()) {
            if tokens.refresh_token.is_empty() {
                return Ok(None);
            }
            return self.refresh(&tokens.refresh_token).await.map(Some);
        }

        let user = self.fetch_user(&tokens.access_token).await?;
        Ok(Some(Session {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at,
            user,
        }))
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, BackendError> {
        let response = self
            .request(Method::POST, "/auth/v1/signup", None)
            .query(&[("redirect_to", request.redirect_to.as_str())])
            .json(&serde_json::json!({
                "email": request.email,
                "password": request.password,
                "data": { "full_name": request.display_name },
            }))
            .send()
            .await?;
        let body = read_text(response).await?;
        parse_sign_up(&body, unix_now())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Option<Session>, BackendError> {
        let response = self
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = read_text(response).await?;
        parse_token(&body, unix_now()).map(Some)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError> {
        let response = self
            .request(Method::POST, "/auth/v1/logout", Some(&session.access_token))
            .send()
            .await?;
        read_text(response).await.map(drop)
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), BackendError> {
        let response = self
            .request(Method::POST, "/auth/v1/resend", None)
            .json(&serde_json::json!({ "type": "signup", "email": email }))
            .send()
            .await?;
        read_text(response).await.map(drop)
    }

    async fn oauth_authorize(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthRedirect, BackendError> {
        let response = self
            .request(Method::GET, "/auth/v1/settings", None)
            .send()
            .await?;
        let settings: AuthSettings = read_json(response).await?;
        if !settings.provider_enabled(provider) {
            return Err(BackendError::api(
                400,
                Some("provider_disabled"),
                format!("Unsupported provider: {} is not enabled", provider.as_str()),
            ));
        }

        let code_verifier = generate_code_verifier();
        let url = authorize_url(&self.base_url, provider, redirect_to, &code_verifier)?;
        Ok(OAuthRedirect { url, code_verifier })
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, BackendError> {
        let response = self
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "pkce")])
            .json(&serde_json::json!({ "auth_code": code, "code_verifier": code_verifier }))
            .send()
            .await?;
        let body = read_text(response).await?;
        parse_token(&body, unix_now())
    }

    async fn select_profile(&self, session: &Session, id: Uuid) -> Result<Option<Profile>, BackendError> {
        let rows = self
            .select_profiles(Some(session), "id", &id.to_string())
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_profile_by_email(
        &self,
        session: Option<&Session>,
        email: &str,
    ) -> Result<Option<Profile>, BackendError> {
        let rows = self.select_profiles(session, "email", email).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, session: &Session, profile: &NewProfile) -> Result<(), BackendError> {
        let response = self
            .table(Method::POST, PROFILES_TABLE, Some(session))
            .header("Prefer", "return=minimal")
            .json(profile)
            .send()
            .await?;
        read_text(response).await.map(drop)
    }

    async fn update_profile(&self, session: &Session, id: Uuid, update: &ProfileUpdate) -> Result<(), BackendError> {
        let response = self
            .table(Method::PATCH, PROFILES_TABLE, Some(session))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await?;
        let rows: Vec<Profile> = read_json(response).await?;
        // Row-level security filters rows out of an UPDATE instead of failing it.
        if rows.is_empty() {
            return Err(BackendError::api(
                403,
                Some("42501"),
                "profile update was rejected by row-level security",
            ));
        }
        Ok(())
    }

    async fn insert_contact_message(
        &self,
        session: Option<&Session>,
        message: &ContactMessage,
    ) -> Result<(), BackendError> {
        let response = self
            .table(Method::POST, CONTACT_TABLE, session)
            .header("Prefer", "return=minimal")
            .json(&[message])
            .send()
            .await?;
        read_text(response).await.map(drop)
    }

    async fn probe_table(&self, session: Option<&Session>, table: &str) -> Result<(), BackendError> {
        let response = self
            .table(Method::GET, table, session)
            .query(&[("select", "count"), ("limit", "1")])
            .send()
            .await?;
        read_text(response).await.map(drop)
    }

    async fn list_buckets(&self, session: Option<&Session>) -> Result<Vec<Bucket>, BackendError> {
        let response = self
            .request(Method::GET, "/storage/v1/bucket", session.map(|s| s.access_token.as_str()))
            .send()
            .await?;
        read_json(response).await
    }

    async fn probe_realtime(&self, channel: &str, wait: Duration) -> Result<bool, BackendError> {
        realtime::probe(&self.base_url, &self.anon_key, channel, wait).await
    }
}

// =============================================================================
// RESPONSE HANDLING
// =============================================================================

async fn read_text(response: Response) -> Result<String, BackendError> {
    let status = response.status().as_u16();
    let text = response.text().await?;
    if !(200..300).contains(&status) {
        return Err(error::from_response(status, &text));
    }
    Ok(text)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let text = read_text(response).await?;
    serde_json::from_str(&text).map_err(|e| BackendError::Parse(e.to_string()))
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: Identity,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now + secs));
        Session { access_token: self.access_token, refresh_token: self.refresh_token, expires_at, user: self.user }
    }
}

#[derive(Deserialize, Default)]
struct AuthSettings {
    #[serde(default)]
    external: HashMap<String, serde_json::Value>,
}

impl AuthSettings {
    fn provider_enabled(&self, provider: OAuthProvider) -> bool {
        self.external
            .get(provider.as_str())
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Decode a token-grant response into a session.
fn parse_token(body: &str, now: i64) -> Result<Session, BackendError> {
    let token: TokenResponse = serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(token.into_session(now))
}

/// Decode a sign-up response. The service answers with a full token grant
/// when confirmation is disabled, otherwise with the bare user (either at
/// the top level or under `user`).
fn parse_sign_up(body: &str, now: i64) -> Result<SignUpResponse, BackendError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;

    if value.get("access_token").is_some() {
        let token: TokenResponse = serde_json::from_value(value).map_err(|e| BackendError::Parse(e.to_string()))?;
        let session = token.into_session(now);
        return Ok(SignUpResponse { identity: Some(session.user.clone()), session: Some(session) });
    }

    let user = match value.get("user") {
        Some(user) if user.is_object() => user.clone(),
        _ => value,
    };
    let identity: Identity = serde_json::from_value(user).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(SignUpResponse { identity: Some(identity), session: None })
}

// =============================================================================
// PKCE
// =============================================================================

/// Random 32-byte verifier, base64url without padding (43 chars).
fn generate_code_verifier() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 challenge for a verifier.
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn authorize_url(
    base_url: &str,
    provider: OAuthProvider,
    redirect_to: &str,
    verifier: &str,
) -> Result<String, BackendError> {
    let challenge = code_challenge(verifier);
    let url = reqwest::Url::parse_with_params(
        &format!("{base_url}/auth/v1/authorize"),
        &[
            ("provider", provider.as_str()),
            ("redirect_to", redirect_to),
            ("code_challenge", challenge.as_str()),
            ("code_challenge_method", "s256"),
        ],
    )
    .map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(url.into())
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
