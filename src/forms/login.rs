//! Login form: password sign-in and the OAuth entry point.

use serde::Deserialize;

use super::{FormError, FormOutcome, SubmitLatch, required};
use crate::backend::{Backend, BackendError, ErrorKind, OAuthProvider, OAuthRedirect};
use crate::gate::HOME_PATH;
use crate::session::SessionProvider;

pub const UNCONFIRMED_MESSAGE: &str = "Your email is not confirmed. We have sent a new confirmation email. \
     Please check your inbox and confirm your email, then try signing in again.";
pub const INVALID_CREDENTIALS_MESSAGE: &str =
    "Invalid email or password. Please check your credentials and try again.";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign in and decide where the visitor goes next.
///
/// # Errors
///
/// Returns a `FormError` for blank fields or a submission already in flight.
pub async fn submit(
    provider: &SessionProvider,
    latch: &SubmitLatch,
    input: &LoginInput,
) -> Result<FormOutcome, FormError> {
    let email = required("Email", &input.email)?;
    if input.password.is_empty() {
        return Err(FormError::Missing("Password"));
    }
    let _guard = latch.try_acquire()?;

    let outcome = match provider.sign_in(email, &input.password).await {
        Ok(Some(_)) => FormOutcome::Navigate(HOME_PATH),
        Ok(None) => FormOutcome::error(LOGIN_FAILED_MESSAGE),
        Err(e) => FormOutcome::Error(sign_in_error_message(provider, email, &e).await),
    };
    Ok(outcome)
}

/// User-facing text for a failed sign-in. An unconfirmed email triggers
/// exactly one confirmation resend.
pub async fn sign_in_error_message(provider: &SessionProvider, email: &str, err: &BackendError) -> String {
    match err.kind() {
        ErrorKind::EmailNotConfirmed => match provider.resend_confirmation(email).await {
            Ok(()) => UNCONFIRMED_MESSAGE.to_owned(),
            Err(resend) => {
                tracing::warn!(error = %resend, "confirmation resend failed");
                format!("Unable to resend confirmation email: {resend}")
            }
        },
        ErrorKind::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_owned(),
        _ => {
            tracing::warn!(error = %err, "sign-in failed");
            err.to_string()
        }
    }
}

/// Text shown when starting an OAuth flow fails.
#[must_use]
pub fn oauth_error_message(provider: OAuthProvider, err: &BackendError) -> String {
    if err.kind() == ErrorKind::ProviderDisabled {
        return format!(
            "{} sign-in is currently unavailable. Please use email/password or contact support.",
            provider.label()
        );
    }
    err.to_string()
}

/// Start an OAuth flow. On failure the message is ready to show inline.
///
/// # Errors
///
/// Returns the user-facing message from [`oauth_error_message`].
pub async fn begin_oauth(
    backend: &dyn Backend,
    provider: OAuthProvider,
    redirect_to: &str,
) -> Result<OAuthRedirect, String> {
    backend
        .oauth_authorize(provider, redirect_to)
        .await
        .map_err(|e| {
            tracing::warn!(provider = provider.as_str(), error = %e, "oauth start failed");
            oauth_error_message(provider, &e)
        })
}

#[cfg(test)]
#[path = "login_test.rs"]
mod tests;
