//! Register form: sign-up followed by an immediate sign-in attempt.

use std::time::Duration;

use serde::Deserialize;

use super::{DeferredNavigation, FormError, FormOutcome, SubmitLatch, required};
use crate::backend::{ErrorKind, SignUpRequest};
use crate::diagnostics::{TEST_EMAIL, TEST_PASSWORD};
use crate::gate::{HOME_PATH, LOGIN_PATH};
use crate::session::SessionProvider;

/// UI validation only; the service applies its own password policy.
pub const MIN_PASSWORD_LEN: usize = 6;

pub const ALREADY_REGISTERED_MESSAGE: &str = "This email is already registered. Please sign in instead.";
pub const REGISTERED_MESSAGE: &str = "Registration successful! You can now sign in with your credentials.";

/// Delay before leaving for the login page when confirmation is pending.
pub const CONFIRMATION_PENDING_DELAY: Duration = Duration::from_secs(5);
/// Delay before leaving for the login page after a sessionless success.
pub const REGISTERED_DELAY: Duration = Duration::from_secs(3);

#[must_use]
pub fn confirmation_pending_message() -> String {
    format!(
        "Registration successful! For testing purposes, you can use the test account: \
         Email: {TEST_EMAIL}, Password: {TEST_PASSWORD}"
    )
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Create the account, then try to sign straight in.
///
/// `redirect_to` is where the confirmation email link lands.
///
/// # Errors
///
/// Returns a `FormError` for invalid input or a submission already in flight.
pub async fn submit(
    provider: &SessionProvider,
    latch: &SubmitLatch,
    input: &RegisterInput,
    redirect_to: &str,
) -> Result<FormOutcome, FormError> {
    let name = required("Full name", &input.name)?;
    let email = required("Email", &input.email)?;
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    let _guard = latch.try_acquire()?;

    let request = SignUpRequest {
        email: email.to_owned(),
        password: input.password.clone(),
        display_name: name.to_owned(),
        redirect_to: redirect_to.to_owned(),
    };
    let created = match provider.sign_up(&request).await {
        Ok(created) => created,
        Err(e) if e.kind() == ErrorKind::AlreadyRegistered => {
            return Ok(FormOutcome::error(ALREADY_REGISTERED_MESSAGE));
        }
        Err(e) => {
            tracing::warn!(error = %e, "sign-up failed");
            return Ok(FormOutcome::Error(e.to_string()));
        }
    };
    if created.already_registered() {
        return Ok(FormOutcome::error(ALREADY_REGISTERED_MESSAGE));
    }

    let outcome = match provider.sign_in(email, &input.password).await {
        Ok(Some(_)) => FormOutcome::Navigate(HOME_PATH),
        Ok(None) => FormOutcome::Success {
            message: REGISTERED_MESSAGE.to_owned(),
            then: Some(DeferredNavigation { target: LOGIN_PATH, delay: REGISTERED_DELAY }),
        },
        Err(e) if e.kind() == ErrorKind::EmailNotConfirmed => FormOutcome::Success {
            message: confirmation_pending_message(),
            then: Some(DeferredNavigation { target: LOGIN_PATH, delay: CONFIRMATION_PENDING_DELAY }),
        },
        Err(e) => {
            tracing::warn!(error = %e, "sign-in after sign-up failed");
            FormOutcome::Error(e.to_string())
        }
    };
    Ok(outcome)
}

#[cfg(test)]
#[path = "register_test.rs"]
mod tests;
