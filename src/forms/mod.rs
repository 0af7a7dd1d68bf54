//! Forms: login, register, contact, and profile edit submissions.
//!
//! ARCHITECTURE
//! ============
//! Each form exposes an async `submit` that validates input, runs the
//! backend call sequence strictly in order, and returns a `FormOutcome`
//! for the page layer to render. Backend failures never escape a form:
//! they become inline messages.
//!
//! Duplicate submissions are refused by a per-form `SubmitLatch`. The
//! latch is released by `SubmitGuard::drop`, so every exit path re-enables
//! the form, including early returns and unwinding.

pub mod contact;
pub mod login;
pub mod profile;
pub mod register;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Client-side validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("A submission is already in progress. Please wait.")]
    InProgress,
}

/// Require a non-blank field, returning it trimmed.
pub(crate) fn required<'a>(label: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Missing(label));
    }
    Ok(trimmed)
}

// =============================================================================
// SUBMIT LATCH
// =============================================================================

/// At most one in-flight submission per form instance.
#[derive(Debug, Default)]
pub struct SubmitLatch {
    busy: AtomicBool,
}

impl SubmitLatch {
    /// Claim the latch for one submission.
    ///
    /// # Errors
    ///
    /// Returns `FormError::InProgress` when another submission holds it.
    pub fn try_acquire(&self) -> Result<SubmitGuard<'_>, FormError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FormError::InProgress)?;
        Ok(SubmitGuard { latch: self })
    }

    /// Whether the submit control should render disabled.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct SubmitGuard<'a> {
    latch: &'a SubmitLatch,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.latch.busy.store(false, Ordering::Release);
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Navigation scheduled for after a success message has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredNavigation {
    pub target: &'static str,
    pub delay: Duration,
}

/// What the page layer should do after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Navigate(&'static str),
    Error(String),
    Success {
        message: String,
        then: Option<DeferredNavigation>,
    },
}

impl FormOutcome {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
