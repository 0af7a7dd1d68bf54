//! Contact form: one insert per submission and a timed status banner.
//!
//! DESIGN
//! ======
//! `ContactView` is the per-visitor form state: the draft, the banner
//! status, and the pending revert. The revert task holds only a `Weak`
//! reference, so an evicted visitor takes its timer down with it.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{FormError, required};
use crate::backend::types::timestamp_now;
use crate::backend::{Backend, ContactMessage, Session};
use crate::scheduler::ScheduledTask;

/// How long a success or error banner stays up.
pub const BANNER_WINDOW: Duration = Duration::from_secs(3);

pub const SUCCESS_MESSAGE: &str = "Message sent successfully!";
pub const ERROR_MESSAGE: &str = "Error sending message. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContactDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactDraft {
    fn validate(&self) -> Result<(), FormError> {
        required("Name", &self.name)?;
        required("Email", &self.email)?;
        required("Subject", &self.subject)?;
        required("Message", &self.message)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Default)]
struct Inner {
    draft: ContactDraft,
    status: ContactStatus,
    revert: Option<ScheduledTask>,
}

#[derive(Default)]
pub struct ContactView {
    inner: Arc<Mutex<Inner>>,
}

impl ContactView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current draft and banner status.
    #[must_use]
    pub fn snapshot(&self) -> (ContactDraft, ContactStatus) {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        (inner.draft.clone(), inner.status)
    }

    /// Insert one contact row. Success clears the draft; failure keeps it.
    /// Either way the banner reverts to idle after `BANNER_WINDOW`.
    ///
    /// # Errors
    ///
    /// Returns a `FormError` for blank fields or a submission already in flight.
    pub async fn submit(
        &self,
        backend: &dyn Backend,
        session: Option<&Session>,
        draft: ContactDraft,
    ) -> Result<ContactStatus, FormError> {
        {
            let mut inner = self.lock();
            if inner.status == ContactStatus::Submitting {
                return Err(FormError::InProgress);
            }
            inner.draft = draft.clone();
            draft.validate()?;
            inner.status = ContactStatus::Submitting;
            inner.revert = None;
        }
        let reset = ResetOnDrop { inner: &self.inner };

        let row = ContactMessage {
            name: draft.name.trim().to_owned(),
            email: draft.email.trim().to_owned(),
            subject: draft.subject.trim().to_owned(),
            message: draft.message,
            created_at: timestamp_now(),
        };
        let result = backend.insert_contact_message(session, &row).await;

        let status = match result {
            Ok(()) => ContactStatus::Success,
            Err(e) => {
                tracing::error!(error = %e, status = ?e.status(), "contact submission failed");
                ContactStatus::Error
            }
        };

        let mut inner = self.lock();
        if status == ContactStatus::Success {
            inner.draft = ContactDraft::default();
        }
        inner.status = status;
        inner.revert = Some(schedule_revert(Arc::downgrade(&self.inner)));
        drop(inner);
        drop(reset);
        Ok(status)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the form to idle if a submission is dropped mid-flight.
struct ResetOnDrop<'a> {
    inner: &'a Mutex<Inner>,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.status == ContactStatus::Submitting {
            inner.status = ContactStatus::Idle;
        }
    }
}

fn schedule_revert(inner: Weak<Mutex<Inner>>) -> ScheduledTask {
    ScheduledTask::after(BANNER_WINDOW, move || {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(inner.status, ContactStatus::Success | ContactStatus::Error) {
            inner.status = ContactStatus::Idle;
        }
    })
}

#[cfg(test)]
#[path = "contact_test.rs"]
mod tests;
