//! Profile edit: full replacement of the four editable fields.
//!
//! On success only the profile slice of the session state is re-fetched
//! and replaced. On failure the error is logged and the edit form stays
//! open with the unsaved values.

use serde::{Deserialize, Serialize};

use super::{FormError, FormOutcome, SubmitLatch};
use crate::backend::types::timestamp_now;
use crate::backend::{Backend, ErrorKind, Profile, ProfileUpdate};
use crate::gate::{LOGIN_PATH, Route};
use crate::session::SessionProvider;

pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to update this profile.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub website: String,
    /// Page the menu was opened on.
    #[serde(default)]
    pub return_to: String,
}

impl ProfileInput {
    /// Prefill from the current profile; absent fields become empty.
    #[must_use]
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        let Some(profile) = profile else {
            return Self::default();
        };
        Self {
            full_name: profile.full_name.clone().unwrap_or_default(),
            title: profile.title.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
            website: profile.website.clone().unwrap_or_default(),
            return_to: String::new(),
        }
    }

    #[must_use]
    pub fn to_update(&self, updated_at: String) -> ProfileUpdate {
        ProfileUpdate {
            full_name: self.full_name.trim().to_owned(),
            title: self.title.trim().to_owned(),
            bio: self.bio.trim().to_owned(),
            website: self.website.trim().to_owned(),
            updated_at,
        }
    }

    /// Where to land after saving. Unknown paths fall back to home.
    #[must_use]
    pub fn return_route(&self) -> Route {
        Route::from_path(&self.return_to)
            .filter(|route| !route.is_public())
            .unwrap_or(Route::Home)
    }
}

/// Save the profile for the signed-in identity.
///
/// # Errors
///
/// Returns `FormError::InProgress` when another save is in flight.
pub async fn submit(
    provider: &SessionProvider,
    backend: &dyn Backend,
    latch: &SubmitLatch,
    input: &ProfileInput,
) -> Result<FormOutcome, FormError> {
    let _guard = latch.try_acquire()?;
    let Some(session) = provider.active_session().await else {
        return Ok(FormOutcome::Navigate(LOGIN_PATH));
    };
    let user_id = session.user.id;

    let update = input.to_update(timestamp_now());
    if let Err(e) = backend.update_profile(&session, user_id, &update).await {
        tracing::error!(user_id = %user_id, error = %e, "profile update failed");
        let message = if e.kind() == ErrorKind::RowLevelSecurity {
            PERMISSION_DENIED_MESSAGE.to_owned()
        } else {
            e.to_string()
        };
        return Ok(FormOutcome::Error(message));
    }

    if let Err(e) = provider.refresh_profile().await {
        tracing::warn!(user_id = %user_id, error = %e, "profile re-fetch failed after update");
    }
    Ok(FormOutcome::Navigate(input.return_route().path()))
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
