//! Navigation bar and profile menu.

use minijinja::{Value, context};

use crate::backend::{Profile, Session};
use crate::forms::profile::ProfileInput;
use crate::gate::Route;
use crate::session::AuthState;

use super::render;

/// Open state and inline error of the profile menu for one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuView {
    pub open: bool,
    pub error: Option<String>,
    /// Values to prefill instead of the stored profile (after a failed save).
    pub draft: Option<ProfileInput>,
}

impl MenuView {
    #[must_use]
    pub fn failed(draft: ProfileInput, error: String) -> Self {
        Self { open: true, error: Some(error), draft: Some(draft) }
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Uppercased first letter of the display name, else of the email, else `U`.
#[must_use]
pub fn avatar_initial(session: &Session, profile: Option<&Profile>) -> char {
    present(profile.and_then(|p| p.full_name.as_ref()))
        .or_else(|| present(session.user.email.as_ref()))
        .and_then(|text| text.chars().next())
        .map_or('U', |c| c.to_uppercase().next().unwrap_or(c))
}

/// Profile name, else the email local part, else `User`.
#[must_use]
pub fn display_name(session: &Session, profile: Option<&Profile>) -> String {
    present(profile.and_then(|p| p.full_name.as_ref()))
        .or_else(|| session.user.email_local_part())
        .unwrap_or("User")
        .to_owned()
}

/// Top navigation. Signed-in visitors get the page links and the profile
/// menu; everyone else gets the sign-in links.
///
/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn navbar(active: Option<Route>, auth: &AuthState, menu: &MenuView) -> Result<String, minijinja::Error> {
    let Some(session) = auth.session() else {
        return render("navbar.html", ());
    };
    let profile = auth.profile();

    let account = context! {
        initial => avatar_initial(session, profile),
        name => display_name(session, profile),
        email => session.user.email.as_deref().unwrap_or_default(),
        title => present(profile.and_then(|p| p.title.as_ref())),
        bio => present(profile.and_then(|p| p.bio.as_ref())),
        website => present(profile.and_then(|p| p.website.as_ref())),
    };
    let draft = menu
        .draft
        .clone()
        .unwrap_or_else(|| ProfileInput::from_profile(profile));
    let current = active.unwrap_or(Route::Home);

    render(
        "navbar.html",
        context! {
            account,
            active => active.map(Route::path),
            menu => context! { open => menu.open, error => menu.error },
            draft,
            return_to => Value::from_safe_string(current.path().to_owned()),
        },
    )
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
