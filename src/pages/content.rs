//! Home, products, about, contact, loading and not-found pages.

use std::time::Duration;

use minijinja::context;

use crate::catalog::{self, CategoryFilter, FEATURES, STATS};
use crate::forms::contact::{BANNER_WINDOW, ContactDraft, ContactStatus, ERROR_MESSAGE, SUCCESS_MESSAGE};
use crate::gate::Route;

use super::{Notice, Refresh, render};

/// How soon the loading view asks for the page again.
pub const LOADING_RETRY: Duration = Duration::from_secs(1);

const ABOUT_STATS: [(&str, &str); 4] = [
    ("15+", "Projects Completed"),
    ("1000+", "Happy Users"),
    ("10+", "Countries Reached"),
    ("\u{221e}", "Cups of Coffee"),
];

/// Landing page. `signed_in` hides the sign-up calls to action.
///
/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn home(signed_in: bool) -> Result<String, minijinja::Error> {
    render(
        "home.html",
        context! {
            signed_in,
            features => FEATURES,
            featured => catalog::featured(),
            stats => STATS,
        },
    )
}

/// Products grid for the search text and category selector.
///
/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn products(query: &str, filter: CategoryFilter) -> Result<String, minijinja::Error> {
    // Chips are submit buttons of the search form so the query carries over.
    let choices: Vec<&str> = CategoryFilter::choices().into_iter().map(CategoryFilter::as_str).collect();
    render(
        "products.html",
        context! {
            query,
            category => filter.as_str(),
            choices,
            projects => catalog::filter_projects(query, filter),
        },
    )
}

/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn about() -> Result<String, minijinja::Error> {
    render("about.html", context! { stats => ABOUT_STATS })
}

// =============================================================================
// CONTACT
// =============================================================================

/// Contact page for the visitor's current draft and banner status.
/// `invalid` is a validation message from the last submission.
///
/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn contact(draft: &ContactDraft, status: ContactStatus, invalid: Option<&str>) -> Result<String, minijinja::Error> {
    let banner = match (invalid, status) {
        (Some(message), _) => Some(Notice::Error(message.to_owned())),
        (None, ContactStatus::Success) => Some(Notice::Success(SUCCESS_MESSAGE.to_owned())),
        (None, ContactStatus::Error) => Some(Notice::Error(ERROR_MESSAGE.to_owned())),
        (None, ContactStatus::Idle | ContactStatus::Submitting) => None,
    };
    render(
        "contact.html",
        context! {
            draft,
            busy => status == ContactStatus::Submitting,
            banner,
        },
    )
}

/// Reload that clears a result banner once its window has passed.
#[must_use]
pub fn contact_refresh(status: ContactStatus) -> Option<Refresh> {
    match status {
        ContactStatus::Success | ContactStatus::Error => Some(Refresh::to_path(Route::Contact.path(), BANNER_WINDOW)),
        ContactStatus::Idle | ContactStatus::Submitting => None,
    }
}

// =============================================================================
// PLACEHOLDERS
// =============================================================================

/// Neutral view shown while the session restore is still running.
///
/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn loading() -> Result<String, minijinja::Error> {
    render("loading.html", ())
}

/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn not_found() -> Result<String, minijinja::Error> {
    render("not_found.html", ())
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
