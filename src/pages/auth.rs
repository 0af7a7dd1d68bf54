//! Login and register pages.

use minijinja::context;

use crate::backend::OAuthProvider;
use crate::forms::register::MIN_PASSWORD_LEN;
use crate::forms::{DeferredNavigation, FormError, FormOutcome};

use super::{Notice, Refresh, render};

/// Everything an auth form render needs besides its template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthFormView {
    pub name: String,
    pub email: String,
    pub notice: Option<Notice>,
    /// A submission for this form is in flight.
    pub busy: bool,
    pub then: Option<DeferredNavigation>,
}

impl AuthFormView {
    /// View for a submission that did not navigate away.
    #[must_use]
    pub fn after(result: &Result<FormOutcome, FormError>, name: &str, email: &str) -> Self {
        let mut view = Self { name: name.to_owned(), email: email.to_owned(), ..Self::default() };
        match result {
            Ok(FormOutcome::Error(message)) => view.notice = Some(Notice::Error(message.clone())),
            Ok(FormOutcome::Success { message, then }) => {
                view.notice = Some(Notice::Success(message.clone()));
                view.then = *then;
            }
            Ok(FormOutcome::Navigate(_)) => {}
            Err(e) => view.notice = Some(Notice::Error(e.to_string())),
        }
        view
    }

    /// Refresh for the deferred navigation, if any.
    #[must_use]
    pub fn refresh(&self) -> Option<Refresh> {
        self.then.map(|then| Refresh::to_path(then.target, then.delay))
    }
}

/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn login(view: &AuthFormView) -> Result<String, minijinja::Error> {
    let providers: Vec<_> = [OAuthProvider::Google, OAuthProvider::Github]
        .into_iter()
        .map(|provider| context! { id => provider.as_str(), label => provider.label() })
        .collect();
    render(
        "login.html",
        context! {
            notice => view.notice,
            email => view.email,
            busy => view.busy,
            providers,
        },
    )
}

/// # Errors
///
/// Returns the engine error if the template fails to render.
pub fn register(view: &AuthFormView) -> Result<String, minijinja::Error> {
    render(
        "register.html",
        context! {
            notice => view.notice,
            name => view.name,
            email => view.email,
            busy => view.busy,
            min_password_len => MIN_PASSWORD_LEN,
        },
    )
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
