//! Pages: server-rendered HTML for every route.
//!
//! DESIGN
//! ======
//! Markup lives in `templates/*.html`, compiled in with `include_str!` and
//! handed to one shared minijinja `Environment` through its loader. HTML
//! autoescape is on for every template, so visitor and backend text is
//! escaped where it is printed. Fragments this module already rendered
//! (navbar, page body) reach the shell as safe values and are never parsed
//! again. Page functions are pure: they take the data to show and return
//! markup, so handlers decide status codes and cookies.

pub mod auth;
pub mod content;
pub mod layout;

use std::sync::LazyLock;
use std::time::Duration;

use minijinja::{AutoEscape, Environment, Value, context};
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("shell.html", include_str!("../../templates/shell.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("navbar.html", include_str!("../../templates/navbar.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("register.html", include_str!("../../templates/register.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("products.html", include_str!("../../templates/products.html")),
    ("about.html", include_str!("../../templates/about.html")),
    ("contact.html", include_str!("../../templates/contact.html")),
    ("loading.html", include_str!("../../templates/loading.html")),
    ("not_found.html", include_str!("../../templates/not_found.html")),
];

static ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_loader(|name| {
        Ok(TEMPLATES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, source)| (*source).to_owned()))
    });
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env
});

/// Render a compiled-in template with `ctx`.
///
/// # Errors
///
/// Returns the engine error for an unknown template or a failed render.
pub(crate) fn render<S: Serialize>(name: &str, ctx: S) -> Result<String, minijinja::Error> {
    ENV.get_template(name)?.render(ctx)
}

/// Wrap a rendered navbar and page body in the document shell.
///
/// # Errors
///
/// Returns the engine error if the shell fails to render.
pub fn document(title: &str, refresh: Option<&Refresh>, nav: String, main: String) -> Result<String, minijinja::Error> {
    render(
        "shell.html",
        context! {
            title,
            refresh,
            nav => Value::from_safe_string(nav),
            main => Value::from_safe_string(main),
        },
    )
}

/// Client-side navigation after a delay, emitted as a `<meta>` refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Refresh {
    secs: u64,
    target: Value,
}

impl Refresh {
    /// Navigate to one of the site's own paths.
    #[must_use]
    pub fn to_path(target: &'static str, delay: Duration) -> Self {
        Self { secs: delay.as_secs(), target: Value::from_safe_string(target.to_owned()) }
    }

    /// Reload a request target copied from the incoming URI. It is printed
    /// escaped.
    #[must_use]
    pub fn to_request(target: &str, delay: Duration) -> Self {
        Self { secs: delay.as_secs(), target: Value::from(target) }
    }
}

/// Inline banner above a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Notice {
    Error(String),
    Success(String),
}

/// `text` the way templates print it.
#[cfg(test)]
pub(crate) fn escaped(text: &str) -> String {
    ENV.render_str("{{ text }}", context! { text }).unwrap()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
