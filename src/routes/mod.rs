//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page is rendered on the server. A browser is tied to its
//! `Visitor` by an opaque cookie; a second cookie carries the refresh
//! token so a session survives a restart. Only the credential forms and
//! the OAuth start register new visitors; everything else looks them up.
//! GET requests for pages all pass through the route gate, including
//! paths no route is registered for.

pub mod auth;
pub mod contact;
pub mod pages;
pub mod profile;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::visitor::{REFRESH_COOKIE, VISITOR_COOKIE, Visitor};

/// Lifetime of the refresh-token cookie.
const REFRESH_COOKIE_MAX_AGE: Duration = Duration::days(30);

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/login", get(pages::gated).post(auth::login))
        .route("/register", get(pages::gated).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/auth/oauth/{provider}", post(auth::oauth_start))
        .route("/auth/callback", get(auth::oauth_callback))
        .route("/profile", post(profile::save))
        .route("/contact", get(pages::gated).post(contact::submit))
        .route("/healthz", get(healthz))
        .fallback(pages::gated)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Log a template failure and answer 500.
pub(crate) fn render_failed(e: minijinja::Error) -> StatusCode {
    tracing::error!(error = %e, "page render failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

// =============================================================================
// VISITOR + COOKIES
// =============================================================================

fn cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Find or register the visitor for a sign-in attempt, and start its
/// session restore. A newly registered visitor gets its cookie
/// set on `jar`.
pub(crate) async fn resolve_visitor(state: &AppState, jar: CookieJar) -> (Arc<Visitor>, CookieJar) {
    attach_visitor(state, jar, true).await
}

/// Visitor for any other request. A browser with neither a known visitor
/// nor a refresh token is served a transient anonymous visitor and gets no
/// cookie.
pub(crate) async fn lookup_visitor(state: &AppState, jar: CookieJar) -> (Arc<Visitor>, CookieJar) {
    attach_visitor(state, jar, false).await
}

async fn attach_visitor(state: &AppState, jar: CookieJar, register: bool) -> (Arc<Visitor>, CookieJar) {
    let id = jar.get(VISITOR_COOKIE).map(Cookie::value);
    let refresh = jar.get(REFRESH_COOKIE).map(Cookie::value);
    let (visitor, created) = if register {
        state.visitors.resolve(&state.backend, id, refresh).await
    } else {
        state.visitors.lookup(&state.backend, id, refresh).await
    };

    if visitor.session.state().is_loading() {
        // Detached; `init` runs once and later callers just await it.
        drop(visitor.session.spawn_init());
    }

    let jar = if created {
        jar.add(cookie(VISITOR_COOKIE, visitor.id.clone(), state.config.cookie_secure))
    } else {
        jar
    };
    (visitor, jar)
}

/// Mirror the visitor's refresh token into its cookie. Nothing changes
/// while the restore is still running.
pub(crate) fn sync_session_cookie(jar: CookieJar, visitor: &Visitor, state: &AppState) -> CookieJar {
    if visitor.session.state().is_loading() {
        return jar;
    }
    let secure = state.config.cookie_secure;
    let current = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|value| !value.is_empty());

    match visitor.session.refresh_token() {
        Some(token) if current.as_deref() != Some(token.as_str()) => {
            let mut refresh = cookie(REFRESH_COOKIE, token, secure);
            refresh.set_max_age(REFRESH_COOKIE_MAX_AGE);
            jar.add(refresh)
        }
        Some(_) => jar,
        None if current.is_some() => {
            let mut cleared = cookie(REFRESH_COOKIE, String::new(), secure);
            cleared.set_max_age(Duration::ZERO);
            jar.add(cleared)
        }
        None => jar,
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
