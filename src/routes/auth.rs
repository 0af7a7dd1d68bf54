//! Auth routes: password forms, sign-out, and the OAuth redirect flow.

use axum::Form;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::backend::OAuthProvider;
use crate::forms::FormOutcome;
use crate::forms::login::{self as login_form, LoginInput};
use crate::forms::register::{self as register_form, RegisterInput};
use crate::gate::{HOME_PATH, LOGIN_PATH, Route};
use crate::pages::auth::AuthFormView;
use crate::pages::layout::MenuView;
use crate::pages::{self as views, Notice};
use crate::session::AuthState;
use crate::state::AppState;

use super::pages::{page, title};
use super::{lookup_visitor, render_failed, resolve_visitor, sync_session_cookie};

const OAUTH_EXPIRED_MESSAGE: &str = "Your sign-in attempt expired. Please try again.";
const OAUTH_MISSING_CODE_MESSAGE: &str = "Sign-in was cancelled or did not complete.";

fn login_page(view: &AuthFormView) -> Result<Html<String>, StatusCode> {
    let main = views::auth::login(view).map_err(render_failed)?;
    page(
        Some(Route::Login),
        title(Route::Login),
        view.refresh().as_ref(),
        &AuthState::Anonymous,
        &MenuView::default(),
        main,
    )
}

fn login_error(message: String) -> Result<Html<String>, StatusCode> {
    login_page(&AuthFormView { notice: Some(Notice::Error(message)), ..AuthFormView::default() })
}

// =============================================================================
// PASSWORD FORMS
// =============================================================================

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<LoginInput>,
) -> Result<Response, StatusCode> {
    let (visitor, jar) = resolve_visitor(&state, jar).await;
    let result = login_form::submit(&visitor.session, &visitor.login_latch, &input).await;
    let jar = sync_session_cookie(jar, &visitor, &state);

    if let Ok(FormOutcome::Navigate(target)) = result {
        return Ok((jar, Redirect::to(target)).into_response());
    }
    let view = AuthFormView::after(&result, "", &input.email);
    Ok((jar, login_page(&view)?).into_response())
}

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<RegisterInput>,
) -> Result<Response, StatusCode> {
    let (visitor, jar) = resolve_visitor(&state, jar).await;
    let result = register_form::submit(&visitor.session, &visitor.register_latch, &input, &state.config.site_url).await;
    let jar = sync_session_cookie(jar, &visitor, &state);

    if let Ok(FormOutcome::Navigate(target)) = result {
        return Ok((jar, Redirect::to(target)).into_response());
    }
    let view = AuthFormView::after(&result, &input.name, &input.email);
    let main = views::auth::register(&view).map_err(render_failed)?;
    let html = page(
        Some(Route::Register),
        title(Route::Register),
        view.refresh().as_ref(),
        &AuthState::Anonymous,
        &MenuView::default(),
        main,
    )?;
    Ok((jar, html).into_response())
}

/// `POST /logout`: local state is always cleared, then back to login.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (visitor, jar) = lookup_visitor(&state, jar).await;
    visitor.session.sign_out().await;
    let jar = sync_session_cookie(jar, &visitor, &state);
    (jar, Redirect::to(LOGIN_PATH)).into_response()
}

// =============================================================================
// OAUTH
// =============================================================================

/// `POST /auth/oauth/{provider}`: send the browser to the provider.
pub async fn oauth_start(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(provider): Path<String>,
) -> Result<Response, StatusCode> {
    let Ok(provider) = provider.parse::<OAuthProvider>() else {
        return Err(StatusCode::NOT_FOUND);
    };
    let (visitor, jar) = resolve_visitor(&state, jar).await;

    match login_form::begin_oauth(state.backend.as_ref(), provider, &state.config.oauth_callback_url()).await {
        Ok(redirect) => {
            visitor.set_oauth_verifier(redirect.code_verifier);
            Ok((jar, Redirect::to(&redirect.url)).into_response())
        }
        Err(message) => Ok((jar, login_error(message)?).into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error_description: Option<String>,
}

/// `GET /auth/callback`: exchange the code for a session.
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Result<Response, StatusCode> {
    // A pending flow always has a registered visitor holding its verifier.
    let (visitor, jar) = lookup_visitor(&state, jar).await;

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        let message = params
            .error_description
            .unwrap_or_else(|| OAUTH_MISSING_CODE_MESSAGE.to_owned());
        return Ok((jar, login_error(message)?).into_response());
    };
    let Some(verifier) = visitor.take_oauth_verifier() else {
        tracing::warn!(visitor_id = %visitor.id, "oauth callback without a pending flow");
        return Ok((jar, login_error(OAUTH_EXPIRED_MESSAGE.to_owned())?).into_response());
    };

    match visitor.session.complete_oauth(&code, &verifier).await {
        Ok(_) => {
            let jar = sync_session_cookie(jar, &visitor, &state);
            Ok((jar, Redirect::to(HOME_PATH)).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "oauth code exchange failed");
            Ok((jar, login_error(e.to_string())?).into_response())
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
