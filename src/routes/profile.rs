//! Profile menu save.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::forms::FormOutcome;
use crate::forms::profile::{self as profile_form, ProfileInput};
use crate::pages::layout::MenuView;
use crate::state::AppState;

use super::pages::{PageQuery, render_route};
use super::{lookup_visitor, sync_session_cookie};

/// `POST /profile`: on success go back to the page the menu was opened
/// on; on failure re-render that page with the menu open.
pub async fn save(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<ProfileInput>,
) -> Result<Response, StatusCode> {
    let (visitor, jar) = lookup_visitor(&state, jar).await;
    let result = profile_form::submit(&visitor.session, state.backend.as_ref(), &visitor.profile_latch, &input).await;
    let jar = sync_session_cookie(jar, &visitor, &state);

    let message = match result {
        Ok(FormOutcome::Navigate(target)) => return Ok((jar, Redirect::to(target)).into_response()),
        Ok(FormOutcome::Success { .. }) => return Ok((jar, Redirect::to(input.return_route().path())).into_response()),
        Ok(FormOutcome::Error(message)) => message,
        Err(e) => e.to_string(),
    };

    let auth = visitor.session.state();
    let menu = MenuView::failed(input.clone(), message);
    let html = render_route(input.return_route(), &visitor, &auth, &PageQuery::default(), &menu)?;
    Ok((jar, html).into_response())
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
