//! Contact form submission.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::forms::contact::ContactDraft;
use crate::gate::{LOGIN_PATH, Route};
use crate::pages::content;
use crate::pages::layout::MenuView;
use crate::state::AppState;

use super::pages::{page, title};
use super::{lookup_visitor, render_failed, sync_session_cookie};

/// `POST /contact`: insert one message and show the result banner.
pub async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(draft): Form<ContactDraft>,
) -> Result<Response, StatusCode> {
    let (visitor, jar) = lookup_visitor(&state, jar).await;
    let Some(session) = visitor.session.active_session().await else {
        let jar = sync_session_cookie(jar, &visitor, &state);
        return Ok((jar, Redirect::to(LOGIN_PATH)).into_response());
    };

    let invalid = visitor
        .contact
        .submit(state.backend.as_ref(), Some(&session), draft)
        .await
        .err()
        .map(|e| e.to_string());

    let (draft, status) = visitor.contact.snapshot();
    let auth = visitor.session.state();
    let main = content::contact(&draft, status, invalid.as_deref()).map_err(render_failed)?;
    let html = page(
        Some(Route::Contact),
        title(Route::Contact),
        content::contact_refresh(status).as_ref(),
        &auth,
        &MenuView::default(),
        main,
    )?;
    let jar = sync_session_cookie(jar, &visitor, &state);
    Ok((jar, html).into_response())
}

#[cfg(test)]
#[path = "contact_test.rs"]
mod tests;
