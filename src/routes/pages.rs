//! Gated page rendering for GET requests.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::catalog::CategoryFilter;
use crate::gate::{self, GateDecision, GateState, Route};
use crate::pages::auth::AuthFormView;
use crate::pages::content::{self, LOADING_RETRY};
use crate::pages::layout::{MenuView, navbar};
use crate::pages::{self as views, Refresh, document};
use crate::session::AuthState;
use crate::state::AppState;
use crate::visitor::Visitor;

use super::{lookup_visitor, render_failed, sync_session_cookie};

/// Product filter parameters. Other pages ignore them.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
}

#[must_use]
pub fn title(route: Route) -> &'static str {
    match route {
        Route::Login => "Sign In",
        Route::Register => "Create Account",
        Route::Home => "Home",
        Route::Products => "Products",
        Route::About => "About",
        Route::Contact => "Contact",
    }
}

/// Full document: shell, navbar for `auth`, and `main`.
pub(crate) fn page(
    active: Option<Route>,
    title: &str,
    refresh: Option<&Refresh>,
    auth: &AuthState,
    menu: &MenuView,
    main: String,
) -> Result<Html<String>, StatusCode> {
    let nav = navbar(active, auth, menu).map_err(render_failed)?;
    document(title, refresh, nav, main)
        .map(Html)
        .map_err(render_failed)
}

/// Render a route the gate allowed.
pub(crate) fn render_route(
    route: Route,
    visitor: &Visitor,
    auth: &AuthState,
    query: &PageQuery,
    menu: &MenuView,
) -> Result<Html<String>, StatusCode> {
    let mut refresh = None;
    let main = match route {
        Route::Login => views::auth::login(&AuthFormView { busy: visitor.login_latch.is_busy(), ..AuthFormView::default() }),
        Route::Register => {
            views::auth::register(&AuthFormView { busy: visitor.register_latch.is_busy(), ..AuthFormView::default() })
        }
        Route::Home => content::home(auth.session().is_some()),
        Route::Products => content::products(&query.q, query.category.parse::<CategoryFilter>().unwrap_or_default()),
        Route::About => content::about(),
        Route::Contact => {
            let (draft, status) = visitor.contact.snapshot();
            refresh = content::contact_refresh(status);
            content::contact(&draft, status, None)
        }
    }
    .map_err(render_failed)?;
    page(Some(route), title(route), refresh.as_ref(), auth, menu, main)
}

/// Every page GET, including unregistered paths.
pub async fn gated(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    query: Result<Query<PageQuery>, QueryRejection>,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    if method != Method::GET && method != Method::HEAD {
        return Err(StatusCode::METHOD_NOT_ALLOWED);
    }
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let (visitor, jar) = lookup_visitor(&state, jar).await;
    let auth = visitor.session.wait_ready(state.restore_grace).await;
    let jar = sync_session_cookie(jar, &visitor, &state);

    let response = match gate::resolve(GateState::from(&auth), uri.path()) {
        GateDecision::Placeholder => {
            let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
            let refresh = Refresh::to_request(target, LOADING_RETRY);
            let main = content::loading().map_err(render_failed)?;
            page(None, "Loading", Some(&refresh), &auth, &MenuView::default(), main)?.into_response()
        }
        GateDecision::Redirect(target) => Redirect::temporary(target).into_response(),
        GateDecision::NotFound => {
            let main = content::not_found().map_err(render_failed)?;
            (StatusCode::NOT_FOUND, page(None, "Not Found", None, &auth, &MenuView::default(), main)?).into_response()
        }
        GateDecision::Render(route) => render_route(route, &visitor, &auth, &query, &MenuView::default())?.into_response(),
    };
    Ok((jar, response).into_response())
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
