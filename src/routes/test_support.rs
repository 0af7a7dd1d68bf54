//! Request builders and response readers for router tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use axum_extra::extract::cookie::Cookie;
use tower::ServiceExt;

use crate::backend::mock::{self, MockBackend};
use crate::backend::Session;
use crate::state::test_helpers::test_app_state;

use super::app;

/// Router over a fresh mock backend.
pub fn test_app() -> (Router, Arc<MockBackend>) {
    let (state, mock) = test_app_state();
    (app(state), mock)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(path: &str, cookies: &str) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(path: &str, body: &str, cookies: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

/// Decoded `(name, value)` of every `Set-Cookie` header.
pub fn set_cookies(response: &Response<Body>) -> Vec<(String, String)> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| Cookie::parse_encoded(raw.to_owned()).ok())
        .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
        .collect()
}

pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, value)| value)
}

/// `Cookie` request header carrying every non-empty cookie the response set.
pub fn cookie_header(response: &Response<Body>) -> String {
    set_cookies(response)
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Sign a new visitor in through `POST /login`. Returns the cookies to
/// send on later requests and the session the mock handed out.
pub async fn sign_in(app: &Router, mock: &MockBackend) -> (String, Session) {
    let session = mock::session("jane@example.com");
    mock.push_sign_in(Ok(Some(session.clone())));
    let response = send(app, post_form("/login", "email=jane%40example.com&password=secret1", "")).await;
    assert_eq!(location(&response), Some("/"));
    (cookie_header(&response), session)
}
