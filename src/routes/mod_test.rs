use std::time::Duration;

use axum::http::StatusCode;

use super::test_support::*;
use crate::backend::mock;
use crate::pages::escaped;
use crate::state::test_helpers::test_app_state;
use crate::visitor::{REFRESH_COOKIE, VISITOR_COOKIE};

// =============================================================================
// gate over HTTP
// =============================================================================

#[tokio::test]
async fn healthz_is_ok() {
    let (app, _) = test_app();
    let response = send(&app, get("/healthz", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_home_redirects_to_login() {
    let (app, _) = test_app();
    let response = send(&app, get("/", "")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    assert_eq!(set_cookie(&response, VISITOR_COOKIE), None);
}

#[tokio::test]
async fn cookieless_page_views_register_no_visitors() {
    let (state, mock) = test_app_state();
    let app = super::app(state.clone());

    for path in ["/login", "/register", "/", "/no/such/page"].into_iter().cycle().take(200) {
        let response = send(&app, get(path, "")).await;
        assert!(set_cookies(&response).is_empty(), "{path}");
    }
    assert_eq!(state.visitors.len().await, 0);
    assert_eq!(mock.call_count("get_session"), 0);

    let response = send(&app, post_form("/login", "email=&password=x", "")).await;
    let visitor = set_cookie(&response, VISITOR_COOKIE).unwrap();
    assert_eq!(visitor.len(), 64);
    assert_eq!(state.visitors.len().await, 1);
}

#[tokio::test]
async fn anonymous_sees_login_page() {
    let (app, _) = test_app();
    let response = send(&app, get("/login", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Welcome Back"));
    assert!(body.contains("<title>Sign In | ToolsHelp</title>"));
}

#[tokio::test]
async fn anonymous_unknown_path_redirects_to_login() {
    let (app, _) = test_app();
    let response = send(&app, get("/no/such/page", "")).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn signed_in_unknown_path_is_not_found() {
    let (app, mock) = test_app();
    let (cookies, _) = sign_in(&app, &mock).await;
    let response = send(&app, get("/no/such/page", &cookies)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page not found"));
}

#[tokio::test]
async fn signed_in_public_page_redirects_home() {
    let (app, mock) = test_app();
    let (cookies, _) = sign_in(&app, &mock).await;
    let response = send(&app, get("/register", &cookies)).await;
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn signed_in_home_renders_profile_menu() {
    let (app, mock) = test_app();
    let (cookies, _) = sign_in(&app, &mock).await;
    let response = send(&app, get("/", &cookies)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Featured Products"));
    assert!(body.contains("profile-menu"));
    assert!(!body.contains("Get Started"));
}

#[tokio::test]
async fn products_query_filters_cards() {
    let (app, mock) = test_app();
    let (cookies, _) = sign_in(&app, &mock).await;
    let response = send(&app, get("/products?q=task&category=Bogus", &cookies)).await;
    let body = body_text(response).await;
    assert!(body.contains("TaskMaster"));
    assert!(!body.contains("ExpenseSplit"));
    assert!(body.contains(r#"class="chip active" type="submit" name="category" value="All""#));
}

#[tokio::test]
async fn post_to_page_path_is_rejected() {
    let (app, _) = test_app();
    let response = send(&app, post_form("/about", "", "")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// session cookies
// =============================================================================

#[tokio::test]
async fn sign_in_sets_refresh_cookie() {
    let (app, mock) = test_app();
    let session = mock::session("jane@example.com");
    mock.push_sign_in(Ok(Some(session.clone())));
    let response = send(&app, post_form("/login", "email=jane%40example.com&password=secret1", "")).await;
    assert_eq!(set_cookie(&response, REFRESH_COOKIE), Some(session.refresh_token));
}

#[tokio::test]
async fn refresh_cookie_restores_session_for_new_visitor() {
    let (app, mock) = test_app();
    mock.push_get_session(Ok(Some(mock::session("jane@example.com"))));
    let response = send(&app, get("/about", &format!("{REFRESH_COOKIE}=refresh-jane"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Our Mission"));
}

#[tokio::test]
async fn rejected_refresh_cookie_is_cleared() {
    let (app, _) = test_app();
    let response = send(&app, get("/login", &format!("{REFRESH_COOKIE}=stale"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie(&response, REFRESH_COOKIE).as_deref(), Some(""));
}

#[tokio::test]
async fn slow_restore_renders_loading_view() {
    let (mut state, mock) = test_app_state();
    state.restore_grace = Duration::from_millis(10);
    *mock.get_session_delay.lock().unwrap() = Some(Duration::from_secs(2));
    let app = super::app(state);

    let response = send(&app, get("/products?q=x", &format!("{REFRESH_COOKIE}=refresh-jane"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Loading..."));
    let refresh = format!(r#"content="1;url={}""#, escaped("/products?q=x"));
    assert!(body.contains(&refresh));
}
