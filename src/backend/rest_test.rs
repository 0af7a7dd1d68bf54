use super::*;

const USER_JSON: &str = r#"{"id":"6f1c2a4e-0000-4000-8000-000000000001","email":"jane@example.com","identities":[{"provider":"email"}]}"#;

// =============================================================================
// parse_token
// =============================================================================

#[test]
fn parse_token_keeps_explicit_expiry() {
    let body = format!(
        r#"{{"access_token":"a","token_type":"bearer","expires_in":3600,"expires_at":1700003600,"refresh_token":"r","user":{USER_JSON}}}"#
    );
    let session = parse_token(&body, 1_000).unwrap();
    assert_eq!(session.access_token, "a");
    assert_eq!(session.refresh_token, "r");
    assert_eq!(session.expires_at, Some(1_700_003_600));
    assert_eq!(session.user.email.as_deref(), Some("jane@example.com"));
}

#[test]
fn parse_token_derives_expiry_from_expires_in() {
    let body = format!(r#"{{"access_token":"a","expires_in":60,"refresh_token":"r","user":{USER_JSON}}}"#);
    let session = parse_token(&body, 1_000).unwrap();
    assert_eq!(session.expires_at, Some(1_060));
}

#[test]
fn parse_token_rejects_garbage() {
    assert!(matches!(parse_token("{}", 0), Err(BackendError::Parse(_))));
}

// =============================================================================
// parse_sign_up
// =============================================================================

#[test]
fn sign_up_with_token_grant_has_session() {
    let body = format!(r#"{{"access_token":"a","expires_in":60,"refresh_token":"r","user":{USER_JSON}}}"#);
    let response = parse_sign_up(&body, 0).unwrap();
    assert!(response.session.is_some());
    assert_eq!(response.identity.unwrap().email.as_deref(), Some("jane@example.com"));
}

#[test]
fn sign_up_with_bare_user_has_no_session() {
    let response = parse_sign_up(USER_JSON, 0).unwrap();
    assert!(response.session.is_none());
    assert!(!response.already_registered());
}

#[test]
fn sign_up_with_nested_user_and_null_session() {
    let body = r#"{"user":{"id":"6f1c2a4e-0000-4000-8000-000000000001","email":"x@y.z","identities":[]},"session":null}"#;
    let response = parse_sign_up(body, 0).unwrap();
    assert!(response.session.is_none());
    assert!(response.already_registered());
}

// =============================================================================
// AuthSettings
// =============================================================================

#[test]
fn settings_report_enabled_providers() {
    let settings: AuthSettings =
        serde_json::from_str(r#"{"external":{"google":true,"github":false,"email":true},"disable_signup":false}"#)
            .unwrap();
    assert!(settings.provider_enabled(OAuthProvider::Google));
    assert!(!settings.provider_enabled(OAuthProvider::Github));
}

#[test]
fn settings_without_provider_means_disabled() {
    let settings = AuthSettings::default();
    assert!(!settings.provider_enabled(OAuthProvider::Google));
}

// =============================================================================
// PKCE
// =============================================================================

#[test]
fn code_verifier_is_url_safe_and_unique() {
    let a = generate_code_verifier();
    let b = generate_code_verifier();
    assert_eq!(a.len(), 43);
    assert_ne!(a, b);
    assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[test]
fn code_challenge_matches_rfc7636_example() {
    // Appendix B of RFC 7636.
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(code_challenge(verifier), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
}

#[test]
fn authorize_url_carries_pkce_parameters() {
    let url = authorize_url(
        "https://demo.example.co",
        OAuthProvider::Google,
        "http://localhost:3000/auth/callback",
        "verifier",
    )
    .unwrap();
    assert!(url.starts_with("https://demo.example.co/auth/v1/authorize?"));
    assert!(url.contains("provider=google"));
    assert!(url.contains("code_challenge_method=s256"));
    assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    assert!(url.contains(&format!("code_challenge={}", code_challenge("verifier"))));
}
