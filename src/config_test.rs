use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

// =============================================================================
// BackendConfig
// =============================================================================

#[test]
fn backend_config_reads_required_values() {
    let cfg = BackendConfig::from_lookup(lookup(&[
        ("SUPABASE_URL", "https://demo.example.co/"),
        ("SUPABASE_ANON_KEY", "anon-key"),
    ]))
    .unwrap();
    assert_eq!(cfg.url, "https://demo.example.co");
    assert_eq!(cfg.anon_key, "anon-key");
    assert_eq!(
        cfg.timeouts,
        BackendTimeouts {
            request_secs: DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS
        }
    );
}

#[test]
fn backend_config_accepts_vite_prefixed_names() {
    let cfg = BackendConfig::from_lookup(lookup(&[
        ("VITE_SUPABASE_URL", "https://demo.example.co"),
        ("VITE_SUPABASE_ANON_KEY", "k"),
    ]))
    .unwrap();
    assert_eq!(cfg.url, "https://demo.example.co");
}

#[test]
fn backend_config_missing_url_is_fatal() {
    let err = BackendConfig::from_lookup(lookup(&[("SUPABASE_ANON_KEY", "k")])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("SUPABASE_URL"));
}

#[test]
fn backend_config_missing_key_is_fatal() {
    let err = BackendConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://demo.example.co")])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("SUPABASE_ANON_KEY"));
}

#[test]
fn backend_config_blank_values_count_as_missing() {
    let err = BackendConfig::from_lookup(lookup(&[("SUPABASE_URL", "  "), ("SUPABASE_ANON_KEY", "k")])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("SUPABASE_URL"));
}

#[test]
fn backend_config_url_without_protocol_is_fatal() {
    let err = BackendConfig::from_lookup(lookup(&[
        ("SUPABASE_URL", "demo.example.co"),
        ("SUPABASE_ANON_KEY", "k"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { var: "SUPABASE_URL", .. }), "got {err:?}");
}

#[test]
fn backend_config_rejects_non_http_scheme() {
    let err = BackendConfig::from_lookup(lookup(&[
        ("SUPABASE_URL", "ftp://demo.example.co"),
        ("SUPABASE_ANON_KEY", "k"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { .. }));
}

#[test]
fn backend_config_timeouts_override() {
    let cfg = BackendConfig::from_lookup(lookup(&[
        ("SUPABASE_URL", "https://demo.example.co"),
        ("SUPABASE_ANON_KEY", "k"),
        ("BACKEND_REQUEST_TIMEOUT_SECS", "5"),
        ("BACKEND_CONNECT_TIMEOUT_SECS", "not-a-number"),
    ]))
    .unwrap();
    assert_eq!(cfg.timeouts.request_secs, 5);
    assert_eq!(cfg.timeouts.connect_secs, DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS);
}

// =============================================================================
// ServerConfig
// =============================================================================

#[test]
fn server_config_defaults() {
    let cfg = ServerConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.site_url, "http://localhost:3000");
    assert!(!cfg.cookie_secure);
    assert_eq!(cfg.oauth_callback_url(), "http://localhost:3000/auth/callback");
}

#[test]
fn server_config_infers_secure_cookies_from_https_site() {
    let cfg = ServerConfig::from_lookup(lookup(&[("SITE_URL", "https://folio.example.com/")])).unwrap();
    assert_eq!(cfg.site_url, "https://folio.example.com");
    assert!(cfg.cookie_secure);
}

#[test]
fn server_config_explicit_cookie_secure_wins() {
    let cfg = ServerConfig::from_lookup(lookup(&[("SITE_URL", "https://folio.example.com"), ("COOKIE_SECURE", "off")]))
        .unwrap();
    assert!(!cfg.cookie_secure);
}

#[test]
fn server_config_invalid_port() {
    let err = ServerConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidPort("http".into()));
}

#[test]
fn parse_bool_variants() {
    for raw in ["1", "true", "YES", " on "] {
        assert_eq!(parse_bool(raw), Some(true), "{raw:?}");
    }
    for raw in ["0", "False", "no", "off"] {
        assert_eq!(parse_bool(raw), Some(false), "{raw:?}");
    }
    assert_eq!(parse_bool("maybe"), None);
}
