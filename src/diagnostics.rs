//! Diagnostics: manual probes of the hosted service.
//!
//! SYSTEM CONTEXT
//! ==============
//! Nothing here runs on the request path. The `diagnose` and
//! `seed-test-user` subcommands call these helpers, print the report, and
//! exit. Each probe is a plain sequence of backend calls; the first failing
//! subsystem ends the connectivity run and is recorded in the report.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::backend::{Backend, BackendError, ErrorKind, NewProfile, PROFILES_TABLE, Profile, Session, SignUpRequest};
use crate::config::ConfigError;
use crate::session::PLACEHOLDER_ADDRESS;

pub const TEST_EMAIL: &str = "test@example.com";
pub const TEST_PASSWORD: &str = "Test123!@#";
pub const TEST_FULL_NAME: &str = "Test User";

/// Tables probed by `tables`.
pub const TABLES: [&str; 2] = [PROFILES_TABLE, "projects"];

/// Channel joined by the realtime probe.
pub const REALTIME_CHANNEL: &str = "test";
pub const REALTIME_WAIT: Duration = Duration::from_secs(5);

/// Time given to the backend's profile-creation trigger after sign-up.
pub const TRIGGER_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("auth signup failed: {0}")]
    SignUp(BackendError),
    #[error("no user data returned from signup")]
    NoIdentity,
    #[error("sign in failed: {0}")]
    SignIn(BackendError),
    #[error("sign in returned no session")]
    NoSession,
    #[error("manual profile creation failed: {0}")]
    ProfileInsert(BackendError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// =============================================================================
// CONNECTIVITY
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectivityReport {
    pub auth: bool,
    pub database: bool,
    pub storage: bool,
    pub realtime: bool,
    pub session_active: bool,
    pub details: BTreeMap<&'static str, String>,
    pub error: Option<String>,
}

/// Probe auth, database, storage and realtime in that order.
pub async fn connectivity(backend: &dyn Backend, session: Option<&Session>) -> ConnectivityReport {
    let mut report = ConnectivityReport::default();
    if let Err(e) = run_connectivity(backend, session, &mut report).await {
        tracing::error!(error = %e, "connectivity check failed");
        report.error = Some(e);
    }
    tracing::info!(
        auth = report.auth,
        database = report.database,
        storage = report.storage,
        realtime = report.realtime,
        session_active = report.session_active,
        "connectivity results"
    );
    report
}

async fn run_connectivity(
    backend: &dyn Backend,
    session: Option<&Session>,
    report: &mut ConnectivityReport,
) -> Result<(), String> {
    tracing::info!("testing authentication");
    let current = backend
        .get_session(session.map(Session::tokens).as_ref())
        .await
        .map_err(|e| format!("Auth Error: {e}"))?;
    report.auth = true;
    report.session_active = current.is_some();
    report
        .details
        .insert("auth", "Authentication service is connected".into());

    tracing::info!(table = PROFILES_TABLE, "testing database");
    backend
        .probe_table(current.as_ref(), PROFILES_TABLE)
        .await
        .map_err(|e| format!("Database Error: {e}"))?;
    report.database = true;
    report.details.insert("database", "Database is accessible".into());

    tracing::info!("testing storage");
    let buckets = backend
        .list_buckets(current.as_ref())
        .await
        .map_err(|e| format!("Storage Error: {e}"))?;
    report.storage = true;
    report
        .details
        .insert("storage", format!("Storage is accessible ({} buckets)", buckets.len()));

    tracing::info!(channel = REALTIME_CHANNEL, "testing realtime");
    match backend.probe_realtime(REALTIME_CHANNEL, REALTIME_WAIT).await {
        Ok(true) => {
            report.realtime = true;
            report
                .details
                .insert("realtime", "Realtime subscription working".into());
        }
        Ok(false) => {
            report
                .details
                .insert("realtime", "Realtime join was not acknowledged".into());
        }
        Err(e) => {
            tracing::warn!(error = %e, "realtime probe failed");
            report.details.insert("realtime", e.to_string());
        }
    }
    Ok(())
}

// =============================================================================
// TABLES / RLS
// =============================================================================

/// Reachability of each table in `TABLES`.
pub async fn tables(backend: &dyn Backend, session: Option<&Session>) -> BTreeMap<&'static str, bool> {
    let mut results = BTreeMap::new();
    for table in TABLES {
        let ok = match backend.probe_table(session, table).await {
            Ok(()) => {
                tracing::info!(table, "table is accessible");
                true
            }
            Err(e) => {
                tracing::warn!(table, error = %e, "table is not accessible");
                false
            }
        };
        results.insert(table, ok);
    }
    results
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RlsReport {
    /// An unauthenticated select on `profiles` was rejected.
    pub rls_policies_working: bool,
    pub session_active: bool,
}

pub async fn rls(backend: &dyn Backend, session: Option<&Session>) -> RlsReport {
    let unauthenticated = backend.probe_table(None, PROFILES_TABLE).await;
    let report = RlsReport {
        rls_policies_working: unauthenticated.is_err(),
        session_active: session.is_some(),
    };
    if report.rls_policies_working {
        tracing::info!("unauthenticated profile access blocked");
    } else {
        tracing::warn!("unauthenticated profile access allowed; check row-level security policies");
    }
    report
}

/// Everything `devfolio diagnose` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticsReport {
    pub connectivity: ConnectivityReport,
    pub tables: BTreeMap<&'static str, bool>,
    pub rls: RlsReport,
}

/// Run the connectivity, table and RLS probes one after another.
pub async fn run_all(backend: &dyn Backend, session: Option<&Session>) -> DiagnosticsReport {
    DiagnosticsReport {
        connectivity: connectivity(backend, session).await,
        tables: tables(backend, session).await,
        rls: rls(backend, session).await,
    }
}

// =============================================================================
// TEST ACCOUNT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub user_id: Uuid,
    pub email: &'static str,
    /// `false` when the account already existed.
    pub created: bool,
}

/// Profile row of the test account, if one exists.
///
/// # Errors
///
/// Returns the backend failure.
pub async fn verify_test_user(backend: &dyn Backend) -> Result<Option<Profile>, BackendError> {
    backend.find_profile_by_email(None, TEST_EMAIL).await
}

/// Make sure the test account can sign in and has a profile row.
///
/// # Errors
///
/// Returns the step that failed.
pub async fn seed_test_user(backend: &dyn Backend, redirect_to: &str) -> Result<SeedOutcome, DiagnosticsError> {
    if let Ok(Some(existing)) = backend.sign_in_with_password(TEST_EMAIL, TEST_PASSWORD).await {
        tracing::info!(user_id = %existing.user.id, "test user already exists and credentials are valid");
        return Ok(SeedOutcome { user_id: existing.user.id, email: TEST_EMAIL, created: false });
    }

    tracing::info!("creating test user");
    let created = backend
        .sign_up(&SignUpRequest {
            email: TEST_EMAIL.to_owned(),
            password: TEST_PASSWORD.to_owned(),
            display_name: TEST_FULL_NAME.to_owned(),
            redirect_to: redirect_to.to_owned(),
        })
        .await
        .map_err(DiagnosticsError::SignUp)?;
    let identity = created.identity.ok_or(DiagnosticsError::NoIdentity)?;
    tracing::info!(user_id = %identity.id, "auth user created");

    let session = backend
        .sign_in_with_password(TEST_EMAIL, TEST_PASSWORD)
        .await
        .map_err(DiagnosticsError::SignIn)?
        .ok_or(DiagnosticsError::NoSession)?;

    tracing::info!(wait_secs = TRIGGER_WAIT.as_secs(), "waiting for profile trigger");
    tokio::time::sleep(TRIGGER_WAIT).await;

    let existing = backend.select_profile(&session, identity.id).await.ok().flatten();
    if existing.is_none() {
        tracing::warn!(user_id = %identity.id, "profile not created by trigger; inserting manually");
        let row = NewProfile {
            id: identity.id,
            full_name: TEST_FULL_NAME.to_owned(),
            email: TEST_EMAIL.to_owned(),
            address: PLACEHOLDER_ADDRESS.to_owned(),
        };
        match backend.insert_profile(&session, &row).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::DuplicateKey => {}
            Err(e) => return Err(DiagnosticsError::ProfileInsert(e)),
        }
    }

    tracing::info!(user_id = %identity.id, "test user setup completed");
    Ok(SeedOutcome { user_id: identity.id, email: TEST_EMAIL, created: true })
}

/// Verify the test account's profile, seeding the account when it is missing.
///
/// # Errors
///
/// Returns the seeding step that failed.
pub async fn ensure_test_user(backend: &dyn Backend, redirect_to: &str) -> Result<SeedOutcome, DiagnosticsError> {
    match verify_test_user(backend).await {
        Ok(Some(profile)) => {
            tracing::info!(user_id = %profile.id, "test user profile found");
            return Ok(SeedOutcome { user_id: profile.id, email: TEST_EMAIL, created: false });
        }
        Ok(None) => tracing::info!("test user profile not found"),
        Err(e) => tracing::warn!(error = %e, "test user lookup failed"),
    }
    seed_test_user(backend, redirect_to).await
}

#[cfg(test)]
#[path = "diagnostics_test.rs"]
mod tests;
