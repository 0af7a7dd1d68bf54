mod backend;
mod catalog;
mod config;
mod diagnostics;
mod forms;
mod gate;
mod pages;
mod routes;
mod scheduler;
mod session;
mod state;
mod visitor;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::backend::{Backend, BackendError, RestBackend};
use crate::config::{BackendConfig, ConfigError, ServerConfig};
use crate::diagnostics::DiagnosticsError;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Diagnostics(#[from] DiagnosticsError),
    #[error("server i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("report encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "devfolio", about = "Portfolio site backed by a hosted auth and table service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the site (default).
    Serve {
        /// Idle time after which a visitor's server-side state is dropped.
        #[arg(long, env = "VISITOR_IDLE_TTL_SECS", default_value_t = visitor::DEFAULT_IDLE_TTL.as_secs())]
        visitor_ttl_secs: u64,
    },
    /// Probe auth, tables, storage, realtime and row-level security.
    Diagnose {
        /// Sign in first so table probes run as this identity.
        #[arg(long, env = "DIAGNOSE_EMAIL", requires = "password")]
        email: Option<String>,
        #[arg(long, env = "DIAGNOSE_PASSWORD", requires = "email")]
        password: Option<String>,
    },
    /// Make sure the shared test account exists and has a profile.
    SeedTestUser,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve {
        visitor_ttl_secs: visitor::DEFAULT_IDLE_TTL.as_secs(),
    });

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "devfolio failed");
            ExitCode::FAILURE
        }
    }
}

fn rest_backend() -> Result<Arc<dyn Backend>, AppError> {
    let config = BackendConfig::from_env()?;
    Ok(Arc::new(RestBackend::new(&config)?))
}

async fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Serve { visitor_ttl_secs } => serve(Duration::from_secs(visitor_ttl_secs)).await,
        Command::Diagnose { email, password } => {
            let backend = rest_backend()?;
            let session = match (email, password) {
                (Some(email), Some(password)) => backend.sign_in_with_password(&email, &password).await?,
                _ => None,
            };
            let report = diagnostics::run_all(backend.as_ref(), session.as_ref()).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::SeedTestUser => {
            let backend = rest_backend()?;
            let server = ServerConfig::from_env()?;
            let outcome = diagnostics::ensure_test_user(backend.as_ref(), &server.site_url).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
    }
}

async fn serve(visitor_ttl: Duration) -> Result<(), AppError> {
    let server = ServerConfig::from_env()?;
    let backend = rest_backend()?;
    let port = server.port;
    let state = state::AppState::new(backend, server);

    let _sweeper = visitor::spawn_visitor_sweeper(state.visitors.clone(), visitor_ttl, visitor::DEFAULT_SWEEP_INTERVAL);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "devfolio listening");
    axum::serve(listener, app).await?;
    Ok(())
}
