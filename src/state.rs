//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the backend client, the visitor registry, and server settings.
//! Clone is required by Axum; every field is Arc-wrapped or cheap to clone.

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::ServerConfig;
use crate::visitor::VisitorRegistry;

/// How long a page request waits for a visitor's session restore before
/// rendering the loading view instead.
pub const DEFAULT_RESTORE_GRACE: std::time::Duration = std::time::Duration::from_millis(1500);

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub visitors: VisitorRegistry,
    pub config: Arc<ServerConfig>,
    pub restore_grace: std::time::Duration,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, config: ServerConfig) -> Self {
        Self {
            backend,
            visitors: VisitorRegistry::new(),
            config: Arc::new(config),
            restore_grace: DEFAULT_RESTORE_GRACE,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
