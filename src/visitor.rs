//! Visitors: server-side state for one browser.
//!
//! ARCHITECTURE
//! ============
//! A visitor is keyed by an opaque cookie and owns its own session
//! provider, per-form submit latches, and contact form state. The
//! registry keeps visitors in memory; a sweeper task drops idle ones, and
//! dropping a visitor aborts any timers its views scheduled. Plain page
//! views from a browser the registry does not know are served by a
//! transient anonymous visitor; a browser is registered once it posts a
//! credential form or starts OAuth, or presents a refresh token. The
//! registry is capped on top of that.
//!
//! Sessions survive a server restart through a second cookie holding the
//! refresh token: an unknown visitor id with a refresh token starts a new
//! visitor whose provider restores from that token.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::backend::{Backend, SessionTokens};
use crate::forms::SubmitLatch;
use crate::forms::contact::ContactView;
use crate::session::SessionProvider;

pub const VISITOR_COOKIE: &str = "devfolio_visitor";
pub const REFRESH_COOKIE: &str = "devfolio_refresh";

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_VISITORS: usize = 10_000;

/// Random 32-byte hex visitor id.
#[must_use]
pub fn generate_visitor_id() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    let mut id = String::with_capacity(64);
    for b in bytes {
        let _ = write!(id, "{b:02x}");
    }
    id
}

pub struct Visitor {
    pub id: String,
    pub session: Arc<SessionProvider>,
    pub login_latch: SubmitLatch,
    pub register_latch: SubmitLatch,
    pub profile_latch: SubmitLatch,
    pub contact: ContactView,
    /// PKCE verifier of the OAuth flow in progress.
    oauth_verifier: Mutex<Option<String>>,
    last_seen: Mutex<Instant>,
}

impl Visitor {
    #[must_use]
    pub fn new(id: String, session: Arc<SessionProvider>) -> Self {
        Self {
            id,
            session,
            login_latch: SubmitLatch::default(),
            register_latch: SubmitLatch::default(),
            profile_latch: SubmitLatch::default(),
            contact: ContactView::new(),
            oauth_verifier: Mutex::new(None),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    pub fn set_oauth_verifier(&self, verifier: String) {
        *self.oauth_verifier.lock().unwrap_or_else(PoisonError::into_inner) = Some(verifier);
    }

    /// The verifier is single use.
    #[must_use]
    pub fn take_oauth_verifier(&self) -> Option<String> {
        self.oauth_verifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Clone)]
pub struct VisitorRegistry {
    visitors: Arc<RwLock<HashMap<String, Arc<Visitor>>>>,
    capacity: usize,
}

impl Default for VisitorRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_VISITORS)
    }
}

impl VisitorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding at most `capacity` visitors. Registering past the
    /// cap drops the longest-idle visitor first.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { visitors: Arc::default(), capacity: capacity.max(1) }
    }

    /// Find the visitor for `id`, or register a new one. A new visitor's
    /// provider restores from `refresh_token` when one is given.
    /// Returns the visitor and whether it was registered by this call.
    pub async fn resolve(
        &self,
        backend: &Arc<dyn Backend>,
        id: Option<&str>,
        refresh_token: Option<&str>,
    ) -> (Arc<Visitor>, bool) {
        if let Some(visitor) = self.existing(id).await {
            return (visitor, false);
        }
        (self.register(backend, refresh_token).await, true)
    }

    /// Like `resolve`, but a browser with no known id and no refresh token
    /// gets a transient anonymous visitor that is never registered.
    pub async fn lookup(
        &self,
        backend: &Arc<dyn Backend>,
        id: Option<&str>,
        refresh_token: Option<&str>,
    ) -> (Arc<Visitor>, bool) {
        if let Some(visitor) = self.existing(id).await {
            return (visitor, false);
        }
        if refresh_token.is_some_and(|token| !token.is_empty()) {
            return (self.register(backend, refresh_token).await, true);
        }
        let provider = Arc::new(SessionProvider::anonymous(Arc::clone(backend)));
        (Arc::new(Visitor::new(generate_visitor_id(), provider)), false)
    }

    async fn existing(&self, id: Option<&str>) -> Option<Arc<Visitor>> {
        let visitor = self.get(id?).await?;
        visitor.touch();
        Some(visitor)
    }

    async fn register(&self, backend: &Arc<dyn Backend>, refresh_token: Option<&str>) -> Arc<Visitor> {
        let stored = refresh_token
            .filter(|token| !token.is_empty())
            .map(SessionTokens::from_refresh_token);
        let restoring = stored.is_some();
        let provider = Arc::new(SessionProvider::new(Arc::clone(backend), stored));
        let visitor = Arc::new(Visitor::new(generate_visitor_id(), provider));

        let mut visitors = self.visitors.write().await;
        while visitors.len() >= self.capacity {
            let Some(idlest) = visitors
                .iter()
                .max_by_key(|(_, v)| v.idle_for())
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            visitors.remove(&idlest);
            tracing::debug!(visitor_id = %idlest, "visitor dropped at capacity");
        }
        visitors.insert(visitor.id.clone(), Arc::clone(&visitor));
        drop(visitors);

        tracing::debug!(visitor_id = %visitor.id, restoring, "visitor created");
        visitor
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Visitor>> {
        self.visitors.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.visitors.read().await.len()
    }

    /// Drop visitors idle for at least `ttl`. Returns how many were dropped.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut visitors = self.visitors.write().await;
        let before = visitors.len();
        visitors.retain(|_, visitor| visitor.idle_for() < ttl);
        before - visitors.len()
    }
}

/// Spawn the task that evicts idle visitors every `interval`.
pub fn spawn_visitor_sweeper(registry: VisitorRegistry, ttl: Duration, interval: Duration) -> JoinHandle<()> {
    tracing::info!(ttl_secs = ttl.as_secs(), interval_secs = interval.as_secs(), "visitor sweeper configured");
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let evicted = registry.evict_idle(ttl).await;
            if evicted > 0 {
                let remaining = registry.len().await;
                tracing::info!(evicted, remaining, "evicted idle visitors");
            }
        }
    })
}

#[cfg(test)]
#[path = "visitor_test.rs"]
mod tests;
