//! Route gate: maps (auth state, requested path) to what the visitor sees.
//!
//! `resolve` is a pure, total function. It never touches the session; the
//! page handler performs whatever the decision says.

use crate::session::AuthState;

/// Pages served by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Home,
    Products,
    About,
    Contact,
}

impl Route {
    pub const ALL: [Self; 6] = [
        Self::Login,
        Self::Register,
        Self::Home,
        Self::Products,
        Self::About,
        Self::Contact,
    ];

    /// Match a request path. A single trailing slash is ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = match path.strip_suffix('/') {
            Some(rest) if !rest.is_empty() && !rest.ends_with('/') => rest,
            _ => path,
        };
        Self::ALL.into_iter().find(|route| route.path() == trimmed)
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Home => "/",
            Self::Products => "/products",
            Self::About => "/about",
            Self::Contact => "/contact",
        }
    }

    /// Reachable without a session.
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Anonymous,
    Authenticated,
}

impl From<&AuthState> for GateState {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Loading => Self::Loading,
            AuthState::Anonymous => Self::Anonymous,
            AuthState::Authenticated { .. } => Self::Authenticated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Neutral loading view; no route is evaluated.
    Placeholder,
    Render(Route),
    Redirect(&'static str),
    NotFound,
}

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[must_use]
pub fn resolve(state: GateState, path: &str) -> GateDecision {
    let route = Route::from_path(path);
    match (state, route) {
        (GateState::Loading, _) => GateDecision::Placeholder,
        (GateState::Anonymous, Some(route)) if route.is_public() => GateDecision::Render(route),
        (GateState::Anonymous, _) => GateDecision::Redirect(LOGIN_PATH),
        (GateState::Authenticated, Some(route)) if route.is_public() => GateDecision::Redirect(HOME_PATH),
        (GateState::Authenticated, Some(route)) => GateDecision::Render(route),
        (GateState::Authenticated, None) => GateDecision::NotFound,
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
