//! Error types for the authorization engine

use crate::types::Route;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Setup errors: malformed middleware, unknown names, invalid rejections.
///
/// These are programmer errors in rule or route configuration. They are
/// returned synchronously and never converted into a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Middleware name is empty or blank
    #[error("Invalid middleware name: {0:?}")]
    InvalidMiddlewareName(String),

    /// Middleware registered twice under the same name
    #[error("Middleware \"{0}\" is already registered")]
    DuplicateMiddleware(String),

    /// Middleware lookup for a name that was never registered
    #[error("Unknown middleware: \"{0}\"")]
    UnknownMiddleware(String),

    /// Action authorized before it was added
    #[error("Unknown action: \"{0}\"")]
    UnknownAction(String),

    /// A rule rejected with a payload that is neither empty, a path, nor an
    /// authorization error
    #[error("Invalid rejection payload: {0}")]
    InvalidRejection(String),

    /// Route declares an `onReject` that is neither a path nor a resolver
    #[error("Invalid onReject for route \"{route}\": {value}")]
    InvalidOnReject { route: String, value: String },
}

/// Expected rejection: a rule legitimately denied access.
///
/// `route` is attached by the route authorizer once the rejection is
/// normalized; rule authors only set the redirect path.
#[derive(Clone, Default, Error)]
#[error("Authorization rejected{}", display_redirect(.redirect_path))]
pub struct AuthorizationError {
    redirect_path: Option<String>,
    route: Option<Arc<Route>>,
}

fn display_redirect(path: &Option<String>) -> String {
    match path {
        Some(path) => format!(", redirect to {path}"),
        None => String::new(),
    }
}

impl AuthorizationError {
    /// Rejection without a redirect hint
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejection carrying an explicit destination
    pub fn redirect(path: impl Into<String>) -> Self {
        Self {
            redirect_path: Some(path.into()),
            route: None,
        }
    }

    pub fn redirect_path(&self) -> Option<&str> {
        self.redirect_path.as_deref()
    }

    /// The rejected route, once attached
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub(crate) fn with_route(mut self, route: Arc<Route>) -> Self {
        self.route = Some(route);
        self
    }
}

impl fmt::Debug for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationError")
            .field("redirect_path", &self.redirect_path)
            .field("route", &self.route.as_ref().map(|r| r.original_path.as_str()))
            .finish()
    }
}

/// Failure of a navigation guard
#[derive(Debug, Clone, Error)]
pub enum GuardError {
    /// Navigation denied; resolves to a redirect
    #[error(transparent)]
    Rejected(AuthorizationError),

    /// Rule or route setup is broken
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl GuardError {
    pub fn as_rejection(&self) -> Option<&AuthorizationError> {
        match self {
            GuardError::Rejected(error) => Some(error),
            GuardError::Configuration(_) => None,
        }
    }
}

/// Result type for authorization setup operations
pub type Result<T> = std::result::Result<T, ConfigurationError>;
