//! In-memory host router
//!
//! A minimal router implementing [`RouteSource`] and [`Location`]: it runs a
//! navigation guard for every transition, commits the route on success and
//! reports failures on a channel a [`RedirectResolver`] can listen to.
//!
//! [`RedirectResolver`]: crate::redirect::RedirectResolver

use crate::error::{ConfigurationError, GuardError};
use crate::redirect::{Location, NavigationFailure};
use crate::route::{Guard, RouteSource};
use crate::types::Route;

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Result of a navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Completed,
    Rejected,
}

#[derive(Debug)]
struct RouterState {
    current: Option<Arc<Route>>,
    entering: Option<Arc<Route>>,
    location: String,
    history: Vec<String>,
}

#[derive(Debug)]
pub struct MemoryRouter {
    state: RwLock<RouterState>,
    failures: Option<mpsc::UnboundedSender<NavigationFailure>>,
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRouter {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RouterState {
                current: None,
                entering: None,
                location: "/".to_string(),
                history: Vec::new(),
            }),
            failures: None,
        }
    }

    /// Report rejected navigations on `failures`
    pub fn with_failures(mut self, failures: mpsc::UnboundedSender<NavigationFailure>) -> Self {
        self.failures = Some(failures);
        self
    }

    pub fn location(&self) -> String {
        self.state.read().location.clone()
    }

    /// Every location applied so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.state.read().history.clone()
    }

    /// Last committed route
    pub fn committed(&self) -> Option<Arc<Route>> {
        self.state.read().current.clone()
    }

    /// Enter `route`, gated by `guard`
    ///
    /// Rejections are reported, not returned: the caller only sees
    /// [`Navigation::Rejected`]. Setup errors are returned.
    pub async fn navigate<G>(&self, route: Route, guard: G) -> Result<Navigation, ConfigurationError>
    where
        G: Fn() -> Guard,
    {
        let route = Arc::new(route);
        let previous = {
            let mut state = self.state.write();
            state.entering = Some(Arc::clone(&route));
            state.current.clone()
        };

        debug!("Navigating to {}", route.path());
        let outcome = guard().await;
        self.state.write().entering = None;

        match outcome {
            Ok(()) => {
                let path = route.path();
                self.state.write().current = Some(route);
                self.set_path(&path);
                Ok(Navigation::Completed)
            }
            Err(GuardError::Rejected(error)) => {
                let failure = NavigationFailure {
                    attempted: route,
                    previous,
                    error: error.into(),
                };
                match &self.failures {
                    Some(failures) => {
                        if failures.send(failure).is_err() {
                            warn!("Navigation failure listener is gone");
                        }
                    }
                    None => warn!("Navigation rejected with no failure listener"),
                }
                Ok(Navigation::Rejected)
            }
            Err(GuardError::Configuration(e)) => Err(e),
        }
    }
}

impl RouteSource for MemoryRouter {
    fn current(&self) -> Option<Arc<Route>> {
        let state = self.state.read();
        state.entering.clone().or_else(|| state.current.clone())
    }
}

impl Location for MemoryRouter {
    fn set_path(&self, path: &str) {
        let mut state = self.state.write();
        state.location = path.to_string();
        state.history.push(path.to_string());
    }
}
