//! Redirect resolver: where to send the user after a denied navigation

use crate::config::AuthorizationConfig;
use crate::error::{AuthorizationError, ConfigurationError, GuardError, Result};
use crate::types::{OnReject, Route};

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Host router location: the only thing the resolver changes
pub trait Location: Send + Sync {
    fn set_path(&self, path: &str);
}

/// Notification from the host router that a navigation did not complete
#[derive(Debug)]
pub struct NavigationFailure {
    pub attempted: Arc<Route>,
    pub previous: Option<Arc<Route>>,
    pub error: anyhow::Error,
}

impl NavigationFailure {
    /// The authorization rejection behind this failure, if any
    pub fn rejection(&self) -> Option<&AuthorizationError> {
        self.error.downcast_ref::<AuthorizationError>().or_else(|| {
            self.error
                .downcast_ref::<GuardError>()
                .and_then(GuardError::as_rejection)
        })
    }
}

#[derive(Clone)]
pub struct RedirectResolver {
    config: AuthorizationConfig,
    location: Arc<dyn Location>,
}

impl RedirectResolver {
    pub fn new(config: AuthorizationConfig, location: Arc<dyn Location>) -> Self {
        Self { config, location }
    }

    pub fn config(&self) -> &AuthorizationConfig {
        &self.config
    }

    /// Pick the redirect destination for a rejected navigation
    ///
    /// First non-empty candidate wins:
    ///
    /// 1. the path carried by the rejection
    /// 2. the attempted route's `onReject`
    /// 3. the previous route, re-interpolated with its params
    /// 4. the configured default
    pub fn resolve(
        &self,
        attempted: &Route,
        previous: Option<&Route>,
        error: &AuthorizationError,
    ) -> Result<String> {
        let mut destination = error
            .redirect_path()
            .filter(|path| !path.is_empty())
            .map(str::to_string);

        if destination.is_none() {
            let on_reject = attempted
                .authorization
                .as_ref()
                .and_then(|a| a.on_reject.as_ref());

            destination = match on_reject {
                None => None,
                Some(OnReject::Path(path)) => Some(path.clone()),
                Some(OnReject::Resolve(resolve)) => Some(resolve(attempted)),
                Some(OnReject::Malformed(value)) => {
                    return Err(ConfigurationError::InvalidOnReject {
                        route: attempted.original_path.clone(),
                        value: value.to_string(),
                    })
                }
            };
        }

        Ok(match destination.filter(|path| !path.is_empty()) {
            Some(path) => path,
            None => match previous {
                Some(previous) => previous.path(),
                None => self.config.default_redirect_path.clone(),
            },
        })
    }

    /// React to a navigation failure
    ///
    /// Failures that are not authorization rejections are ignored. Returns
    /// the applied destination.
    pub fn handle(&self, failure: &NavigationFailure) -> Result<Option<String>> {
        let Some(error) = failure.rejection() else {
            warn!(
                "Navigation to {} failed without rejection: {}",
                failure.attempted.original_path, failure.error
            );
            return Ok(None);
        };

        let path = self.resolve(&failure.attempted, failure.previous.as_deref(), error)?;
        info!(
            "Redirecting rejected navigation to {} -> {}",
            failure.attempted.original_path, path
        );
        self.location.set_path(&path);

        Ok(Some(path))
    }

    /// Handle failures until the channel closes
    ///
    /// Stops at the first configuration error and returns it.
    pub async fn listen(self, mut failures: mpsc::UnboundedReceiver<NavigationFailure>) -> Result<()> {
        while let Some(failure) = failures.recv().await {
            self.handle(&failure)?;
        }
        debug!("Navigation failure channel closed");
        Ok(())
    }
}
