//! Route authorizer: the navigation guard
//!
//! Reads the rules declared on the route being entered, runs them through
//! the [`RuleEngine`] and turns a denial into an [`AuthorizationError`] that
//! is both returned to the router and published to rejection subscribers.

use crate::engine::{RuleEngine, Verdict};
use crate::error::{AuthorizationError, ConfigurationError, GuardError, Result};
use crate::rule::Denial;
use crate::types::{Route, RuleContext};

use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Pending outcome of a navigation guard
pub type Guard = BoxFuture<'static, std::result::Result<(), GuardError>>;

/// Rejections buffered per subscriber before the slowest one lags
const REJECTION_CHANNEL_CAPACITY: usize = 64;

/// Host router view: the route currently being entered
pub trait RouteSource: Send + Sync {
    fn current(&self) -> Option<Arc<Route>>;
}

#[derive(Clone)]
pub struct RouteAuthorizer {
    engine: RuleEngine,
    routes: Arc<dyn RouteSource>,
    rejections: broadcast::Sender<AuthorizationError>,
}

impl RouteAuthorizer {
    pub fn new(engine: RuleEngine, routes: Arc<dyn RouteSource>) -> Self {
        let (rejections, _) = broadcast::channel(REJECTION_CHANNEL_CAPACITY);
        Self {
            engine,
            routes,
            rejections,
        }
    }

    /// Receive every rejection published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<AuthorizationError> {
        self.rejections.subscribe()
    }

    /// Authorize the route the router is currently entering
    ///
    /// Routes without rules pass immediately. Otherwise all rules run with
    /// the route as context; a denial fails the guard with
    /// [`GuardError::Rejected`] after publishing it to subscribers. A denial
    /// whose payload has an unsupported shape fails with
    /// [`GuardError::Configuration`] and is not published.
    ///
    /// Unknown middleware fails here, before any rule is invoked.
    pub fn authorize_current_route(&self) -> Result<Guard> {
        let Some(route) = self.routes.current() else {
            debug!("No current route, nothing to authorize");
            return Ok(future::ok(()).boxed());
        };

        let Some(rules) = route.authorization.as_ref().and_then(|a| a.rules.as_ref()) else {
            debug!("Route {} requires no authorization", route.original_path);
            return Ok(future::ok(()).boxed());
        };

        debug!(
            "Authorizing route {} against {} rules",
            route.original_path,
            rules.len()
        );

        let verdict = self
            .engine
            .execute(rules, &RuleContext::Route(Arc::clone(&route)))?;

        Ok(conclude(verdict, route, self.rejections.clone()).boxed())
    }

    /// Zero-argument navigation guard for the router's resolve step
    ///
    /// Setup errors surface as a failed guard instead of a synchronous error.
    pub fn guard(&self) -> impl Fn() -> Guard + Send + Sync + 'static {
        let authorizer = self.clone();
        move || match authorizer.authorize_current_route() {
            Ok(guard) => guard,
            Err(e) => future::err(GuardError::Configuration(e)).boxed(),
        }
    }
}

async fn conclude(
    verdict: Verdict,
    route: Arc<Route>,
    rejections: broadcast::Sender<AuthorizationError>,
) -> std::result::Result<(), GuardError> {
    let denial = match verdict.await {
        Ok(()) => {
            debug!("Route {} authorized", route.original_path);
            return Ok(());
        }
        Err(denial) => denial,
    };

    let error = normalize(denial)?.with_route(Arc::clone(&route));
    info!("Route {} rejected: {}", route.original_path, error);

    if rejections.send(error.clone()).is_err() {
        debug!("No rejection subscribers");
    }

    Err(GuardError::Rejected(error))
}

fn normalize(denial: Denial) -> Result<AuthorizationError> {
    match denial {
        Denial::Silent => Ok(AuthorizationError::new()),
        Denial::Redirect(path) => Ok(AuthorizationError::redirect(path)),
        Denial::Error(error) => Ok(error),
        Denial::Malformed(value) => Err(ConfigurationError::InvalidRejection(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MiddlewareRegistry;
    use crate::rule::{Outcome, Rule};
    use crate::types::RouteAuthorization;

    struct Fixed(Option<Arc<Route>>);

    impl RouteSource for Fixed {
        fn current(&self) -> Option<Arc<Route>> {
            self.0.clone()
        }
    }

    fn authorizer(route: Option<Route>) -> RouteAuthorizer {
        RouteAuthorizer::new(
            RuleEngine::new(MiddlewareRegistry::new()),
            Arc::new(Fixed(route.map(Arc::new))),
        )
    }

    #[test]
    fn test_normalize_payloads() {
        assert!(normalize(Denial::Silent).unwrap().redirect_path().is_none());
        assert_eq!(
            normalize(Denial::Redirect("/bar".into())).unwrap().redirect_path(),
            Some("/bar")
        );
        assert!(matches!(
            normalize(Denial::Malformed(serde_json::json!(3))),
            Err(ConfigurationError::InvalidRejection(_))
        ));
    }

    #[tokio::test]
    async fn test_no_current_route_passes() {
        let guard = authorizer(None).authorize_current_route().unwrap();
        assert!(guard.await.is_ok());
    }

    #[tokio::test]
    async fn test_rejection_is_published() {
        let route = Route::new("/admin").with_authorization(RouteAuthorization::new(vec![
            Rule::new(|_| Outcome::redirect("/login")).into(),
        ]));
        let authorizer = authorizer(Some(route));
        let mut rejections = authorizer.subscribe();

        let err = authorizer.authorize_current_route().unwrap().await.unwrap_err();
        let rejection = err.as_rejection().unwrap();
        assert_eq!(rejection.redirect_path(), Some("/login"));
        assert_eq!(rejection.route().unwrap().original_path, "/admin");

        let published = rejections.recv().await.unwrap();
        assert_eq!(published.redirect_path(), Some("/login"));
    }

    #[tokio::test]
    async fn test_guard_folds_setup_errors() {
        let route = Route::new("/admin")
            .with_authorization(RouteAuthorization::new(vec!["isAdmin".into()]));
        let guard = authorizer(Some(route)).guard();

        let err = guard().await.unwrap_err();
        assert!(matches!(
            err,
            GuardError::Configuration(ConfigurationError::UnknownMiddleware(_))
        ));
    }
}
