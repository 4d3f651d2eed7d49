//! # Routeguard Authorization Engine
//!
//! Navigation-time authorization: before a route transition completes, an
//! ordered set of rules must all approve it. A denied transition is turned
//! into a redirect.
//!
//! ## Features
//!
//! - **Async-first rule engine** using the Tokio runtime: rules answer
//!   synchronously or with a future, first denial wins
//! - **Named middleware** shared between routes and actions
//! - **Redirect resolution** from the rejection, the route, the previous
//!   route, or a configured default
//! - **Action checks** with live, refreshable allowed-actions views
//! - **Declarative route tables** deserialized from JSON
//!
//! ## Example
//!
//! ```rust
//! use routeguard_authz::{
//!     MiddlewareRegistry, Outcome, Route, RouteAuthorization, Rule, RuleContext, RuleEngine,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = MiddlewareRegistry::new();
//!     registry.register("isAuthenticated", Rule::new(|_| Outcome::redirect("/login")))?;
//!
//!     let engine = RuleEngine::new(registry);
//!     let route = Route::new("/admin")
//!         .with_authorization(RouteAuthorization::new(vec!["isAuthenticated".into()]));
//!
//!     let rules = route.authorization.as_ref().and_then(|a| a.rules.clone()).unwrap_or_default();
//!     let verdict = engine.execute(&rules, &RuleContext::Route(route.into()))?.await;
//!
//!     assert!(verdict.is_err());
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod interpolate;
pub mod redirect;
pub mod registry;
pub mod route;
pub mod router;
pub mod rule;
pub mod types;

// Re-export commonly used types
pub use action::{ActionAuthorizer, AllowedActions};
pub use config::AuthorizationConfig;
pub use engine::{EngineMetrics, RuleEngine, Verdict};
pub use error::{AuthorizationError, ConfigurationError, GuardError, Result};
pub use interpolate::interpolate;
pub use redirect::{Location, NavigationFailure, RedirectResolver};
pub use registry::MiddlewareRegistry;
pub use route::{Guard, RouteAuthorizer, RouteSource};
pub use router::{MemoryRouter, Navigation};
pub use rule::{Denial, Outcome, Rule, RuleFuture, RuleRef};
pub use types::{OnReject, Route, RouteAuthorization, RouteParams, RuleContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
