//! # Routeguard Demo
//!
//! Walks an in-memory router through a few guarded navigations and prints
//! where each one lands.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `ROUTEGUARD_DEFAULT_REDIRECT_PATH` - Fallback redirect (default: /)
//! - `RUST_LOG` - Log level (default: info)

use routeguard_authz::{
    ActionAuthorizer, AuthorizationConfig, Denial, MemoryRouter, MiddlewareRegistry, Navigation,
    RedirectResolver, Route, RouteAuthorizer, Rule, RuleEngine,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting routeguard demo v{}", routeguard_authz::VERSION);

    let config = AuthorizationConfig::from_env();
    let signed_in = Arc::new(AtomicBool::new(false));

    let registry = MiddlewareRegistry::new();
    let session = Arc::clone(&signed_in);
    registry
        .register(
            "isAuthenticated",
            Rule::new(move |_| session.load(Ordering::SeqCst).into()),
        )?
        .register(
            "isAdmin",
            Rule::from_async(|_| async {
                // Stand-in for a remote role lookup
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err::<(), _>(Denial::Redirect("/forbidden".to_string()))
            }),
        )?;

    let engine = RuleEngine::new(registry);

    let (failures_tx, mut failures_rx) = mpsc::unbounded_channel();
    let router = Arc::new(MemoryRouter::new().with_failures(failures_tx));
    let authorizer = RouteAuthorizer::new(engine.clone(), router.clone());
    let resolver = RedirectResolver::new(config, router.clone());
    let guard = authorizer.guard();

    let routes: Vec<Route> = serde_json::from_value(json!([
        { "path": "/" },
        {
            "path": "/projects/:id",
            "params": { "id": "42" },
            "authorization": { "rules": ["isAuthenticated"], "onReject": "/login" }
        },
        {
            "path": "/admin",
            "authorization": { "rules": ["isAuthenticated", "isAdmin"] }
        }
    ]))?;

    for signed in [false, true] {
        signed_in.store(signed, Ordering::SeqCst);
        info!("Signed in: {}", signed);

        for route in &routes {
            let navigation = router.navigate(route.clone(), &guard).await?;
            if navigation == Navigation::Rejected {
                while let Ok(failure) = failures_rx.try_recv() {
                    resolver.handle(&failure)?;
                }
            }
            info!("{} -> {:?}, location {}", route.path(), navigation, router.location());
        }
    }

    let actions = ActionAuthorizer::new(engine.clone());
    actions
        .add_action("project.view", vec!["isAuthenticated".into()])
        .add_action("project.delete", vec!["isAuthenticated".into(), "isAdmin".into()]);

    let allowed = actions.allowed_actions(["project.view", "project.delete"])?;
    allowed.settled().await;
    info!("Allowed actions: {:?}", allowed.snapshot());

    info!("Engine metrics: {:?}", engine.metrics());
    Ok(())
}
