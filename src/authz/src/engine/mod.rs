//! Rule execution engine
//!
//! Runs an ordered rule set against one context and folds the individual
//! outcomes into a single verdict.
//!
//! ```text
//! rules ─→ resolve (registry) ─→ invoke all, in order ─→ Approved  ─┐
//!                                                      ├→ Denied    ─┼→ first failure wins
//!                                                      └→ Pending ─→ spawn ─┘
//! ```

pub mod metrics;

pub use metrics::{EngineMetrics, MetricsCollector};

use crate::error::Result;
use crate::registry::MiddlewareRegistry;
use crate::rule::{Denial, Outcome, RuleRef};
use crate::types::RuleContext;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, warn};

/// Aggregate decision of one execution: `Ok` approves, `Err` carries the
/// payload of the first denial to settle
pub type Verdict = BoxFuture<'static, std::result::Result<(), Denial>>;

/// Executes rule sets; cheap to clone
#[derive(Debug, Clone)]
pub struct RuleEngine {
    registry: MiddlewareRegistry,
    metrics: Arc<MetricsCollector>,
}

impl RuleEngine {
    /// Create an engine resolving named rules against `registry`
    pub fn new(registry: MiddlewareRegistry) -> Self {
        Self {
            registry,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    pub fn registry(&self) -> &MiddlewareRegistry {
        &self.registry
    }

    /// Get engine metrics
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.get_metrics()
    }

    pub fn export_prometheus(&self) -> String {
        self.metrics.export_prometheus()
    }

    /// Run `rules` against `context`
    ///
    /// Every rule is invoked exactly once, synchronously and in order, before
    /// this returns. The returned verdict succeeds only if every rule
    /// approves; it fails with the first denial to settle. Synchronous
    /// denials settle before any pending rule, in rule order.
    ///
    /// Pending rules are spawned and always run to completion. Once the
    /// verdict has settled the remaining ones are ignored, so any side
    /// effects they carry may still happen after the caller has moved on.
    ///
    /// Fails without invoking anything if a named rule is not registered.
    ///
    /// # Panics
    ///
    /// Must be called within a Tokio runtime when any rule returns
    /// [`Outcome::Pending`].
    pub fn execute(&self, rules: &[RuleRef], context: &RuleContext) -> Result<Verdict> {
        let resolved = rules
            .iter()
            .map(|rule| self.registry.resolve(rule))
            .collect::<Result<Vec<_>>>()?;

        self.metrics.record_execution(resolved.len());

        let mut first_denial = None;
        let mut pending = FuturesUnordered::new();

        for (index, rule) in resolved.iter().enumerate() {
            match rule.evaluate(context) {
                Outcome::Approved => {}
                Outcome::Denied(denial) => {
                    debug!("Rule #{} denied synchronously: {:?}", index, denial);
                    first_denial.get_or_insert(denial);
                }
                Outcome::Pending(task) => pending.push(tokio::spawn(task)),
            }
        }

        debug!(
            "Invoked {} rules, {} pending",
            resolved.len(),
            pending.len()
        );

        let metrics = Arc::clone(&self.metrics);
        Ok(async move {
            let verdict = settle(first_denial, pending, &metrics).await;
            metrics.record_verdict(verdict.is_ok());
            verdict
        }
        .boxed())
    }
}

async fn settle(
    first_denial: Option<Denial>,
    mut pending: FuturesUnordered<JoinHandle<std::result::Result<(), Denial>>>,
    metrics: &MetricsCollector,
) -> std::result::Result<(), Denial> {
    if let Some(denial) = first_denial {
        return Err(denial);
    }

    // Dropping the remaining handles detaches their tasks.
    while let Some(joined) = pending.next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(denial)) => return Err(denial),
            Err(e) => return Err(join_failure(e, metrics)),
        }
    }

    Ok(())
}

/// A rule task that never produced an answer denies silently
fn join_failure(e: JoinError, metrics: &MetricsCollector) -> Denial {
    if e.is_panic() {
        error!("Pending rule panicked: {}", e);
        metrics.record_panic();
    } else {
        warn!("Pending rule was cancelled: {}", e);
    }
    Denial::Silent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use crate::rule::Rule;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_empty_rule_set_approves() {
        let engine = RuleEngine::new(MiddlewareRegistry::new());
        let verdict = engine.execute(&[], &RuleContext::Detached).unwrap();
        assert!(verdict.await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_middleware_aborts_before_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let rule = Rule::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Outcome::Approved
        });

        let engine = RuleEngine::new(MiddlewareRegistry::new());
        let err = engine
            .execute(&[rule.into(), "missing".into()], &RuleContext::Detached)
            .err()
            .unwrap();

        assert_eq!(err, ConfigurationError::UnknownMiddleware("missing".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.metrics().executions, 0);
    }

    #[tokio::test]
    async fn test_metrics_follow_verdicts() {
        let engine = RuleEngine::new(MiddlewareRegistry::new());

        let approve: RuleRef = Rule::new(|_| Outcome::Approved).into();
        let deny: RuleRef = Rule::new(|_| Outcome::deny()).into();

        engine.execute(&[approve.clone()], &RuleContext::Detached).unwrap().await.unwrap();
        let _ = engine.execute(&[approve, deny], &RuleContext::Detached).unwrap().await;

        let metrics = engine.metrics();
        assert_eq!(metrics.executions, 2);
        assert_eq!(metrics.rules_invoked, 3);
        assert_eq!(metrics.approvals, 1);
        assert_eq!(metrics.denials, 1);
    }

    async fn exploding() -> std::result::Result<(), Denial> {
        panic!("rule exploded")
    }

    #[tokio::test]
    async fn test_panicking_rule_denies() {
        let engine = RuleEngine::new(MiddlewareRegistry::new());
        let rule: RuleRef = Rule::from_async(|_| exploding()).into();

        let verdict = engine.execute(&[rule], &RuleContext::Detached).unwrap().await;

        assert!(matches!(verdict, Err(Denial::Silent)));
        assert_eq!(engine.metrics().rule_panics, 1);
    }

    #[tokio::test]
    async fn test_cancelled_rule_denies_without_counting_a_panic() {
        let metrics = MetricsCollector::new();
        let task = tokio::spawn(futures::future::pending::<()>());
        task.abort();
        let cancelled = task.await.unwrap_err();
        assert!(cancelled.is_cancelled());

        assert!(matches!(join_failure(cancelled, &metrics), Denial::Silent));
        assert_eq!(metrics.get_metrics().rule_panics, 0);
    }
}
