//! Counters for rule executions, exportable in Prometheus text format

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Rule sets executed
    pub executions: u64,

    /// Individual rule invocations
    pub rules_invoked: u64,

    /// Executions that settled to approval
    pub approvals: u64,

    /// Executions that settled to denial
    pub denials: u64,

    /// Pending rules that panicked
    pub rule_panics: u64,
}

impl EngineMetrics {
    /// Fraction of settled executions that approved
    pub fn approval_rate(&self) -> f64 {
        let total = self.approvals + self.denials;
        if total == 0 {
            0.0
        } else {
            self.approvals as f64 / total as f64
        }
    }
}

/// Lock-free metrics collector shared by engine handles
#[derive(Debug, Default)]
pub struct MetricsCollector {
    executions: AtomicU64,
    rules_invoked: AtomicU64,
    approvals: AtomicU64,
    denials: AtomicU64,
    rule_panics: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_execution(&self, rules: usize) {
        self.executions.fetch_add(1, Ordering::Relaxed);
        self.rules_invoked.fetch_add(rules as u64, Ordering::Relaxed);
    }

    /// Record how an execution settled
    pub fn record_verdict(&self, approved: bool) {
        if approved {
            self.approvals.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denials.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_panic(&self) {
        self.rule_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn get_metrics(&self) -> EngineMetrics {
        EngineMetrics {
            executions: self.executions.load(Ordering::Relaxed),
            rules_invoked: self.rules_invoked.load(Ordering::Relaxed),
            approvals: self.approvals.load(Ordering::Relaxed),
            denials: self.denials.load(Ordering::Relaxed),
            rule_panics: self.rule_panics.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let metrics = self.get_metrics();

        format!(
            r#"# HELP routeguard_executions_total Rule sets executed
# TYPE routeguard_executions_total counter
routeguard_executions_total {}

# HELP routeguard_rules_invoked_total Individual rule invocations
# TYPE routeguard_rules_invoked_total counter
routeguard_rules_invoked_total {}

# HELP routeguard_approvals_total Executions settled to approval
# TYPE routeguard_approvals_total counter
routeguard_approvals_total {}

# HELP routeguard_denials_total Executions settled to denial
# TYPE routeguard_denials_total counter
routeguard_denials_total {}

# HELP routeguard_rule_panics_total Pending rules that panicked
# TYPE routeguard_rule_panics_total counter
routeguard_rule_panics_total {}
"#,
            metrics.executions,
            metrics.rules_invoked,
            metrics.approvals,
            metrics.denials,
            metrics.rule_panics,
        )
    }
}
