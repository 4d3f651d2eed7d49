//! Rules and their outcomes

use crate::error::AuthorizationError;
use crate::types::RuleContext;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Eventual result of a rule that could not decide synchronously
pub type RuleFuture = BoxFuture<'static, Result<(), Denial>>;

/// Rejection payload carried by a disapproving rule
#[derive(Debug, Clone)]
pub enum Denial {
    /// Rejected without a hint
    Silent,

    /// Rejected with a redirect destination
    Redirect(String),

    /// Rejected with a prepared authorization error
    Error(AuthorizationError),

    /// Payload of an unsupported shape
    Malformed(Value),
}

impl From<AuthorizationError> for Denial {
    fn from(error: AuthorizationError) -> Self {
        Denial::Error(error)
    }
}

impl From<Value> for Denial {
    fn from(value: Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => Denial::Silent,
            Value::String(path) => Denial::Redirect(path),
            other => Denial::Malformed(other),
        }
    }
}

/// What a rule returns when invoked
pub enum Outcome {
    Approved,
    Denied(Denial),
    Pending(RuleFuture),
}

impl Outcome {
    pub fn deny() -> Self {
        Outcome::Denied(Denial::Silent)
    }

    pub fn redirect(path: impl Into<String>) -> Self {
        Outcome::Denied(Denial::Redirect(path.into()))
    }

    /// Adopt a future settling to approval or denial
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), Denial>> + Send + 'static,
    {
        Outcome::Pending(future.boxed())
    }
}

impl From<bool> for Outcome {
    fn from(approved: bool) -> Self {
        if approved {
            Outcome::Approved
        } else {
            Outcome::deny()
        }
    }
}

/// Dynamic rule answers: only `true` approves. Strings deny with a redirect,
/// anything else is handed to [`Denial`].
impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(true) => Outcome::Approved,
            other => Outcome::Denied(other.into()),
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Approved => f.write_str("Approved"),
            Outcome::Denied(denial) => f.debug_tuple("Denied").field(denial).finish(),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A unit of authorization logic
#[derive(Clone)]
pub struct Rule(Arc<dyn Fn(&RuleContext) -> Outcome + Send + Sync>);

impl Rule {
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(&RuleContext) -> Outcome + Send + Sync + 'static,
    {
        Rule(Arc::new(rule))
    }

    /// Rule whose decision is always asynchronous
    pub fn from_async<F, Fut>(rule: F) -> Self
    where
        F: Fn(&RuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Denial>> + Send + 'static,
    {
        Rule::new(move |context| Outcome::pending(rule(context)))
    }

    pub fn evaluate(&self, context: &RuleContext) -> Outcome {
        (self.0)(context)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule(..)")
    }
}

/// Entry of a rule sequence
#[derive(Debug, Clone)]
pub enum RuleRef {
    Inline(Rule),

    /// Registered middleware, resolved at execution time
    Named(String),
}

impl RuleRef {
    pub fn name(&self) -> Option<&str> {
        match self {
            RuleRef::Named(name) => Some(name),
            RuleRef::Inline(_) => None,
        }
    }
}

impl From<Rule> for RuleRef {
    fn from(rule: Rule) -> Self {
        RuleRef::Inline(rule)
    }
}

impl From<&str> for RuleRef {
    fn from(name: &str) -> Self {
        RuleRef::Named(name.to_string())
    }
}

impl From<String> for RuleRef {
    fn from(name: String) -> Self {
        RuleRef::Named(name)
    }
}
