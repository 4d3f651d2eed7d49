//! Route descriptors and the context handed to rules

use crate::interpolate::interpolate;
use crate::rule::RuleRef;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Route parameters by placeholder name
pub type RouteParams = HashMap<String, String>;

/// Route descriptor as seen by the authorization engine
#[derive(Debug, Clone, Deserialize)]
pub struct Route {
    /// Path template (e.g., "/projects/:id/edit")
    #[serde(rename = "path")]
    pub original_path: String,

    /// Parameters last used to reach this route
    #[serde(default)]
    pub params: RouteParams,

    /// Rules guarding this route; `None` means no authorization required
    #[serde(default)]
    pub authorization: Option<RouteAuthorization>,
}

impl Route {
    /// Create a route from its path template
    pub fn new(original_path: impl Into<String>) -> Self {
        Self {
            original_path: original_path.into(),
            params: HashMap::new(),
            authorization: None,
        }
    }

    /// Add a route parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Attach authorization rules
    pub fn with_authorization(mut self, authorization: RouteAuthorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Concrete path: the template interpolated with the route params
    pub fn path(&self) -> String {
        interpolate(&self.original_path, &self.params)
    }
}

/// Authorization declared on a route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAuthorization {
    /// Ordered rules; a non-array value in a route table deserializes to `None`
    #[serde(default, deserialize_with = "deserialize_rules")]
    pub rules: Option<Vec<RuleRef>>,

    /// Destination when a rule rejects without naming one; a present key,
    /// `null` included, is always kept
    #[serde(default, deserialize_with = "deserialize_on_reject")]
    pub on_reject: Option<OnReject>,
}

impl RouteAuthorization {
    pub fn new(rules: Vec<RuleRef>) -> Self {
        Self {
            rules: Some(rules),
            on_reject: None,
        }
    }

    pub fn on_reject(mut self, on_reject: OnReject) -> Self {
        self.on_reject = Some(on_reject);
        self
    }
}

fn deserialize_rules<'de, D>(deserializer: D) -> Result<Option<Vec<RuleRef>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(RuleRef::Named(name)),
                other => Err(serde::de::Error::custom(format!(
                    "rule reference must be a middleware name, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        _ => Ok(None),
    }
}

fn deserialize_on_reject<'de, D>(deserializer: D) -> Result<Option<OnReject>, D::Error>
where
    D: Deserializer<'de>,
{
    OnReject::deserialize(deserializer).map(Some)
}

/// Route-level redirect used when the rejection carries no path
#[derive(Clone)]
pub enum OnReject {
    /// Fixed destination
    Path(String),

    /// Computed from the rejected route
    Resolve(Arc<dyn Fn(&Route) -> String + Send + Sync>),

    /// Anything else found in a route table
    Malformed(Value),
}

impl OnReject {
    pub fn resolve<F>(f: F) -> Self
    where
        F: Fn(&Route) -> String + Send + Sync + 'static,
    {
        OnReject::Resolve(Arc::new(f))
    }
}

impl fmt::Debug for OnReject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnReject::Path(path) => f.debug_tuple("Path").field(path).finish(),
            OnReject::Resolve(_) => f.write_str("Resolve(..)"),
            OnReject::Malformed(value) => f.debug_tuple("Malformed").field(value).finish(),
        }
    }
}

impl<'de> Deserialize<'de> for OnReject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(path) => OnReject::Path(path),
            other => OnReject::Malformed(other),
        })
    }
}

/// Opaque value passed unchanged to every rule of one execution
#[derive(Debug, Clone, Default)]
pub enum RuleContext {
    /// Navigation check for this route
    Route(Arc<Route>),

    /// Action check, no navigation involved
    #[default]
    Detached,
}

impl RuleContext {
    pub fn route(&self) -> Option<&Route> {
        match self {
            RuleContext::Route(route) => Some(route),
            RuleContext::Detached => None,
        }
    }
}
