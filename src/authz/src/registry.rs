//! Middleware registry: named rules shared by routes and actions

use crate::error::{ConfigurationError, Result};
use crate::rule::{Rule, RuleRef};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Name → rule store
///
/// Cloning yields another handle onto the same storage.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareRegistry {
    middlewares: Arc<DashMap<String, Rule>>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` under `name`
    ///
    /// Fails if the name is blank or already taken. Returns the registry so
    /// registrations can be chained with `?`.
    pub fn register(&self, name: impl Into<String>, rule: Rule) -> Result<&Self> {
        let name = validate_name(name.into())?;

        match self.middlewares.entry(name) {
            Entry::Occupied(entry) => Err(ConfigurationError::DuplicateMiddleware(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!("Registered middleware \"{}\"", entry.key());
                entry.insert(rule);
                Ok(self)
            }
        }
    }

    /// Retrieve a registered rule
    pub fn lookup(&self, name: &str) -> Result<Rule> {
        let name = validate_name(name.to_string())?;
        self.middlewares
            .get(&name)
            .map(|rule| rule.value().clone())
            .ok_or(ConfigurationError::UnknownMiddleware(name))
    }

    /// Turn a rule reference into a callable rule
    pub fn resolve(&self, rule: &RuleRef) -> Result<Rule> {
        match rule {
            RuleRef::Inline(rule) => Ok(rule.clone()),
            RuleRef::Named(name) => self.lookup(name),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.middlewares.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.middlewares.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

fn validate_name(name: String) -> Result<String> {
    if name.trim().is_empty() {
        return Err(ConfigurationError::InvalidMiddlewareName(name));
    }
    Ok(name)
}
