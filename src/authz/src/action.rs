//! Named action checks outside of navigation
//!
//! Actions are rule sets registered under a name ("project.delete") and
//! evaluated without a route context, typically to decide which controls
//! to show.

use crate::engine::{RuleEngine, Verdict};
use crate::error::{ConfigurationError, Result};
use crate::rule::RuleRef;
use crate::types::RuleContext;

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ActionAuthorizer {
    engine: RuleEngine,
    actions: Arc<RwLock<HashMap<String, Vec<RuleRef>>>>,
}

impl ActionAuthorizer {
    pub fn new(engine: RuleEngine) -> Self {
        Self {
            engine,
            actions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store `rules` under `name`, replacing any previous entry
    pub fn add_action(&self, name: impl Into<String>, rules: Vec<RuleRef>) -> &Self {
        let name = name.into();
        if self.actions.write().insert(name.clone(), rules).is_some() {
            debug!("Replaced action \"{}\"", name);
        }
        self
    }

    pub fn contains_action(&self, name: &str) -> bool {
        self.actions.read().contains_key(name)
    }

    /// Run the rules of a registered action
    pub fn authorize_action(&self, name: &str) -> Result<Verdict> {
        let rules = self.rules_of(name)?;
        self.engine.execute(&rules, &RuleContext::Detached)
    }

    fn rules_of(&self, name: &str) -> Result<Vec<RuleRef>> {
        self.actions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownAction(name.to_string()))
    }

    /// Rules of `name` with every middleware name already looked up
    fn resolved_rules(&self, name: &str) -> Result<Vec<RuleRef>> {
        let registry = self.engine.registry();
        self.rules_of(name)?
            .iter()
            .map(|rule| registry.resolve(rule).map(RuleRef::Inline))
            .collect()
    }

    /// Build a live view of which of `names` are currently authorized
    ///
    /// The first round of checks starts immediately.
    ///
    /// # Panics
    ///
    /// Must be called within a Tokio runtime.
    pub fn allowed_actions<I, S>(&self, names: I) -> Result<AllowedActions>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let view = AllowedActions {
            authorizer: self.clone(),
            names: names.into_iter().map(Into::into).collect(),
            state: Arc::new(Mutex::new(ViewState::default())),
            round: Mutex::new(Vec::new()),
        };
        view.refresh()?;
        Ok(view)
    }
}

#[derive(Debug, Default)]
struct ViewState {
    generation: u64,
    allowed: HashMap<String, bool>,
}

/// Live mapping of authorized actions
///
/// An action is present (mapped to `true`) while its latest check
/// approved. Each [`refresh`](Self::refresh) starts a new generation of
/// checks; results arriving from an older generation are discarded.
#[derive(Debug)]
pub struct AllowedActions {
    authorizer: ActionAuthorizer,
    names: Vec<String>,
    state: Arc<Mutex<ViewState>>,
    round: Mutex<Vec<JoinHandle<()>>>,
}

impl AllowedActions {
    /// Re-run every tracked check
    ///
    /// Fails before running anything, leaving the view as it was, if a
    /// tracked action is unknown or refers to unregistered middleware.
    pub fn refresh(&self) -> Result<()> {
        let mut checks = Vec::with_capacity(self.names.len());
        for name in &self.names {
            checks.push((name.clone(), self.authorizer.resolved_rules(name)?));
        }

        let mut verdicts = Vec::with_capacity(checks.len());
        for (name, rules) in checks {
            let verdict = self
                .authorizer
                .engine
                .execute(&rules, &RuleContext::Detached)?;
            verdicts.push((name, verdict));
        }

        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };
        debug!("Refreshing {} actions, generation {}", verdicts.len(), generation);

        let handles: Vec<_> = verdicts
            .into_iter()
            .map(|(name, verdict)| {
                let state = Arc::clone(&self.state);
                tokio::spawn(async move {
                    let allowed = verdict.await.is_ok();

                    let mut state = state.lock();
                    if state.generation != generation {
                        debug!("Discarding stale result for \"{}\" (generation {})", name, generation);
                        return;
                    }
                    if allowed {
                        state.allowed.insert(name, true);
                    } else {
                        state.allowed.remove(&name);
                    }
                })
            })
            .collect();

        // Handles of a superseded round are detached, not aborted.
        *self.round.lock() = handles;
        Ok(())
    }

    /// Wait until the latest round of checks has been applied
    pub async fn settled(&self) {
        let handles = std::mem::take(&mut *self.round.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Action check did not complete: {}", e);
            }
        }
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.state.lock().allowed.contains_key(name)
    }

    /// Copy of the current mapping
    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.state.lock().allowed.clone()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of refresh rounds issued so far
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }
}
