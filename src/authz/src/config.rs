//! Service configuration

use serde::Deserialize;

/// Environment variable overriding [`AuthorizationConfig::default_redirect_path`]
pub const DEFAULT_REDIRECT_PATH_ENV: &str = "ROUTEGUARD_DEFAULT_REDIRECT_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorizationConfig {
    /// Last-resort redirect when neither the rejection, the route, nor a
    /// previous route provides one
    pub default_redirect_path: String,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            default_redirect_path: "/".to_string(),
        }
    }
}

impl AuthorizationConfig {
    pub fn with_default_redirect_path(mut self, path: impl Into<String>) -> Self {
        self.default_redirect_path = path.into();
        self
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(DEFAULT_REDIRECT_PATH_ENV) {
            Ok(path) if !path.is_empty() => config.with_default_redirect_path(path),
            _ => config,
        }
    }
}
