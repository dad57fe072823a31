//! Store connection configuration.
//!
//! Configuration is an explicit value handed to the component that opens the
//! connection. Nothing here writes to the process environment.

use std::fmt;
use std::time::Duration;

use crate::error::StoreError;
use crate::retry::RetryPolicy;

pub const NEO4J_URI_ENV: &str = "NEO4J_URI";
pub const NEO4J_USERNAME_ENV: &str = "NEO4J_USERNAME";
/// Older name, accepted when `NEO4J_USERNAME` is unset.
pub const NEO4J_USER_ENV: &str = "NEO4J_USER";
pub const NEO4J_PASSWORD_ENV: &str = "NEO4J_PASSWORD";
pub const KGQA_CONNECT_RETRIES_ENV: &str = "KGQA_CONNECT_RETRIES";

pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_NEO4J_USERNAME: &str = "neo4j";

#[derive(Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub username: String,
    /// `None` until resolved; the CLI prompts for it when missing.
    pub password: Option<String>,
    pub connect_retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_NEO4J_URI.to_string(),
            username: DEFAULT_NEO4J_USERNAME.to_string(),
            password: None,
            connect_retry: RetryPolicy::default().with_base_delay(Duration::from_secs(1)),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_retry", &self.connect_retry)
            .finish()
    }
}

impl StoreConfig {
    /// Read `NEO4J_URI`, `NEO4J_USERNAME` (or `NEO4J_USER`), `NEO4J_PASSWORD`
    /// and `KGQA_CONNECT_RETRIES`, falling back to defaults.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self::default();
        if let Some(uri) = get(NEO4J_URI_ENV) {
            config.uri = uri;
        }
        if let Some(user) = get(NEO4J_USERNAME_ENV).or_else(|| get(NEO4J_USER_ENV)) {
            config.username = user;
        }
        // Passwords are taken verbatim; surrounding spaces may be significant.
        config.password = lookup(NEO4J_PASSWORD_ENV).filter(|v| !v.is_empty());
        if let Some(raw) = get(KGQA_CONNECT_RETRIES_ENV) {
            let attempts = raw.parse::<u32>().map_err(|_| {
                StoreError::Config(format!(
                    "invalid {KGQA_CONNECT_RETRIES_ENV}={raw:?} (expected a positive integer)"
                ))
            })?;
            config.connect_retry = config.connect_retry.with_max_attempts(attempts);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let scheme_ok = ["bolt://", "bolt+s://", "bolt+ssc://", "neo4j://", "neo4j+s://", "neo4j+ssc://"]
            .iter()
            .any(|s| self.uri.starts_with(s));
        if !scheme_ok {
            return Err(StoreError::Config(format!(
                "{NEO4J_URI_ENV}={:?} must start with bolt:// or neo4j://",
                self.uri
            )));
        }
        if self.username.is_empty() {
            return Err(StoreError::Config("username must not be empty".to_string()));
        }
        Ok(())
    }

    /// The password, or a config error telling the user how to provide it.
    pub fn require_password(&self) -> Result<&str, StoreError> {
        self.password.as_deref().ok_or_else(|| {
            StoreError::Config(format!("no password configured (set {NEO4J_PASSWORD_ENV})"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.uri, DEFAULT_NEO4J_URI);
        assert_eq!(config.username, DEFAULT_NEO4J_USERNAME);
        assert!(config.password.is_none());
        assert!(config.require_password().is_err());
    }

    #[test]
    fn reads_all_variables() {
        let config = StoreConfig::from_lookup(lookup(&[
            (NEO4J_URI_ENV, "neo4j://db.internal:7687"),
            (NEO4J_USERNAME_ENV, "reader"),
            (NEO4J_PASSWORD_ENV, "s3cret"),
            (KGQA_CONNECT_RETRIES_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(config.uri, "neo4j://db.internal:7687");
        assert_eq!(config.username, "reader");
        assert_eq!(config.require_password().unwrap(), "s3cret");
        assert_eq!(config.connect_retry.max_attempts, 5);
    }

    #[test]
    fn legacy_user_variable_is_a_fallback() {
        let config = StoreConfig::from_lookup(lookup(&[(NEO4J_USER_ENV, "legacy")])).unwrap();
        assert_eq!(config.username, "legacy");

        let config = StoreConfig::from_lookup(lookup(&[
            (NEO4J_USER_ENV, "legacy"),
            (NEO4J_USERNAME_ENV, "current"),
        ]))
        .unwrap();
        assert_eq!(config.username, "current");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(StoreConfig::from_lookup(lookup(&[(NEO4J_URI_ENV, "http://localhost")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[(KGQA_CONNECT_RETRIES_ENV, "many")])).is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let config = StoreConfig::default().with_password("hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
