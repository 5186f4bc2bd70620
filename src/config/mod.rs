use crate::di::Container;
use crate::error::{OrmError, Result};
use crate::module::Module;
use dashmap::DashMap;
use std::env;
use std::sync::Arc;

/// Token under which [`ConfigModule`] registers the [`ConfigService`].
pub const CONFIG_SERVICE_TOKEN: &str = "ConfigService";

/// Configuration service
///
/// A flat key/value store, usually filled from the process environment and
/// injected into async data source factories.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Load every environment variable.
    pub fn new() -> Self {
        Self::from_pairs(env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let service = Self::default();
        for (key, value) in pairs {
            service.config.insert(key.into(), value.into());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a value that must be present.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| OrmError::configuration(format!("missing configuration key '{}'", key)))
    }

    /// Parse a boolean flag: `true`/`false`/`1`/`0`/`yes`/`no`.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(OrmError::configuration(format!(
                "{} is not a boolean: '{}'",
                key, raw
            ))),
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Registers a [`ConfigService`] loaded from the environment, both by type and
/// under [`CONFIG_SERVICE_TOKEN`].
pub struct ConfigModule;

impl Module for ConfigModule {
    fn register(container: &mut Container) -> Result<()> {
        let service = ConfigService::new();
        container.register_named(CONFIG_SERVICE_TOKEN, service.clone());
        container.register(service);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let config = ConfigService::from_pairs([("DB_LOGGING", "Yes"), ("DB_SYNC", "maybe")]);

        assert_eq!(config.get_bool("DB_LOGGING").unwrap(), Some(true));
        assert_eq!(config.get_bool("DB_MISSING").unwrap(), None);
        assert!(config.get_bool("DB_SYNC").is_err());
        assert_eq!(config.get_or("DB_HOST", "localhost"), "localhost");
        assert!(config.require("DB_HOST").is_err());

        config.set("DB_HOST", "db");
        assert_eq!(config.require("DB_HOST").unwrap(), "db");
    }

    #[test]
    fn module_registers_by_type_and_token() {
        let mut container = Container::new();
        ConfigModule::register(&mut container).unwrap();

        assert!(container.resolve::<ConfigService>().is_ok());
        assert!(
            container
                .resolve_named::<ConfigService>(CONFIG_SERVICE_TOKEN)
                .is_ok()
        );
    }
}
