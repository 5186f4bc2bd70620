//! Data source options
//!
//! [`DataSourceOptions`] describes how to reach a database. It is built in
//! code, deserialized from JSON, or read from a [`ConfigService`], and is
//! always validated before a data source is opened.

use crate::config::ConfigService;
use crate::error::{OrmError, Result};
use crate::orm::EntityId;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Name used when a data source is registered without an explicit name.
pub const DEFAULT_DATA_SOURCE: &str = "default";

/// Supported database engines.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Mysql,
    Mariadb,
    #[strum(to_string = "postgres", serialize = "postgresql")]
    #[serde(alias = "postgresql")]
    Postgres,
    Sqlite,
    Mssql,
    Mongodb,
}

impl DatabaseType {
    /// Port used when the options leave it unset. `None` for embedded engines.
    pub fn default_port(self) -> Option<u16> {
        match self {
            DatabaseType::Mysql | DatabaseType::Mariadb => Some(3306),
            DatabaseType::Postgres => Some(5432),
            DatabaseType::Mssql => Some(1433),
            DatabaseType::Mongodb => Some(27017),
            DatabaseType::Sqlite => None,
        }
    }

    /// Embedded engines are reached through a file path rather than a host.
    pub fn is_embedded(self) -> bool {
        matches!(self, DatabaseType::Sqlite)
    }
}

fn default_name() -> String {
    DEFAULT_DATA_SOURCE.to_string()
}

/// Connection description for a single data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceOptions {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(rename = "type")]
    pub database_type: DatabaseType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    /// Entities known to the data source up front.
    #[serde(default)]
    pub entities: Vec<EntityId>,
    /// Add entities to the data source as feature modules register them.
    #[serde(default)]
    pub auto_load_entities: bool,
    #[serde(default)]
    pub synchronize: bool,
    #[serde(default)]
    pub logging: bool,
    /// Driver-specific settings handed to the connection provider untouched.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DataSourceOptions {
    pub fn new(database_type: DatabaseType) -> Self {
        Self {
            name: default_name(),
            database_type,
            host: None,
            port: None,
            username: None,
            password: None,
            database: None,
            entities: Vec::new(),
            auto_load_entities: false,
            synchronize: false,
            logging: false,
            extra: serde_json::Map::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn entities<I, E>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityId>,
    {
        self.entities.extend(entities.into_iter().map(Into::into));
        self
    }

    pub fn auto_load_entities(mut self, enabled: bool) -> Self {
        self.auto_load_entities = enabled;
        self
    }

    pub fn synchronize(mut self, enabled: bool) -> Self {
        self.synchronize = enabled;
        self
    }

    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| OrmError::configuration(format!("invalid options document: {}", e)))
    }

    /// Read options from configuration keys sharing `prefix`.
    ///
    /// Recognized keys: `TYPE` (required), `HOST`, `PORT`, `USERNAME`,
    /// `PASSWORD`, `DATABASE`, `NAME`, `SYNCHRONIZE`, `LOGGING`,
    /// `AUTO_LOAD_ENTITIES`. With prefix `"DB_"` the type is read from `DB_TYPE`.
    pub fn from_config(config: &ConfigService, prefix: &str) -> Result<Self> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let raw_type = config.require(&key("TYPE"))?;
        let database_type = raw_type.parse::<DatabaseType>().map_err(|_| {
            let supported: Vec<String> = DatabaseType::iter().map(|t| t.to_string()).collect();
            OrmError::configuration(format!(
                "unsupported database type '{}', expected one of: {}",
                raw_type,
                supported.join(", ")
            ))
        })?;

        let mut options = Self::new(database_type);
        if let Some(name) = config.get(&key("NAME")) {
            options.name = name;
        }
        options.host = config.get(&key("HOST"));
        options.username = config.get(&key("USERNAME"));
        options.password = config.get(&key("PASSWORD"));
        options.database = config.get(&key("DATABASE"));
        if let Some(port) = config.get(&key("PORT")) {
            options.port = Some(port.trim().parse::<u16>().map_err(|_| {
                OrmError::configuration(format!("{} is not a valid port: '{}'", key("PORT"), port))
            })?);
        }
        options.synchronize = config.get_bool(&key("SYNCHRONIZE"))?.unwrap_or(false);
        options.logging = config.get_bool(&key("LOGGING"))?.unwrap_or(false);
        options.auto_load_entities = config
            .get_bool(&key("AUTO_LOAD_ENTITIES"))?
            .unwrap_or(false);
        Ok(options)
    }

    /// Check required fields and fill in engine defaults.
    pub fn validated(mut self) -> Result<Self> {
        if self.name.trim().is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err(OrmError::configuration(format!(
                "data source name '{}' must be non-empty and contain no whitespace",
                self.name
            )));
        }

        if blank(&self.database) {
            return Err(OrmError::configuration(format!(
                "data source '{}': database is required for {}",
                self.name, self.database_type
            )));
        }

        if !self.database_type.is_embedded() {
            if blank(&self.host) {
                return Err(OrmError::configuration(format!(
                    "data source '{}': host is required for {}",
                    self.name, self.database_type
                )));
            }
            match self.port {
                Some(0) => {
                    return Err(OrmError::configuration(format!(
                        "data source '{}': port must be greater than zero",
                        self.name
                    )));
                }
                None => self.port = self.database_type.default_port(),
                Some(_) => {}
            }
        }

        if self.password.is_some() && blank(&self.username) {
            return Err(OrmError::configuration(format!(
                "data source '{}': password given without a username",
                self.name
            )));
        }

        if self.entities.iter().any(|e| e.as_str().trim().is_empty()) {
            return Err(OrmError::configuration(format!(
                "data source '{}': entity names must be non-empty",
                self.name
            )));
        }

        Ok(self)
    }

    /// Connection URL without the password, suitable for logs.
    pub fn redacted_url(&self) -> String {
        let database = self.database.as_deref().unwrap_or_default();
        if self.database_type.is_embedded() {
            return format!("{}://{}", self.database_type, database);
        }

        let user = match &self.username {
            Some(username) => format!("{}@", username),
            None => String::new(),
        };
        let host = self.host.as_deref().unwrap_or_default();
        match self.port {
            Some(port) => format!(
                "{}://{}{}:{}/{}",
                self.database_type, user, host, port, database
            ),
            None => format!("{}://{}{}/{}", self.database_type, user, host, database),
        }
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mysql() -> DataSourceOptions {
        DataSourceOptions::new(DatabaseType::Mysql)
            .host("localhost")
            .username("root")
            .password("root")
            .database("test")
    }

    #[test]
    fn database_type_parsing() {
        assert_eq!("MySQL".parse::<DatabaseType>().unwrap(), DatabaseType::Mysql);
        assert_eq!(
            "postgresql".parse::<DatabaseType>().unwrap(),
            DatabaseType::Postgres
        );
        assert_eq!(DatabaseType::Postgres.to_string(), "postgres");
        assert!("oracle".parse::<DatabaseType>().is_err());
        assert_eq!(DatabaseType::iter().count(), 6);
    }

    #[test]
    fn validation_fills_default_port() {
        let options = mysql().validated().unwrap();
        assert_eq!(options.port, Some(3306));
        assert_eq!(options.redacted_url(), "mysql://root@localhost:3306/test");
    }

    #[test]
    fn validation_keeps_explicit_port() {
        let options = mysql().port(3307).validated().unwrap();
        assert_eq!(options.port, Some(3307));
    }

    #[test]
    fn validation_rejects_missing_fields() {
        let no_host = DataSourceOptions::new(DatabaseType::Postgres).database("app");
        assert!(matches!(
            no_host.validated(),
            Err(OrmError::Configuration { .. })
        ));

        let no_database = DataSourceOptions::new(DatabaseType::Postgres).host("db");
        assert!(matches!(
            no_database.validated(),
            Err(OrmError::Configuration { .. })
        ));

        let zero_port = mysql().port(0);
        assert!(zero_port.validated().is_err());

        let password_only = DataSourceOptions::new(DatabaseType::Mysql)
            .host("localhost")
            .database("test")
            .password("secret");
        assert!(password_only.validated().is_err());

        let bad_name = mysql().name("read replica");
        assert!(bad_name.validated().is_err());

        let empty_entity = mysql().entities([""]);
        assert!(empty_entity.validated().is_err());
    }

    #[test]
    fn sqlite_needs_only_a_database() {
        let options = DataSourceOptions::new(DatabaseType::Sqlite)
            .database(":memory:")
            .validated()
            .unwrap();
        assert_eq!(options.port, None);
        assert_eq!(options.redacted_url(), "sqlite://:memory:");
    }

    #[test]
    fn from_json_document() {
        let options = DataSourceOptions::from_json(
            r#"{
                "type": "postgresql",
                "host": "db.internal",
                "database": "orders",
                "entities": ["Order", "LineItem"],
                "extra": { "max_connections": 10 }
            }"#,
        )
        .unwrap();

        assert_eq!(options.name, DEFAULT_DATA_SOURCE);
        assert_eq!(options.database_type, DatabaseType::Postgres);
        assert_eq!(options.entities, vec![EntityId::from("Order"), "LineItem".into()]);
        assert_eq!(options.extra["max_connections"], 10);
        assert!(DataSourceOptions::from_json("{}").is_err());
    }

    #[test]
    fn from_config_service() {
        let config = ConfigService::from_pairs([
            ("DB_TYPE", "mariadb"),
            ("DB_HOST", "localhost"),
            ("DB_PORT", "3310"),
            ("DB_USERNAME", "app"),
            ("DB_DATABASE", "shop"),
            ("DB_SYNCHRONIZE", "true"),
        ]);

        let options = DataSourceOptions::from_config(&config, "DB_").unwrap();
        assert_eq!(options.database_type, DatabaseType::Mariadb);
        assert_eq!(options.port, Some(3310));
        assert!(options.synchronize);
        assert!(!options.logging);

        config.set("DB_PORT", "not-a-port");
        assert!(DataSourceOptions::from_config(&config, "DB_").is_err());

        let empty = ConfigService::from_pairs(Vec::<(String, String)>::new());
        assert!(matches!(
            DataSourceOptions::from_config(&empty, "DB_"),
            Err(OrmError::Configuration { .. })
        ));
    }
}
