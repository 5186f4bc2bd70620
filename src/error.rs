use crate::orm::ConnectionError;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrmError>;

#[derive(Debug, Error)]
pub enum OrmError {
    /// Malformed options, or a second registration for an existing data source name.
    #[error("Invalid data source configuration: {message}")]
    Configuration { message: String },

    /// A dependency requested by an async initializer could not be produced.
    #[error("Unresolved dependency '{token}': {source}")]
    UnresolvedDependency {
        token: String,
        #[source]
        source: Box<OrmError>,
    },

    #[error("Data source '{name}' is not registered")]
    UnknownDataSource { name: String },

    /// The connection provider refused the options. The provider error is kept as-is.
    #[error("Connection provider rejected data source '{name}': {source}")]
    ProviderOpen {
        name: String,
        #[source]
        source: ConnectionError,
    },

    #[error("Failed to close data source '{name}': {source}")]
    ProviderClose {
        name: String,
        #[source]
        source: ConnectionError,
    },

    #[error("Data source '{name}' has been closed")]
    DataSourceClosed { name: String },

    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Lifecycle hook failed for {service}: {source}")]
    HookFailed {
        service: String,
        #[source]
        source: Box<OrmError>,
    },

    #[error("Timeout during {phase} after {after:?}")]
    Timeout { phase: String, after: Duration },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrmError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unresolved(token: impl Into<String>, source: OrmError) -> Self {
        Self::UnresolvedDependency {
            token: token.into(),
            source: Box::new(source),
        }
    }

    pub fn unknown_data_source(name: impl Into<String>) -> Self {
        Self::UnknownDataSource { name: name.into() }
    }
}

impl axum::response::IntoResponse for OrmError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            OrmError::UnknownDataSource { .. } | OrmError::DataSourceClosed { .. } => {
                axum::http::StatusCode::SERVICE_UNAVAILABLE
            }
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
