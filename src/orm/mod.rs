//! Data sources and repositories
//!
//! ```text
//! OrmModule::for_root / for_root_async      OrmModule::for_feature
//!            │                                       │
//!            ▼                                       ▼
//!   DataSourceRegistry::initialize[_async] ──► register_feature
//!            │ publishes                             │ borrows (Weak)
//!            ▼                                       ▼
//!        DataSource  ◄──────────────────────────  Repository
//! ```
//!
//! A data source is opened once per name through the [`ConnectionProvider`]
//! and owned by the registry. Feature modules only ever get [`Repository`]
//! handles that point back at it.

mod async_options;
mod connection;
mod data_source;
mod entity;
mod feature;
mod module;
mod options;
mod registry;
mod tokens;

pub use async_options::{
    AsyncDataSourceOptions, DataSourceOptionsFactory, OptionsStrategy, ProviderRef,
};
pub use connection::{
    Connection, ConnectionError, ConnectionProvider, MemoryConnection, MemoryConnectionProvider,
};
pub use data_source::{DataSource, DataSourceHandle};
pub use entity::{Entity, EntityId};
pub use feature::{FeatureRegistration, Repository};
pub use module::{OrmModule, RootModule};
pub use options::{DEFAULT_DATA_SOURCE, DataSourceOptions, DatabaseType};
pub use registry::DataSourceRegistry;
pub use tokens::{data_source_token, repository_token};
