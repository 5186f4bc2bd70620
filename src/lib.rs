//! # Meshestra ORM
//!
//! Database integration for Meshestra-style modular applications: a
//! process-wide registry of named data sources, and scoped repository
//! handles for the feature modules that use them.
//!
//! ## Features
//!
//! - **Root modules**: declare a data source from static options
//!   ([`OrmModule::for_root`]) or from options produced at startup by a
//!   factory, an injectable class or an existing provider
//!   ([`OrmModule::for_root_async`])
//! - **Feature modules**: declare the entities a module needs and receive one
//!   [`Repository`] per entity ([`OrmModule::for_feature`])
//! - **Named data sources**: any number of data sources side by side, each
//!   with its own container token
//! - **Atomic publication**: a data source is visible only once it is fully
//!   opened; a failed initialization leaves nothing behind
//! - **Axum extractors**: [`Inject`] and [`InjectRepository`] resolve from the
//!   application container
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshestra_orm::lifecycle::Application;
//! use meshestra_orm::orm::MemoryConnectionProvider;
//! use meshestra_orm::prelude::*;
//! use meshestra_orm::{DataSourceOptions, DatabaseType, OrmModule};
//!
//! #[derive(Entity)]
//! pub struct User;
//!
//! #[derive(Entity)]
//! pub struct Post;
//!
//! #[tokio::main]
//! async fn main() -> meshestra_orm::Result<()> {
//!     let app = Application::builder()
//!         .connection_provider(Arc::new(MemoryConnectionProvider::new()))
//!         .root(OrmModule::for_root(
//!             DataSourceOptions::new(DatabaseType::Mysql)
//!                 .host("localhost")
//!                 .port(3306)
//!                 .username("root")
//!                 .password("root")
//!                 .database("test"),
//!         ))
//!         .feature(
//!             FeatureRegistration::default()
//!                 .entity::<User>()
//!                 .entity::<Post>(),
//!         )
//!         .build()
//!         .await?;
//!
//!     let users = app.container().resolve_named::<Repository>("UserRepository")?;
//!     println!("users live in {}", users.data_source()?.name());
//!
//!     app.shutdown().await
//! }
//! ```

extern crate self as meshestra_orm;

pub mod config;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod module;
pub mod orm;

// Re-export core types
pub use config::{ConfigModule, ConfigService};
pub use di::{
    Container, ContainerBuilder, HasContainer, Inject, InjectRepository, Injectable,
    ResolvedDependencies,
};
pub use error::{OrmError, Result};
pub use module::Module;
pub use orm::{
    AsyncDataSourceOptions, DataSourceHandle, DataSourceOptions, DataSourceOptionsFactory,
    DataSourceRegistry, DatabaseType, Entity, EntityId, FeatureRegistration, OrmModule,
    Repository,
};

// Re-export macros
pub use meshestra_orm_macro::{Entity as DeriveEntity, Injectable as DeriveInjectable, module};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use meshestra_orm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigModule, ConfigService};
    pub use crate::di::{Container, ContainerBuilder, HasContainer, Inject, InjectRepository, Injectable};
    pub use crate::error::{OrmError, Result};
    pub use crate::lifecycle::{
        Application, ApplicationBuilder, LifecycleManager, OnApplicationBootstrap,
        OnApplicationShutdown, OnModuleDestroy, OnModuleInit,
    };
    pub use crate::module::Module;
    pub use crate::orm::{
        AsyncDataSourceOptions, DataSourceOptionsFactory, Entity, FeatureRegistration, OrmModule,
        Repository,
    };
    pub use crate::{DeriveEntity as Entity, DeriveInjectable as Injectable, module};
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
