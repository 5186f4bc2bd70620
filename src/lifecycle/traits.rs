//! Lifecycle hook traits
//!
//! These traits define the contract for services that need to participate
//! in application lifecycle events. Hooks run only after every data source
//! has been published and every feature module has received its
//! repositories.

use crate::error::Result;
use async_trait::async_trait;

/// Called once assembly has finished wiring data sources and repositories
///
/// Use this hook to:
/// - Check that the schema matches the registered entities
/// - Warm up caches from a repository
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl OnModuleInit for SchemaCheck {
///     async fn on_module_init(&mut self) -> Result<()> {
///         let data_source = self.users.data_source()?;
///         tracing::info!("users live in {}", data_source.name());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait OnModuleInit: Send + Sync {
    async fn on_module_init(&mut self) -> Result<()>;
}

/// Called after all OnModuleInit hooks have succeeded
///
/// This is the last hook before the application starts serving.
#[async_trait]
pub trait OnApplicationBootstrap: Send + Sync {
    async fn on_application_bootstrap(&mut self) -> Result<()>;
}

/// Called when the application starts shutting down, before any data
/// source is closed
///
/// Use this hook to stop background work that still issues queries.
#[async_trait]
pub trait OnApplicationShutdown: Send + Sync {
    async fn on_application_shutdown(&mut self) -> Result<()>;
}

/// Called during shutdown, after OnApplicationShutdown
///
/// Services are destroyed in **reverse order** of their registration. The
/// [`DataSourceRegistry`](crate::orm::DataSourceRegistry) implements this
/// hook to close its data sources.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl OnModuleDestroy for ReportExporter {
///     async fn on_module_destroy(&mut self) -> Result<()> {
///         self.flush().await
///     }
/// }
/// ```
#[async_trait]
pub trait OnModuleDestroy: Send + Sync {
    async fn on_module_destroy(&mut self) -> Result<()>;
}
