//! Lifecycle Hooks Module
//!
//! Hooks for services that need to run code once the data sources are
//! published, and again before they are closed.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Imported modules register their providers
//!    ↓
//! 2. Root data sources initialize, in declaration order
//!    ↓
//! 3. Feature repositories bind to their data sources
//!    ↓
//! 4. OnModuleInit (each service)       ← Lifecycle Hook
//!    ↓
//! 5. OnApplicationBootstrap            ← Lifecycle Hook
//!    ↓
//! [Running...]
//!    ↓
//! 6. OnApplicationShutdown             ← Lifecycle Hook
//!    ↓
//! 7. OnModuleDestroy (reverse order)   ← Lifecycle Hook
//!    ↓
//! 8. Data sources close, newest first
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use meshestra_orm::lifecycle::{OnModuleInit, OnModuleDestroy};
//! use meshestra_orm::prelude::*;
//!
//! pub struct UserCache {
//!     users: Arc<Repository>,
//! }
//!
//! #[async_trait]
//! impl OnModuleInit for UserCache {
//!     async fn on_module_init(&mut self) -> meshestra_orm::Result<()> {
//!         tracing::info!("Warming cache from {}", self.users.data_source()?.name());
//!         Ok(())
//!     }
//! }
//! ```

mod application;
mod manager;
mod traits;

pub use application::{Application, ApplicationBuilder};
pub use manager::LifecycleManager;
pub use traits::{OnApplicationBootstrap, OnApplicationShutdown, OnModuleDestroy, OnModuleInit};
