//! Application Bootstrap
//!
//! Assembles the container, the data sources and the feature repositories
//! in a fixed order, then runs the startup hooks.

use super::{
    LifecycleManager, OnApplicationBootstrap, OnApplicationShutdown, OnModuleDestroy, OnModuleInit,
};
use crate::di::Container;
use crate::error::{OrmError, Result};
use crate::module::Module;
use crate::orm::{
    ConnectionProvider, DataSource, DataSourceHandle, DataSourceRegistry, FeatureRegistration,
    RootModule,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

type ImportFn = fn(&mut Container) -> Result<()>;

/// An assembled application: every declared data source is published and
/// every feature's repositories are in the container.
///
/// # Example
///
/// ```rust,ignore
/// use meshestra_orm::lifecycle::Application;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let app = Application::builder()
///         .connection_provider(Arc::new(MemoryConnectionProvider::new()))
///         .import::<ConfigModule>()
///         .root(OrmModule::for_root(options))
///         .feature(OrmModule::for_feature(["User", "Post"]))
///         .build()
///         .await?;
///
///     // Serve requests...
///
///     app.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct Application {
    container: Arc<Container>,
    registry: DataSourceRegistry,
    handles: Vec<DataSourceHandle>,
    lifecycle_manager: Arc<LifecycleManager>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn registry(&self) -> &DataSourceRegistry {
        &self.registry
    }

    /// Handles for the declared data sources, in declaration order.
    pub fn handles(&self) -> &[DataSourceHandle] {
        &self.handles
    }

    pub fn data_source(&self, name: &str) -> Result<Arc<DataSource>> {
        self.registry.get(name)
    }

    pub fn lifecycle_manager(&self) -> &Arc<LifecycleManager> {
        &self.lifecycle_manager
    }

    /// Run the shutdown and destroy hooks. Data sources are closed after
    /// every other destroy hook has run.
    ///
    /// Every hook runs even when an earlier one fails; the first error is
    /// returned.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application...");

        let shutdown = self.lifecycle_manager.call_application_shutdown().await;
        let destroy = self.lifecycle_manager.call_module_destroy().await;

        match shutdown.and(destroy) {
            Ok(()) => {
                tracing::info!("Application shutdown complete");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Application shutdown failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Builder for Application
pub struct ApplicationBuilder {
    container: Option<Container>,
    connection_provider: Option<Arc<dyn ConnectionProvider>>,
    imports: Vec<ImportFn>,
    roots: Vec<RootModule>,
    features: Vec<FeatureRegistration>,
    lifecycle_manager: LifecycleManager,
    init_timeout: Option<Duration>,
    bootstrap_timeout: Option<Duration>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            container: None,
            connection_provider: None,
            imports: Vec::new(),
            roots: Vec::new(),
            features: Vec::new(),
            lifecycle_manager: LifecycleManager::new(),
            init_timeout: None,
            bootstrap_timeout: None,
        }
    }

    /// Start from an existing container instead of an empty one.
    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn connection_provider(mut self, provider: Arc<dyn ConnectionProvider>) -> Self {
        self.connection_provider = Some(provider);
        self
    }

    /// Register a module's providers before any data source is initialized.
    pub fn import<M: Module>(mut self) -> Self {
        self.imports.push(M::register);
        self
    }

    /// Declare a data source. Roots are initialized in declaration order.
    pub fn root(mut self, root: RootModule) -> Self {
        self.roots.push(root);
        self
    }

    /// Declare a feature. Features are bound after every root is published.
    pub fn feature(mut self, feature: FeatureRegistration) -> Self {
        self.features.push(feature);
        self
    }

    /// Set a timeout for OnModuleInit hooks
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = Some(timeout);
        self
    }

    /// Set a timeout for OnApplicationBootstrap hooks
    pub fn bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = Some(timeout);
        self
    }

    pub fn on_init<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnModuleInit + 'static,
    {
        self.lifecycle_manager.register_init(service, name);
        self
    }

    pub fn on_bootstrap<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnApplicationBootstrap + 'static,
    {
        self.lifecycle_manager.register_bootstrap(service, name);
        self
    }

    pub fn on_shutdown<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnApplicationShutdown + 'static,
    {
        self.lifecycle_manager.register_shutdown(service, name);
        self
    }

    pub fn on_destroy<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnModuleDestroy + 'static,
    {
        self.lifecycle_manager.register_destroy(service, name);
        self
    }

    /// Build and initialize the application
    ///
    /// This will:
    /// 1. Register every imported module
    /// 2. Initialize every root data source, in declaration order
    /// 3. Bind every feature to its data source
    /// 4. Call all OnModuleInit hooks
    /// 5. Call all OnApplicationBootstrap hooks
    ///
    /// If any step fails, the data sources published so far are closed and
    /// the first error is returned.
    pub async fn build(self) -> Result<Application> {
        let provider = self
            .connection_provider
            .ok_or_else(|| OrmError::configuration("connection provider not set"))?;
        let registry = DataSourceRegistry::new(provider);

        tracing::info!("Starting application initialization...");

        let mut container = self.container.unwrap_or_default();
        let assembled = assemble(
            &registry,
            &mut container,
            self.imports,
            self.roots,
            &self.features,
        )
        .await;

        let handles = match assembled {
            Ok(handles) => handles,
            Err(e) => return Err(abort(&registry, e)),
        };

        container.register(registry.clone());

        let mut lifecycle_manager = self.lifecycle_manager;
        lifecycle_manager.register_final_destroy(
            Arc::new(RwLock::new(registry.clone())),
            "DataSourceRegistry",
        );

        if let Err(e) = run_startup_hooks(
            &lifecycle_manager,
            self.init_timeout,
            self.bootstrap_timeout,
        )
        .await
        {
            return Err(abort(&registry, e));
        }

        tracing::info!(
            "Application initialization complete ({} data sources)",
            registry.len()
        );

        Ok(Application {
            container: Arc::new(container),
            registry,
            handles,
            lifecycle_manager: Arc::new(lifecycle_manager),
        })
    }
}

async fn assemble(
    registry: &DataSourceRegistry,
    container: &mut Container,
    imports: Vec<ImportFn>,
    roots: Vec<RootModule>,
    features: &[FeatureRegistration],
) -> Result<Vec<DataSourceHandle>> {
    for import in imports {
        import(container)?;
    }

    let mut handles = Vec::with_capacity(roots.len());
    for root in roots {
        handles.push(root.register(registry, container).await?);
    }

    for feature in features {
        feature.register(registry, container)?;
    }
    Ok(handles)
}

async fn run_startup_hooks(
    manager: &LifecycleManager,
    init_timeout: Option<Duration>,
    bootstrap_timeout: Option<Duration>,
) -> Result<()> {
    match init_timeout {
        Some(timeout) => manager.call_module_init_with_timeout(timeout).await?,
        None => manager.call_module_init().await?,
    }
    match bootstrap_timeout {
        Some(timeout) => {
            manager
                .call_application_bootstrap_with_timeout(timeout)
                .await?
        }
        None => manager.call_application_bootstrap().await?,
    }
    Ok(())
}

fn abort(registry: &DataSourceRegistry, error: OrmError) -> OrmError {
    tracing::error!("Application initialization failed: {}", error);
    if let Err(e) = registry.close_all() {
        tracing::warn!("Cleanup after failed initialization: {}", e);
    }
    error
}
