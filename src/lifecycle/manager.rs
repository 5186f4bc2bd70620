//! Lifecycle Manager
//!
//! Manages the registration and execution of lifecycle hooks.

use super::{OnApplicationBootstrap, OnApplicationShutdown, OnModuleDestroy, OnModuleInit};
use crate::error::{OrmError, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A wrapper for services that implement lifecycle hooks
struct LifecycleHook<T: ?Sized> {
    service: Arc<RwLock<T>>,
    name: String,
}

impl<T: ?Sized> LifecycleHook<T> {
    fn new(service: Arc<RwLock<T>>, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
        }
    }
}

/// What to do when a hook in a phase fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnFailure {
    Abort,
    Continue,
}

/// Manages lifecycle hooks for all registered services
///
/// Startup phases (init, bootstrap) stop at the first failing hook. Teardown
/// phases (shutdown, destroy) run every hook and then report the first
/// failure. Destroy hooks run in reverse registration order so data sources
/// opened first are closed last.
///
/// # Example
///
/// ```rust,ignore
/// use meshestra_orm::lifecycle::LifecycleManager;
///
/// let mut manager = LifecycleManager::new();
/// manager.register_init(cache_warmer.clone(), "CacheWarmer");
/// manager.register_destroy(Arc::new(RwLock::new(registry.clone())), "DataSourceRegistry");
///
/// manager.call_module_init().await?;
/// // ... application runs ...
/// manager.call_module_destroy().await?;
/// ```
pub struct LifecycleManager {
    on_init_hooks: Vec<LifecycleHook<dyn OnModuleInit>>,
    on_bootstrap_hooks: Vec<LifecycleHook<dyn OnApplicationBootstrap>>,
    on_shutdown_hooks: Vec<LifecycleHook<dyn OnApplicationShutdown>>,
    on_destroy_hooks: Vec<LifecycleHook<dyn OnModuleDestroy>>,
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self {
            on_init_hooks: Vec::new(),
            on_bootstrap_hooks: Vec::new(),
            on_shutdown_hooks: Vec::new(),
            on_destroy_hooks: Vec::new(),
        }
    }

    pub fn register_init<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnModuleInit + 'static,
    {
        self.on_init_hooks.push(LifecycleHook::new(service, name));
    }

    pub fn register_bootstrap<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnApplicationBootstrap + 'static,
    {
        self.on_bootstrap_hooks.push(LifecycleHook::new(service, name));
    }

    pub fn register_shutdown<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnApplicationShutdown + 'static,
    {
        self.on_shutdown_hooks.push(LifecycleHook::new(service, name));
    }

    pub fn register_destroy<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnModuleDestroy + 'static,
    {
        self.on_destroy_hooks.push(LifecycleHook::new(service, name));
    }

    /// Register a destroy hook that runs after every other destroy hook,
    /// regardless of when it is registered.
    pub fn register_final_destroy<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnModuleDestroy + 'static,
    {
        self.on_destroy_hooks
            .insert(0, LifecycleHook::new(service, name));
    }

    /// Execute all OnModuleInit hooks in registration order
    pub async fn call_module_init(&self) -> Result<()> {
        run_phase(
            "OnModuleInit",
            self.on_init_hooks.iter(),
            OnFailure::Abort,
            |service| service.on_module_init(),
        )
        .await
    }

    /// Execute all OnApplicationBootstrap hooks in registration order
    pub async fn call_application_bootstrap(&self) -> Result<()> {
        run_phase(
            "OnApplicationBootstrap",
            self.on_bootstrap_hooks.iter(),
            OnFailure::Abort,
            |service| service.on_application_bootstrap(),
        )
        .await
    }

    /// Execute all OnApplicationShutdown hooks in registration order
    pub async fn call_application_shutdown(&self) -> Result<()> {
        run_phase(
            "OnApplicationShutdown",
            self.on_shutdown_hooks.iter(),
            OnFailure::Continue,
            |service| service.on_application_shutdown(),
        )
        .await
    }

    /// Execute all OnModuleDestroy hooks in **reverse** registration order
    pub async fn call_module_destroy(&self) -> Result<()> {
        run_phase(
            "OnModuleDestroy",
            self.on_destroy_hooks.iter().rev(),
            OnFailure::Continue,
            |service| service.on_module_destroy(),
        )
        .await
    }

    pub async fn call_module_init_with_timeout(&self, timeout: Duration) -> Result<()> {
        with_timeout("OnModuleInit", timeout, self.call_module_init()).await
    }

    pub async fn call_application_bootstrap_with_timeout(&self, timeout: Duration) -> Result<()> {
        with_timeout(
            "OnApplicationBootstrap",
            timeout,
            self.call_application_bootstrap(),
        )
        .await
    }

    pub fn init_hook_count(&self) -> usize {
        self.on_init_hooks.len()
    }

    pub fn bootstrap_hook_count(&self) -> usize {
        self.on_bootstrap_hooks.len()
    }

    pub fn shutdown_hook_count(&self) -> usize {
        self.on_shutdown_hooks.len()
    }

    pub fn destroy_hook_count(&self) -> usize {
        self.on_destroy_hooks.len()
    }
}

async fn run_phase<'h, T, I, F>(phase: &str, hooks: I, on_failure: OnFailure, call: F) -> Result<()>
where
    T: ?Sized + 'h,
    I: Iterator<Item = &'h LifecycleHook<T>>,
    F: for<'a> Fn(&'a mut T) -> HookFuture<'a>,
{
    tracing::info!("Calling {} hooks...", phase);

    let mut executed = 0usize;
    let mut first_error = None;
    for hook in hooks {
        tracing::debug!("{}: {}", phase, hook.name);
        let mut service = hook.service.write().await;
        if let Err(e) = call(&mut *service).await {
            tracing::error!("{} failed for {}: {}", phase, hook.name, e);
            if on_failure == OnFailure::Abort {
                return Err(OrmError::HookFailed {
                    service: hook.name.clone(),
                    source: Box::new(e),
                });
            }
            first_error.get_or_insert(e);
        }
        executed += 1;
    }

    tracing::info!("{} complete ({} hooks executed)", phase, executed);
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn with_timeout(
    phase: &str,
    timeout: Duration,
    work: impl Future<Output = Result<()>>,
) -> Result<()> {
    tokio::time::timeout(timeout, work)
        .await
        .map_err(|_| OrmError::Timeout {
            phase: phase.to_string(),
            after: timeout,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        initialized: bool,
        bootstrapped: bool,
        shutdown: bool,
        destroyed: bool,
    }

    #[async_trait::async_trait]
    impl OnModuleInit for Recorder {
        async fn on_module_init(&mut self) -> Result<()> {
            self.initialized = true;
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl OnApplicationBootstrap for Recorder {
        async fn on_application_bootstrap(&mut self) -> Result<()> {
            self.bootstrapped = true;
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl OnApplicationShutdown for Recorder {
        async fn on_application_shutdown(&mut self) -> Result<()> {
            self.shutdown = true;
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl OnModuleDestroy for Recorder {
        async fn on_module_destroy(&mut self) -> Result<()> {
            self.destroyed = true;
            Ok(())
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl OnModuleInit for Failing {
        async fn on_module_init(&mut self) -> Result<()> {
            Err(OrmError::Internal("migrations pending".into()))
        }
    }

    #[async_trait::async_trait]
    impl OnModuleDestroy for Failing {
        async fn on_module_destroy(&mut self) -> Result<()> {
            Err(OrmError::DataSourceClosed {
                name: "default".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_lifecycle_hooks() {
        let recorder = Arc::new(RwLock::new(Recorder::default()));

        let mut manager = LifecycleManager::new();
        manager.register_init(Arc::clone(&recorder), "Recorder");
        manager.register_bootstrap(Arc::clone(&recorder), "Recorder");
        manager.register_shutdown(Arc::clone(&recorder), "Recorder");
        manager.register_destroy(Arc::clone(&recorder), "Recorder");

        manager.call_module_init().await.unwrap();
        manager.call_application_bootstrap().await.unwrap();
        manager.call_application_shutdown().await.unwrap();
        manager.call_module_destroy().await.unwrap();

        let recorder = recorder.read().await;
        assert!(recorder.initialized && recorder.bootstrapped && recorder.shutdown && recorder.destroyed);
    }

    #[tokio::test]
    async fn test_init_failure_stops_phase() {
        let recorder = Arc::new(RwLock::new(Recorder::default()));

        let mut manager = LifecycleManager::new();
        manager.register_init(Arc::new(RwLock::new(Failing)), "Migrations");
        manager.register_init(Arc::clone(&recorder), "Recorder");

        let err = manager.call_module_init().await.unwrap_err();
        assert!(matches!(err, OrmError::HookFailed { ref service, .. } if service == "Migrations"));
        assert!(!recorder.read().await.initialized);
    }

    #[tokio::test]
    async fn test_destroy_continues_after_failure() {
        let recorder = Arc::new(RwLock::new(Recorder::default()));

        let mut manager = LifecycleManager::new();
        manager.register_destroy(Arc::clone(&recorder), "Recorder");
        manager.register_destroy(Arc::new(RwLock::new(Failing)), "Failing");

        let err = manager.call_module_destroy().await.unwrap_err();
        assert!(matches!(err, OrmError::DataSourceClosed { .. }));
        assert!(recorder.read().await.destroyed);
    }

    #[tokio::test]
    async fn test_destroy_reverse_order() {
        let order = Arc::new(RwLock::new(Vec::new()));

        struct Ordered {
            id: usize,
            order: Arc<RwLock<Vec<usize>>>,
        }

        #[async_trait::async_trait]
        impl OnModuleDestroy for Ordered {
            async fn on_module_destroy(&mut self) -> Result<()> {
                self.order.write().await.push(self.id);
                Ok(())
            }
        }

        let mut manager = LifecycleManager::new();
        for i in 0..3 {
            let service = Arc::new(RwLock::new(Ordered {
                id: i,
                order: Arc::clone(&order),
            }));
            manager.register_destroy(service, format!("Service{}", i));
        }

        manager.call_module_destroy().await.unwrap();
        assert_eq!(*order.read().await, vec![2, 1, 0]);

        order.write().await.clear();
        let last = Arc::new(RwLock::new(Ordered {
            id: 9,
            order: Arc::clone(&order),
        }));
        manager.register_final_destroy(last, "Registry");
        manager.call_module_destroy().await.unwrap();
        assert_eq!(*order.read().await, vec![2, 1, 0, 9]);
    }

    #[tokio::test]
    async fn test_init_timeout() {
        struct Slow;

        #[async_trait::async_trait]
        impl OnModuleInit for Slow {
            async fn on_module_init(&mut self) -> Result<()> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            }
        }

        let mut manager = LifecycleManager::new();
        manager.register_init(Arc::new(RwLock::new(Slow)), "Slow");

        let err = manager
            .call_module_init_with_timeout(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Timeout { .. }));
    }
}
