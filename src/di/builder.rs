use crate::di::{Container, ResolvedDependencies};
use crate::error::Result;
use std::sync::Arc;

/// Builder for constructing a dependency injection container
///
/// Use this to configure and register services before handing the container
/// to [`Application::builder`](crate::lifecycle::Application::builder).
///
/// # Example
/// ```
/// use meshestra_orm::ContainerBuilder;
///
/// let container = ContainerBuilder::new()
///     .register_named("DB_HOST", String::from("localhost"))
///     .provide("DB_URL", ["DB_HOST"], |deps| {
///         Ok(format!("mysql://{}", deps.get::<String>(0)?))
///     })
///     .build();
///
/// assert_eq!(
///     container.resolve_named::<String>("DB_URL").unwrap().as_str(),
///     "mysql://localhost"
/// );
/// ```
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Register a service instance
    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.container.register(instance);
        self
    }

    /// Register a service instance under a string token
    pub fn register_named<T: 'static + Send + Sync>(
        mut self,
        token: impl Into<String>,
        instance: T,
    ) -> Self {
        self.container.register_named(token, instance);
        self
    }

    /// Register a lazily-built provider under a string token
    pub fn provide<T, I, S, F>(mut self, token: impl Into<String>, inject: I, factory: F) -> Self
    where
        T: 'static + Send + Sync,
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ResolvedDependencies) -> Result<T> + 'static + Send + Sync,
    {
        self.container.provide(token, inject, factory);
        self
    }

    /// Bind a trait to a concrete implementation
    ///
    /// This enables resolving `Arc<dyn Trait>` to the registered implementation.
    pub fn bind<Trait, Impl, F>(mut self, caster: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        self.container.register_trait::<Trait, Impl, F>(caster);
        self
    }

    /// Build the container
    pub fn build(self) -> Container {
        self.container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
