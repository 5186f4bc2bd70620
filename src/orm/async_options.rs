//! Deferred data source options
//!
//! [`AsyncDataSourceOptions`] names a data source and says how its options are
//! produced once the container can supply dependencies:
//!
//! - **factory**: an async closure fed with resolved container tokens,
//! - **class**: a [`DataSourceOptionsFactory`] built through [`Injectable`],
//! - **existing**: a [`DataSourceOptionsFactory`] already in the container.

use crate::di::{Container, Injectable, ResolvedDependencies};
use crate::error::{OrmError, Result};
use crate::orm::{DEFAULT_DATA_SOURCE, DataSourceOptions};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type OptionsFuture = Pin<Box<dyn Future<Output = Result<DataSourceOptions>> + Send>>;
type OptionsFactoryFn = Box<dyn Fn(ResolvedDependencies) -> OptionsFuture + Send + Sync>;
type ProviderResolver =
    Box<dyn Fn(&Container) -> Result<Arc<dyn DataSourceOptionsFactory>> + Send + Sync>;

/// A service that produces data source options.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// pub struct OrmConfig {
///     config: Arc<ConfigService>,
/// }
///
/// #[async_trait]
/// impl DataSourceOptionsFactory for OrmConfig {
///     async fn create_options(&self, _name: &str) -> Result<DataSourceOptions> {
///         DataSourceOptions::from_config(&self.config, "DB_")
///     }
/// }
/// ```
#[async_trait]
pub trait DataSourceOptionsFactory: Send + Sync {
    /// Produce the options for the data source called `name`.
    async fn create_options(&self, name: &str) -> Result<DataSourceOptions>;
}

/// Locates a [`DataSourceOptionsFactory`] in a container.
pub struct ProviderRef {
    name: String,
    resolve: ProviderResolver,
}

impl ProviderRef {
    /// Build `T` from its own injected dependencies.
    pub fn class<T>() -> Self
    where
        T: DataSourceOptionsFactory + Injectable,
    {
        Self {
            name: std::any::type_name::<T>().to_string(),
            resolve: Box::new(|container: &Container| {
                let instance = T::inject(container)?;
                Ok(Arc::new(instance) as Arc<dyn DataSourceOptionsFactory>)
            }),
        }
    }

    /// Reuse an instance of `T` registered by type.
    pub fn existing<T>() -> Self
    where
        T: DataSourceOptionsFactory + 'static,
    {
        Self {
            name: std::any::type_name::<T>().to_string(),
            resolve: Box::new(|container: &Container| {
                let instance = container.resolve::<T>()?;
                Ok(instance as Arc<dyn DataSourceOptionsFactory>)
            }),
        }
    }

    /// Reuse an `Arc<dyn DataSourceOptionsFactory>` registered under `token`.
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            name: token.clone(),
            resolve: Box::new(move |container: &Container| {
                let instance =
                    container.resolve_named::<Arc<dyn DataSourceOptionsFactory>>(&token)?;
                Ok(Arc::clone(&instance))
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn resolve(&self, container: &Container) -> Result<Arc<dyn DataSourceOptionsFactory>> {
        (self.resolve)(container).map_err(|e| OrmError::unresolved(&self.name, e))
    }
}

impl fmt::Debug for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderRef").field(&self.name).finish()
    }
}

/// How the options of an async data source are produced.
pub enum OptionsStrategy {
    Factory {
        inject: Vec<String>,
        factory: OptionsFactoryFn,
    },
    Class(ProviderRef),
    Existing(ProviderRef),
}

impl OptionsStrategy {
    /// Resolve dependencies, then run the strategy.
    ///
    /// Any failure to produce a dependency surfaces as `UnresolvedDependency`;
    /// errors returned by the factory itself pass through unchanged.
    pub(crate) async fn produce(
        &self,
        container: &Container,
        name: &str,
    ) -> Result<DataSourceOptions> {
        match self {
            OptionsStrategy::Factory { inject, factory } => {
                let deps = container.resolve_all(inject.as_slice())?;
                tracing::debug!("Data source '{}': factory resolved {:?}", name, deps);
                factory(deps).await
            }
            OptionsStrategy::Class(provider) | OptionsStrategy::Existing(provider) => {
                let factory = provider.resolve(container)?;
                tracing::debug!("Data source '{}': using options provider {}", name, provider.name());
                factory.create_options(name).await
            }
        }
    }
}

impl fmt::Debug for OptionsStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsStrategy::Factory { inject, .. } => {
                f.debug_struct("Factory").field("inject", inject).finish()
            }
            OptionsStrategy::Class(provider) => f.debug_tuple("Class").field(provider).finish(),
            OptionsStrategy::Existing(provider) => {
                f.debug_tuple("Existing").field(provider).finish()
            }
        }
    }
}

/// Options for a data source whose configuration is produced at assembly time.
///
/// # Example
///
/// ```
/// use meshestra_orm::{AsyncDataSourceOptions, ConfigService, DataSourceOptions};
///
/// let options = AsyncDataSourceOptions::use_factory(["ConfigService"], |deps| async move {
///     let config = deps.get::<ConfigService>(0)?;
///     DataSourceOptions::from_config(&config, "DB_")
/// });
/// assert_eq!(options.data_source_name(), "default");
/// ```
#[derive(Debug)]
pub struct AsyncDataSourceOptions {
    name: String,
    strategy: OptionsStrategy,
}

impl AsyncDataSourceOptions {
    pub fn use_factory<I, S, F, Fut>(inject: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(ResolvedDependencies) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<DataSourceOptions>> + Send + 'static,
    {
        let factory: OptionsFactoryFn =
            Box::new(move |deps: ResolvedDependencies| -> OptionsFuture { Box::pin(factory(deps)) });
        Self::with_strategy(OptionsStrategy::Factory {
            inject: inject.into_iter().map(Into::into).collect(),
            factory,
        })
    }

    pub fn use_class<T>() -> Self
    where
        T: DataSourceOptionsFactory + Injectable,
    {
        Self::with_strategy(OptionsStrategy::Class(ProviderRef::class::<T>()))
    }

    pub fn use_existing<T>() -> Self
    where
        T: DataSourceOptionsFactory + 'static,
    {
        Self::with_strategy(OptionsStrategy::Existing(ProviderRef::existing::<T>()))
    }

    pub fn use_existing_token(token: impl Into<String>) -> Self {
        Self::with_strategy(OptionsStrategy::Existing(ProviderRef::token(token)))
    }

    pub fn with_strategy(strategy: OptionsStrategy) -> Self {
        Self {
            name: DEFAULT_DATA_SOURCE.to_string(),
            strategy,
        }
    }

    /// Register under `name` instead of the default data source.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn data_source_name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &OptionsStrategy {
        &self.strategy
    }
}
