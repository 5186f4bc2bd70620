//! Data source registry
//!
//! Holds every published [`DataSource`] by name. A name goes through two
//! states: *initializing* (reserved by an initializer, invisible to readers)
//! and *ready* (published). Reservation and publication are each a single
//! map operation, so readers see either nothing or a fully opened data source.

use crate::di::Container;
use crate::error::{OrmError, Result};
use crate::lifecycle::OnModuleDestroy;
use crate::orm::{
    AsyncDataSourceOptions, ConnectionProvider, DataSource, DataSourceHandle, DataSourceOptions,
    FeatureRegistration, Repository,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

enum Slot {
    Initializing,
    Ready(Arc<DataSource>),
}

struct RegistryInner {
    provider: Arc<dyn ConnectionProvider>,
    slots: DashMap<String, Slot>,
    sequence: AtomicU64,
}

/// Process-wide set of named data sources.
///
/// Cloning is cheap and yields a view of the same registry.
///
/// # Example
///
/// ```
/// use meshestra_orm::{DataSourceOptions, DataSourceRegistry, DatabaseType, FeatureRegistration};
/// use meshestra_orm::orm::MemoryConnectionProvider;
/// use std::sync::Arc;
///
/// let registry = DataSourceRegistry::new(Arc::new(MemoryConnectionProvider::new()));
/// registry
///     .initialize(
///         DataSourceOptions::new(DatabaseType::Mysql)
///             .host("localhost")
///             .port(3306)
///             .username("root")
///             .password("root")
///             .database("test"),
///     )
///     .unwrap();
///
/// let repositories = registry
///     .register_feature(&FeatureRegistration::new(["User", "Post"]))
///     .unwrap();
/// assert_eq!(repositories.len(), 2);
/// ```
#[derive(Clone)]
pub struct DataSourceRegistry {
    inner: Arc<RegistryInner>,
}

impl DataSourceRegistry {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                provider,
                slots: DashMap::new(),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Open and publish a data source from static options.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the options are invalid or the name is taken.
    /// - `ProviderOpen` if the connection provider refuses the options.
    pub fn initialize(&self, options: DataSourceOptions) -> Result<DataSourceHandle> {
        let options = options.validated()?;
        let reservation = self.reserve(&options.name)?;
        self.open_and_publish(reservation, options)
    }

    /// Produce options through `options`' strategy, then open and publish.
    ///
    /// The name is reserved for the duration of the call; if any step fails,
    /// or the future is dropped, the reservation is released and the registry
    /// is left as it was.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the name is taken or the produced options are invalid.
    /// - `UnresolvedDependency` if a dependency is missing or cyclic.
    /// - `ProviderOpen` if the connection provider refuses the options.
    /// - Any error returned by the factory itself.
    pub async fn initialize_async(
        &self,
        container: &Container,
        options: AsyncDataSourceOptions,
    ) -> Result<DataSourceHandle> {
        let name = options.data_source_name().to_string();
        let reservation = self.reserve(&name)?;

        tracing::debug!("Data source '{}': resolving options asynchronously", name);
        let mut produced = options.strategy().produce(container, &name).await?;
        produced.name = name;
        let produced = produced.validated()?;

        self.open_and_publish(reservation, produced)
    }

    /// Bind every entity of `feature` to its published data source.
    ///
    /// Entity ids are deduplicated; the result is sorted by entity id.
    ///
    /// # Errors
    ///
    /// - `UnknownDataSource` if the target data source is not published yet.
    /// - `Configuration` if an entity id is empty.
    pub fn register_feature(&self, feature: &FeatureRegistration) -> Result<Vec<Repository>> {
        if feature.entities().any(|e| e.as_str().trim().is_empty()) {
            return Err(OrmError::configuration(format!(
                "feature for data source '{}' lists an empty entity name",
                feature.data_source_name()
            )));
        }

        let data_source = self.get(feature.data_source_name())?;
        let auto_load = data_source.options().auto_load_entities;

        let repositories: Vec<Repository> = feature
            .entities()
            .map(|entity| {
                if auto_load {
                    data_source.load_entity(entity);
                }
                Repository::new(entity.clone(), &data_source)
            })
            .collect();

        tracing::debug!(
            "Data source '{}': registered {} repositories",
            data_source.name(),
            repositories.len()
        );
        Ok(repositories)
    }

    /// Get a published data source.
    pub fn get(&self, name: &str) -> Result<Arc<DataSource>> {
        match self.inner.slots.get(name).as_deref() {
            Some(Slot::Ready(data_source)) => Ok(Arc::clone(data_source)),
            Some(Slot::Initializing) | None => Err(OrmError::unknown_data_source(name)),
        }
    }

    /// Get a published data source, provided it is still the instance `id`.
    pub fn get_instance(&self, name: &str, id: Uuid) -> Result<Arc<DataSource>> {
        self.get(name)
            .ok()
            .filter(|data_source| data_source.id() == id)
            .ok_or_else(|| OrmError::unknown_data_source(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Names of published data sources, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Ready(_)))
            .map(|slot| slot.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unpublish a data source and close its connection.
    pub fn close(&self, name: &str) -> Result<()> {
        self.close_matching(name, |_| true)
    }

    /// Like [`close`](Self::close), but only if `name` is still published
    /// as the instance `id`.
    pub fn close_instance(&self, name: &str, id: Uuid) -> Result<()> {
        self.close_matching(name, |data_source| data_source.id() == id)
    }

    fn close_matching(&self, name: &str, matches: impl Fn(&DataSource) -> bool) -> Result<()> {
        let removed = self.inner.slots.remove_if(name, |_, slot| match slot {
            Slot::Ready(data_source) => matches(data_source),
            Slot::Initializing => false,
        });

        match removed {
            Some((_, Slot::Ready(data_source))) => {
                data_source.close()?;
                tracing::info!("Data source '{}' closed", name);
                Ok(())
            }
            _ => Err(OrmError::unknown_data_source(name)),
        }
    }

    /// Close every published data source, newest first.
    ///
    /// Keeps going after a failure and reports the first error.
    pub fn close_all(&self) -> Result<()> {
        let mut published: Vec<Arc<DataSource>> = self
            .inner
            .slots
            .iter()
            .filter_map(|slot| match slot.value() {
                Slot::Ready(data_source) => Some(Arc::clone(data_source)),
                Slot::Initializing => None,
            })
            .collect();
        published.sort_by_key(|ds| std::cmp::Reverse(ds.sequence()));

        let mut first_error = None;
        for data_source in published {
            if let Err(e) = self.close_instance(data_source.name(), data_source.id()) {
                tracing::error!("Failed to close data source '{}': {}", data_source.name(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn reserve(&self, name: &str) -> Result<Reservation<'_>> {
        match self.inner.slots.entry(name.to_string()) {
            Entry::Occupied(_) => Err(OrmError::configuration(format!(
                "data source '{}' is already registered",
                name
            ))),
            Entry::Vacant(entry) => {
                entry.insert(Slot::Initializing);
                Ok(Reservation {
                    slots: &self.inner.slots,
                    name: name.to_string(),
                    armed: true,
                })
            }
        }
    }

    fn open_and_publish(
        &self,
        reservation: Reservation<'_>,
        options: DataSourceOptions,
    ) -> Result<DataSourceHandle> {
        let connection =
            self.inner
                .provider
                .open(&options)
                .map_err(|source| OrmError::ProviderOpen {
                    name: options.name.clone(),
                    source,
                })?;

        let sequence = self.inner.sequence.fetch_add(1, Ordering::SeqCst);
        let url = options.redacted_url();
        let data_source = Arc::new(DataSource::new(options, connection, sequence));
        let id = data_source.id();
        let name = reservation.publish(data_source);

        tracing::info!("Data source '{}' initialized ({})", name, url);
        Ok(DataSourceHandle::new(name, id, self.clone()))
    }
}

/// Holds a name in the `Initializing` state until published or dropped.
struct Reservation<'a> {
    slots: &'a DashMap<String, Slot>,
    name: String,
    armed: bool,
}

impl Reservation<'_> {
    fn publish(mut self, data_source: Arc<DataSource>) -> String {
        self.slots
            .insert(self.name.clone(), Slot::Ready(data_source));
        self.armed = false;
        std::mem::take(&mut self.name)
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slots
                .remove_if(&self.name, |_, slot| matches!(slot, Slot::Initializing));
            tracing::debug!("Data source '{}': reservation released", self.name);
        }
    }
}

#[async_trait]
impl OnModuleDestroy for DataSourceRegistry {
    async fn on_module_destroy(&mut self) -> Result<()> {
        self.close_all()
    }
}
