use crate::error::{OrmError, Result};
use crate::orm::{
    Connection, DataSourceOptions, DataSourceRegistry, DatabaseType, EntityId, data_source_token,
};
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// The shared resource behind one data source name.
///
/// Only the [`DataSourceRegistry`] holds it by `Arc`; everything else goes
/// through a [`DataSourceHandle`] or a [`Repository`](crate::orm::Repository).
pub struct DataSource {
    id: Uuid,
    options: DataSourceOptions,
    connection: Box<dyn Connection>,
    entities: DashSet<EntityId>,
    sequence: u64,
    initialized_at: DateTime<Utc>,
}

impl DataSource {
    pub(crate) fn new(
        options: DataSourceOptions,
        connection: Box<dyn Connection>,
        sequence: u64,
    ) -> Self {
        let entities = options.entities.iter().cloned().collect();
        Self {
            id: Uuid::new_v4(),
            options,
            connection,
            entities,
            sequence,
            initialized_at: Utc::now(),
        }
    }

    /// Unique id of this instance; a re-initialized name gets a new id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn token(&self) -> String {
        data_source_token(&self.options.name)
    }

    pub fn database_type(&self) -> DatabaseType {
        self.options.database_type
    }

    pub fn options(&self) -> &DataSourceOptions {
        &self.options
    }

    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    pub fn initialized_at(&self) -> DateTime<Utc> {
        self.initialized_at
    }

    /// Entities known to this data source, sorted by name.
    pub fn entities(&self) -> Vec<EntityId> {
        let mut entities: Vec<EntityId> = self.entities.iter().map(|e| e.key().clone()).collect();
        entities.sort();
        entities
    }

    pub fn has_entity(&self, entity: &EntityId) -> bool {
        self.entities.contains(entity)
    }

    pub(crate) fn load_entity(&self, entity: &EntityId) {
        if self.entities.insert(entity.clone()) {
            tracing::debug!("Data source '{}': loaded entity {}", self.name(), entity);
        }
    }

    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn close(&self) -> Result<()> {
        self.connection
            .close()
            .map_err(|source| OrmError::ProviderClose {
                name: self.name().to_string(),
                source,
            })
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("id", &self.id)
            .field("name", &self.options.name)
            .field("url", &self.options.redacted_url())
            .field("open", &self.is_open())
            .field("initialized_at", &self.initialized_at)
            .finish()
    }
}

/// Returned by the initializers; controls the lifecycle of one data source.
///
/// The handle does not keep the data source alive. Once it is shut down,
/// [`data_source`](Self::data_source) fails with `UnknownDataSource`, even if
/// a new data source is later published under the same name.
#[derive(Clone)]
pub struct DataSourceHandle {
    name: String,
    id: Uuid,
    registry: DataSourceRegistry,
}

impl DataSourceHandle {
    pub(crate) fn new(name: impl Into<String>, id: Uuid, registry: DataSourceRegistry) -> Self {
        Self {
            name: name.into(),
            id,
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the data source this handle was returned for.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn data_source(&self) -> Result<Arc<DataSource>> {
        self.registry.get_instance(&self.name, self.id)
    }

    pub fn is_open(&self) -> bool {
        self.data_source().is_ok_and(|ds| ds.is_open())
    }

    /// Close the connection and remove the data source from its registry.
    pub fn shutdown(&self) -> Result<()> {
        self.registry.close_instance(&self.name, self.id)
    }
}

impl fmt::Debug for DataSourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceHandle")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}
