//! Feature registration
//!
//! A feature module lists the entities it works with. Registering it against
//! the [`DataSourceRegistry`] yields one [`Repository`] per entity, bound to
//! an already-published data source.

use crate::di::Container;
use crate::error::{OrmError, Result};
use crate::orm::{
    DEFAULT_DATA_SOURCE, DataSource, DataSourceRegistry, Entity, EntityId, repository_token,
};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Weak};

/// Entities requested by one feature module, plus the data source they live in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRegistration {
    entities: BTreeSet<EntityId>,
    data_source: Option<String>,
}

impl FeatureRegistration {
    pub fn new<I, E>(entities: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityId>,
    {
        Self {
            entities: entities.into_iter().map(Into::into).collect(),
            data_source: None,
        }
    }

    /// Add a typed entity.
    pub fn entity<E: Entity>(mut self) -> Self {
        self.entities.insert(E::entity_id());
        self
    }

    /// Target a named data source instead of the default one.
    pub fn data_source(mut self, name: impl Into<String>) -> Self {
        self.data_source = Some(name.into());
        self
    }

    pub fn data_source_name(&self) -> &str {
        self.data_source.as_deref().unwrap_or(DEFAULT_DATA_SOURCE)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Resolve the repositories and register each one in the container under
    /// its [`repository_token`].
    pub fn register(
        &self,
        registry: &DataSourceRegistry,
        container: &mut Container,
    ) -> Result<Vec<Repository>> {
        let repositories = registry.register_feature(self)?;
        for repository in &repositories {
            container.register_named(repository.token(), repository.clone());
        }
        Ok(repositories)
    }
}

/// Scoped accessor for one entity in one data source.
///
/// Holds a weak reference: a repository stays usable exactly as long as its
/// data source is published and open.
#[derive(Clone)]
pub struct Repository {
    entity: EntityId,
    data_source_name: String,
    data_source: Weak<DataSource>,
}

impl Repository {
    pub(crate) fn new(entity: EntityId, data_source: &Arc<DataSource>) -> Self {
        Self {
            entity,
            data_source_name: data_source.name().to_string(),
            data_source: Arc::downgrade(data_source),
        }
    }

    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    pub fn data_source_name(&self) -> &str {
        &self.data_source_name
    }

    pub fn token(&self) -> String {
        repository_token(&self.entity, &self.data_source_name)
    }

    /// The bound data source, if it is still published and open.
    pub fn data_source(&self) -> Result<Arc<DataSource>> {
        self.data_source
            .upgrade()
            .filter(|ds| ds.is_open())
            .ok_or_else(|| OrmError::DataSourceClosed {
                name: self.data_source_name.clone(),
            })
    }

    pub fn is_bound_to(&self, data_source: &Arc<DataSource>) -> bool {
        std::ptr::eq(self.data_source.as_ptr(), Arc::as_ptr(data_source))
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && Weak::ptr_eq(&self.data_source, &other.data_source)
    }
}

impl Eq for Repository {}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &self.entity)
            .field("data_source", &self.data_source_name)
            .finish()
    }
}
