use crate::di::Container;
use crate::error::Result;
use crate::orm::{
    AsyncDataSourceOptions, DataSourceHandle, DataSourceOptions, DataSourceRegistry, EntityId,
    FeatureRegistration, data_source_token,
};

/// Entry points for declaring data sources and feature repositories.
///
/// ```
/// use meshestra_orm::{DataSourceOptions, DatabaseType, OrmModule};
///
/// let root = OrmModule::for_root(
///     DataSourceOptions::new(DatabaseType::Sqlite).database(":memory:"),
/// );
/// let users = OrmModule::for_feature(["User", "Profile"]);
///
/// assert_eq!(root.data_source_name(), "default");
/// assert_eq!(users.len(), 2);
/// ```
pub struct OrmModule;

impl OrmModule {
    /// Declare a data source from static options.
    pub fn for_root(options: DataSourceOptions) -> RootModule {
        RootModule::Static(options)
    }

    /// Declare a data source whose options are produced at assembly time.
    pub fn for_root_async(options: AsyncDataSourceOptions) -> RootModule {
        RootModule::Async(options)
    }

    /// Declare the entities a feature module needs repositories for.
    pub fn for_feature<I, E>(entities: I) -> FeatureRegistration
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityId>,
    {
        FeatureRegistration::new(entities)
    }
}

/// A declared data source, waiting to be initialized.
#[derive(Debug)]
pub enum RootModule {
    Static(DataSourceOptions),
    Async(AsyncDataSourceOptions),
}

impl RootModule {
    pub fn data_source_name(&self) -> &str {
        match self {
            RootModule::Static(options) => &options.name,
            RootModule::Async(options) => options.data_source_name(),
        }
    }

    /// Initialize the data source and register its handle in the container
    /// under [`data_source_token`].
    pub async fn register(
        self,
        registry: &DataSourceRegistry,
        container: &mut Container,
    ) -> Result<DataSourceHandle> {
        let handle = match self {
            RootModule::Static(options) => registry.initialize(options)?,
            RootModule::Async(options) => registry.initialize_async(container, options).await?,
        };
        container.register_named(data_source_token(handle.name()), handle.clone());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::{DatabaseType, MemoryConnectionProvider};
    use std::sync::Arc;

    #[tokio::test]
    async fn root_module_publishes_handle_token() {
        let registry = DataSourceRegistry::new(Arc::new(MemoryConnectionProvider::new()));
        let mut container = Container::new();

        let root = OrmModule::for_root(
            DataSourceOptions::new(DatabaseType::Sqlite)
                .name("cache")
                .database(":memory:"),
        );
        assert_eq!(root.data_source_name(), "cache");
        root.register(&registry, &mut container).await.unwrap();

        let handle = container
            .resolve_named::<DataSourceHandle>("cacheDataSource")
            .unwrap();
        assert_eq!(handle.data_source().unwrap().database_type(), DatabaseType::Sqlite);

        let async_root = OrmModule::for_root_async(
            AsyncDataSourceOptions::use_factory(Vec::<String>::new(), |_| async {
                Ok(DataSourceOptions::new(DatabaseType::Sqlite).database("app.db"))
            }),
        );
        async_root.register(&registry, &mut container).await.unwrap();
        assert!(container.contains_token("DataSource"));
    }
}
