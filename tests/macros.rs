use meshestra_orm::orm::{MemoryConnectionProvider, data_source_token};
use meshestra_orm::prelude::*;
use meshestra_orm::config::CONFIG_SERVICE_TOKEN;
use meshestra_orm::lifecycle::Application;
use meshestra_orm::{DataSourceHandle, DataSourceOptions, DatabaseType, EntityId};

#[derive(Entity)]
struct User;

#[derive(Entity)]
#[entity(name = "audit_log")]
struct AuditEntry;

trait ConnectionLabel: Send + Sync {
    fn label(&self) -> String;
}

#[derive(Injectable)]
struct StaticLabel;

impl ConnectionLabel for StaticLabel {
    fn label(&self) -> String {
        "primary".to_string()
    }
}

#[derive(Injectable)]
struct OrmConfig {
    config: Arc<ConfigService>,
    label: Arc<dyn ConnectionLabel>,
}

#[async_trait]
impl DataSourceOptionsFactory for OrmConfig {
    async fn create_options(&self, name: &str) -> meshestra_orm::Result<DataSourceOptions> {
        Ok(DataSourceOptions::new(DatabaseType::Sqlite)
            .database(self.config.get_or("TEST_SQLITE_FILE", &format!("{}.db", name)))
            .extra("label", self.label.label().into()))
    }
}

#[module(
    imports = [ConfigModule],
    providers = [StaticLabel, OrmConfig],
    bindings = [(dyn ConnectionLabel => StaticLabel)],
)]
struct DatabaseModule;

#[test]
fn entity_derive_names() {
    assert_eq!(User::entity_id(), EntityId::from("User"));
    assert_eq!(AuditEntry::entity_id().as_str(), "audit_log");
}

#[test]
fn module_registers_imports_and_providers() {
    let container = DatabaseModule::create_container().unwrap();

    assert!(container.contains::<ConfigService>());
    assert!(container.contains_token(CONFIG_SERVICE_TOKEN));
    assert_eq!(container.resolve::<OrmConfig>().unwrap().label.label(), "primary");
}

#[tokio::test]
async fn class_strategy_through_application() {
    let app = Application::builder()
        .connection_provider(Arc::new(MemoryConnectionProvider::new()))
        .import::<DatabaseModule>()
        .root(OrmModule::for_root_async(
            AsyncDataSourceOptions::use_class::<OrmConfig>().name("audit"),
        ))
        .feature(
            FeatureRegistration::default()
                .entity::<AuditEntry>()
                .data_source("audit"),
        )
        .build()
        .await
        .unwrap();

    let data_source = app.data_source("audit").unwrap();
    assert_eq!(data_source.options().database.as_deref(), Some("audit.db"));

    let handle = app
        .container()
        .resolve_named::<DataSourceHandle>(&data_source_token("audit"))
        .unwrap();
    assert!(handle.is_open());

    let entries = app
        .container()
        .resolve_named::<Repository>("audit_audit_logRepository")
        .unwrap();
    assert!(entries.is_bound_to(&data_source));

    app.shutdown().await.unwrap();
    assert!(!handle.is_open());
}
