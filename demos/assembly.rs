use axum::{Router, routing::get};
use meshestra_orm::lifecycle::Application;
use meshestra_orm::orm::MemoryConnectionProvider;
use meshestra_orm::prelude::*;
use meshestra_orm::{DataSourceOptions, DatabaseType};

#[derive(Entity)]
pub struct User;

#[derive(Entity)]
pub struct Post;

#[derive(Entity)]
#[entity(name = "daily_reports")]
pub struct Report;

#[derive(Clone)]
struct AppState {
    container: Arc<Container>,
}

impl HasContainer for AppState {
    fn get_container(&self) -> &Container {
        &self.container
    }
}

async fn describe_users(users: InjectRepository<User>) -> std::result::Result<String, OrmError> {
    let data_source = users.data_source()?;
    Ok(format!(
        "{} -> {} ({})",
        users.entity(),
        data_source.name(),
        data_source.options().redacted_url()
    ))
}

fn reports_options() -> AsyncDataSourceOptions {
    AsyncDataSourceOptions::use_factory(["ConfigService"], |deps| async move {
        let config = deps.get::<ConfigService>(0)?;
        Ok(DataSourceOptions::new(DatabaseType::Postgres)
            .host(config.get_or("REPORTS_DB_HOST", "localhost"))
            .database(config.get_or("REPORTS_DB_NAME", "reports"))
            .auto_load_entities(true))
    })
    .name("reports")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting assembly demo...");

    let app = Application::builder()
        .connection_provider(Arc::new(MemoryConnectionProvider::new()))
        .import::<ConfigModule>()
        .root(OrmModule::for_root(
            DataSourceOptions::new(DatabaseType::Mysql)
                .host("localhost")
                .port(3306)
                .username("root")
                .password("root")
                .database("test"),
        ))
        .root(OrmModule::for_root_async(reports_options()))
        .feature(
            FeatureRegistration::default()
                .entity::<User>()
                .entity::<Post>(),
        )
        .feature(
            FeatureRegistration::default()
                .entity::<Report>()
                .data_source("reports"),
        )
        .build()
        .await?;

    for name in app.registry().names() {
        let data_source = app.data_source(&name)?;
        tracing::info!(
            "Data source '{}' ready with entities {:?}",
            name,
            data_source.entities()
        );
    }

    let state = AppState {
        container: app.container().clone(),
    };
    let router = Router::new()
        .route("/users", get(describe_users))
        .with_state(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::info!("Listening on http://{}:{}/users", host, port);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    app.shutdown().await?;
    Ok(())
}
