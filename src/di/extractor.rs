use crate::di::Container;
use crate::orm::{DEFAULT_DATA_SOURCE, Entity, Repository, repository_token};
use axum::{
    extract::FromRequestParts,
    http::{StatusCode as HttpStatusCode, request::Parts},
};
use std::marker::PhantomData;
use std::sync::Arc;

/// Axum extractor for dependency injection
///
/// Resolves a typed service from the application container.
pub struct Inject<T>(pub Arc<T>);

/// Trait that AppState must implement to provide the DI container
pub trait HasContainer {
    fn get_container(&self) -> &Container;
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasContainer,
    T: 'static + Send + Sync,
{
    type Rejection = (HttpStatusCode, String);

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let container = state.get_container();

        container.resolve::<T>().map(Inject).map_err(|e| {
            (
                HttpStatusCode::INTERNAL_SERVER_ERROR,
                format!("Dependency injection failed: {}", e),
            )
        })
    }
}

/// Deref implementation for convenient access to the inner service
impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Clone implementation to allow sharing the Arc
impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(Arc::clone(&self.0))
    }
}

/// Axum extractor for the default data source's repository of `E`
///
/// # Example
/// ```rust,ignore
/// async fn list_users(users: InjectRepository<User>) -> Json<Vec<User>> {
///     let data_source = users.data_source()?;
///     // query through the data source connection...
/// }
/// ```
pub struct InjectRepository<E> {
    repository: Arc<Repository>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> InjectRepository<E> {
    pub fn repository(&self) -> &Arc<Repository> {
        &self.repository
    }
}

impl<S, E> FromRequestParts<S> for InjectRepository<E>
where
    S: Send + Sync + HasContainer,
    E: Entity,
{
    type Rejection = (HttpStatusCode, String);

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = repository_token(&E::entity_id(), DEFAULT_DATA_SOURCE);

        state
            .get_container()
            .resolve_named::<Repository>(&token)
            .map(|repository| InjectRepository {
                repository,
                _entity: PhantomData,
            })
            .map_err(|e| {
                (
                    HttpStatusCode::INTERNAL_SERVER_ERROR,
                    format!("Repository injection failed: {}", e),
                )
            })
    }
}

impl<E> std::ops::Deref for InjectRepository<E> {
    type Target = Repository;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl<E> Clone for InjectRepository<E> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            _entity: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::{
        DataSourceOptions, DataSourceRegistry, DatabaseType, EntityId, FeatureRegistration,
        MemoryConnectionProvider,
    };

    struct User;

    impl Entity for User {
        fn entity_id() -> EntityId {
            EntityId::from("User")
        }
    }

    struct Post;

    impl Entity for Post {
        fn entity_id() -> EntityId {
            EntityId::from("Post")
        }
    }

    struct AppState {
        container: Container,
    }

    impl HasContainer for AppState {
        fn get_container(&self) -> &Container {
            &self.container
        }
    }

    fn parts() -> Parts {
        axum::http::Request::builder()
            .uri("/users")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn inject_service() {
        let mut container = Container::new();
        container.register(String::from("hello"));
        let state = AppState { container };

        let Inject(value) = Inject::<String>::from_request_parts(&mut parts(), &state)
            .await
            .unwrap();
        assert_eq!(value.as_str(), "hello");

        let missing = Inject::<u64>::from_request_parts(&mut parts(), &state).await;
        assert_eq!(
            missing.err().map(|(status, _)| status),
            Some(HttpStatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[tokio::test]
    async fn inject_registered_repository() {
        let registry = DataSourceRegistry::new(Arc::new(MemoryConnectionProvider::new()));
        registry
            .initialize(DataSourceOptions::new(DatabaseType::Sqlite).database(":memory:"))
            .unwrap();

        let mut container = Container::new();
        FeatureRegistration::new(["User"])
            .register(&registry, &mut container)
            .unwrap();
        let state = AppState { container };

        let users = InjectRepository::<User>::from_request_parts(&mut parts(), &state)
            .await
            .unwrap();
        assert_eq!(users.entity().as_str(), "User");
        assert!(users.data_source().is_ok());

        let posts = InjectRepository::<Post>::from_request_parts(&mut parts(), &state).await;
        assert!(posts.is_err());
    }
}
