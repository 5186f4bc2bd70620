use crate::di::ResolvedDependencies;
use crate::error::{OrmError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Type alias for a function that can cast an `Arc<dyn Any>` to another `Arc<dyn Any>`.
/// The inner value is usually an `Arc<dyn Trait>`.
type CasterFn = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

type ProviderFn = Arc<dyn Fn(&ResolvedDependencies) -> Result<Instance> + Send + Sync>;

/// Thread-safe dependency injection container.
///
/// Services are addressed either by type (`register` / `resolve`) or by a
/// string token (`register_named` / `provide` / `resolve_token`). Token
/// providers are built lazily on first resolution and cached afterwards.
pub struct Container {
    services: DashMap<TypeId, ServiceEntry>,
    trait_mappings: DashMap<TypeId, TypeId>,
    casters: DashMap<TypeId, CasterFn>,
    named: DashMap<String, Instance>,
    providers: DashMap<String, ProviderEntry>,
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            trait_mappings: self.trait_mappings.clone(),
            casters: self.casters.clone(),
            named: self.named.clone(),
            providers: self.providers.clone(),
        }
    }
}

#[derive(Clone)]
struct ServiceEntry {
    instance: Instance,
}

#[derive(Clone)]
struct ProviderEntry {
    inject: Vec<String>,
    factory: ProviderFn,
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            trait_mappings: DashMap::new(),
            casters: DashMap::new(),
            named: DashMap::new(),
            providers: DashMap::new(),
        }
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        let type_id = TypeId::of::<T>();
        let entry = ServiceEntry {
            instance: Arc::new(instance),
        };
        self.services.insert(type_id, entry);
        self
    }

    pub fn register_trait<Trait, Impl, F>(&mut self, caster_fn: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let trait_id = TypeId::of::<Trait>();
        let impl_id = TypeId::of::<Impl>();

        self.trait_mappings.insert(trait_id, impl_id);

        let caster: CasterFn = Arc::new(move |instance: Instance| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let trait_obj: Arc<Trait> = caster_fn(concrete);
            Some(Arc::new(trait_obj) as Instance)
        });

        self.casters.insert(trait_id, caster);
        self
    }

    /// Register an instance under a string token.
    pub fn register_named<T: 'static + Send + Sync>(
        &mut self,
        token: impl Into<String>,
        instance: T,
    ) -> &mut Self {
        self.named.insert(token.into(), Arc::new(instance));
        self
    }

    /// Register a lazily-built provider under a string token.
    ///
    /// The `inject` tokens are resolved first and handed to `factory` in the
    /// same order. The produced value is cached, so the factory runs at most
    /// once per container.
    pub fn provide<T, I, S, F>(&mut self, token: impl Into<String>, inject: I, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ResolvedDependencies) -> Result<T> + 'static + Send + Sync,
    {
        let factory: ProviderFn =
            Arc::new(move |deps: &ResolvedDependencies| Ok(Arc::new(factory(deps)?) as Instance));
        self.providers.insert(
            token.into(),
            ProviderEntry {
                inject: inject.into_iter().map(Into::into).collect(),
                factory,
            },
        );
        self
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let requested_type_id = TypeId::of::<T>();
        let entry = self.services.get(&requested_type_id).ok_or_else(|| {
            OrmError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            }
        })?;
        entry
            .instance
            .clone()
            .downcast::<T>()
            .map_err(|_| OrmError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn resolve_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let requested_type_id = TypeId::of::<T>();

        let caster = self.casters.get(&requested_type_id).ok_or_else(|| {
            OrmError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            }
        })?;

        let impl_type_id = self.trait_mappings.get(&requested_type_id).ok_or_else(|| {
            OrmError::DependencyNotFound {
                type_name: format!(
                    "No implementation mapping found for trait '{}'",
                    std::any::type_name::<T>()
                ),
            }
        })?;

        let entry = self
            .services
            .get(&impl_type_id)
            .ok_or_else(|| OrmError::DependencyNotFound {
                type_name: format!(
                    "Implementation for trait '{}' not registered",
                    std::any::type_name::<T>()
                ),
            })?;

        let downcast_failed = || OrmError::DowncastFailed {
            type_name: std::any::type_name::<T>().to_string(),
        };

        // The caster hands back an Arc<dyn Any> holding an Arc<T>.
        let wrapper = (caster.value())(entry.instance.clone())
            .ok_or_else(downcast_failed)?
            .downcast::<Arc<T>>()
            .map_err(|_| downcast_failed())?;
        Ok(wrapper.as_ref().clone())
    }

    /// Resolve a token to its type-erased instance, building providers on demand.
    pub fn resolve_token(&self, token: &str) -> Result<Arc<dyn Any + Send + Sync>> {
        self.resolve_in(token, &mut Vec::new())
    }

    /// Resolve a token and downcast it to `T`.
    pub fn resolve_named<T: 'static + Send + Sync>(&self, token: &str) -> Result<Arc<T>> {
        self.resolve_token(token)?
            .downcast::<T>()
            .map_err(|_| OrmError::DowncastFailed {
                type_name: format!("{} (token '{}')", std::any::type_name::<T>(), token),
            })
    }

    /// Resolve every token in order.
    ///
    /// Fails on the first token that cannot be produced, with
    /// `UnresolvedDependency` naming that token and carrying the cause.
    pub fn resolve_all<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ResolvedDependencies> {
        let mut resolved = ResolvedDependencies::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            let instance = self
                .resolve_in(token, &mut Vec::new())
                .map_err(|e| OrmError::unresolved(token, e))?;
            resolved.push(token, instance);
        }
        Ok(resolved)
    }

    fn resolve_all_in<S: AsRef<str>>(
        &self,
        tokens: &[S],
        path: &mut Vec<String>,
    ) -> Result<ResolvedDependencies> {
        let mut resolved = ResolvedDependencies::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            let instance = self.resolve_in(token, path)?;
            resolved.push(token, instance);
        }
        Ok(resolved)
    }

    fn resolve_in(&self, token: &str, path: &mut Vec<String>) -> Result<Instance> {
        if let Some(instance) = self.named.get(token) {
            return Ok(instance.value().clone());
        }

        let provider = self
            .providers
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| OrmError::DependencyNotFound {
                type_name: token.to_string(),
            })?;

        if path.iter().any(|visited| visited == token) {
            path.push(token.to_string());
            return Err(OrmError::CircularDependency {
                cycle: path.join(" -> "),
            });
        }

        tracing::debug!("Building provider: {}", token);
        path.push(token.to_string());
        let deps = self.resolve_all_in(&provider.inject, path)?;
        path.pop();

        let instance = (provider.factory)(&deps)?;
        // A concurrent resolver may have finished first; keep whichever landed.
        let cached = self
            .named
            .entry(token.to_string())
            .or_insert(instance)
            .value()
            .clone();
        Ok(cached)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.services.contains_key(&type_id) || self.trait_mappings.contains_key(&type_id)
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.named.contains_key(token) || self.providers.contains_key(token)
    }

    /// Number of registrations: typed services, named instances and providers
    /// not built yet. A built provider counts once, as its cached instance.
    pub fn len(&self) -> usize {
        let pending = self
            .providers
            .iter()
            .filter(|entry| !self.named.contains_key(entry.key()))
            .count();
        self.services.len() + self.named.len() + pending
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Settings {
        url: String,
    }

    trait Pool: Send + Sync {
        fn size(&self) -> usize;
    }

    struct FixedPool {
        size: usize,
    }

    impl Pool for FixedPool {
        fn size(&self) -> usize {
            self.size
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut container = Container::new();
        container.register(Settings {
            url: "mysql://localhost".into(),
        });
        let settings = container.resolve::<Settings>().unwrap();
        assert_eq!(settings.url, "mysql://localhost");
    }

    #[test]
    fn test_register_and_resolve_trait() {
        let mut container = Container::new();
        container.register(FixedPool { size: 8 });
        container.register_trait::<dyn Pool, FixedPool, _>(|p| p as Arc<dyn Pool>);
        let pool = container.resolve_trait::<dyn Pool>().unwrap();
        assert_eq!(pool.size(), 8);
    }

    #[test]
    fn test_named_instance() {
        let mut container = Container::new();
        container.register_named("DB_URL", String::from("postgres://db"));

        let url = container.resolve_named::<String>("DB_URL").unwrap();
        assert_eq!(url.as_str(), "postgres://db");
        assert!(matches!(
            container.resolve_named::<u32>("DB_URL"),
            Err(OrmError::DowncastFailed { .. })
        ));
        assert!(matches!(
            container.resolve_token("MISSING"),
            Err(OrmError::DependencyNotFound { .. })
        ));
    }

    #[test]
    fn test_provider_receives_dependencies_in_order() {
        let mut container = Container::new();
        container
            .register_named("HOST", String::from("localhost"))
            .register_named("PORT", 3306u16)
            .provide("URL", ["HOST", "PORT"], |deps| {
                let host = deps.get::<String>(0)?;
                let port = deps.get::<u16>(1)?;
                Ok(format!("{}:{}", host, port))
            });

        let url = container.resolve_named::<String>("URL").unwrap();
        assert_eq!(url.as_str(), "localhost:3306");
    }

    #[test]
    fn test_provider_is_built_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut container = Container::new();
        container.provide("Counter", Vec::<String>::new(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7u8)
        });

        let first = container.resolve_named::<u8>("Counter").unwrap();
        let second = container.resolve_named::<u8>("Counter").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut container = Container::new();
        container
            .provide("A", ["B"], |_| Ok(1u8))
            .provide("B", ["C"], |_| Ok(2u8))
            .provide("C", ["A"], |_| Ok(3u8));

        match container.resolve_token("A") {
            Err(OrmError::CircularDependency { cycle }) => assert_eq!(cycle, "A -> B -> C -> A"),
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
        assert!(!container.contains_token("MISSING"));
        assert!(container.contains_token("A"));
    }

    #[test]
    fn test_missing_transitive_dependency() {
        let mut container = Container::new();
        container.provide("Repo", ["Pool"], |_| Ok(()));

        match container.resolve_all(&["Repo"]) {
            Err(OrmError::UnresolvedDependency { token, source }) => {
                assert_eq!(token, "Repo");
                assert!(matches!(
                    *source,
                    OrmError::DependencyNotFound { ref type_name } if type_name == "Pool"
                ));
            }
            other => panic!("expected UnresolvedDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_len_counts_providers_once() {
        let mut container = Container::new();
        container.provide("Answer", Vec::<String>::new(), |_| Ok(42u32));
        assert_eq!(container.len(), 1);
        assert!(!container.is_empty());

        container.resolve_named::<u32>("Answer").unwrap();
        assert_eq!(container.len(), 1);

        container.register(String::from("typed"));
        assert_eq!(container.len(), 2);
        assert!(Container::new().is_empty());
    }
}
