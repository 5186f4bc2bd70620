use crate::di::container::Instance;
use crate::error::{OrmError, Result};
use std::any::Any;
use std::sync::Arc;

/// Dependencies resolved from the container, in the order they were requested.
///
/// Handed to provider and options factories so they can pick their arguments
/// by position.
#[derive(Clone, Default)]
pub struct ResolvedDependencies {
    entries: Vec<(String, Instance)>,
}

impl ResolvedDependencies {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, token: &str, instance: Instance) {
        self.entries.push((token.to_string(), instance));
    }

    /// Get the dependency at `index` as `T`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let (token, instance) =
            self.entries
                .get(index)
                .ok_or_else(|| OrmError::DependencyNotFound {
                    type_name: format!("argument #{} ({})", index, std::any::type_name::<T>()),
                })?;
        instance
            .clone()
            .downcast::<T>()
            .map_err(|_| OrmError::DowncastFailed {
                type_name: format!("{} (token '{}')", std::any::type_name::<T>(), token),
            })
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(token, _)| token.as_str())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(token, _)| token.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResolvedDependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tokens()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_access() {
        let mut deps = ResolvedDependencies::default();
        deps.push("HOST", Arc::new(String::from("localhost")));
        deps.push("PORT", Arc::new(5432u16));

        assert_eq!(deps.len(), 2);
        assert_eq!(deps.token(1), Some("PORT"));
        assert_eq!(*deps.get::<u16>(1).unwrap(), 5432);
        assert!(matches!(
            deps.get::<u16>(0),
            Err(OrmError::DowncastFailed { .. })
        ));
        assert!(matches!(
            deps.get::<u16>(2),
            Err(OrmError::DependencyNotFound { .. })
        ));
    }
}
