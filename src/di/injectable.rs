use crate::di::Container;
use crate::error::Result;

/// Trait for types that can be built by resolving their fields from the container
///
/// Usually implemented through `#[derive(Injectable)]`. Options factories used
/// with [`AsyncDataSourceOptions::use_class`](crate::orm::AsyncDataSourceOptions::use_class)
/// are constructed this way.
///
/// # Example
/// ```
/// use meshestra_orm::prelude::*;
/// use meshestra_orm::ConfigService;
///
/// #[derive(Injectable)]
/// pub struct OrmConfig {
///     config: Arc<ConfigService>,
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the container
    ///
    /// # Errors
    /// Returns an error if any required dependency is not found in the container.
    fn inject(container: &Container) -> Result<Self>;
}
