use crate::di::Container;
use crate::error::Result;

/// Trait for application modules
///
/// Modules are typically defined using the `#[module]` macro, which
/// implements this trait and generates the registration logic. Database
/// modules built by [`OrmModule`](crate::orm::OrmModule) are values rather
/// than types and are handed to the
/// [`ApplicationBuilder`](crate::lifecycle::ApplicationBuilder) instead.
///
/// # Example
/// ```
/// use meshestra_orm::prelude::*;
/// use meshestra_orm::ConfigModule;
///
/// #[derive(Injectable)]
/// pub struct ReportService {
///     config: Arc<meshestra_orm::ConfigService>,
/// }
///
/// #[module(
///     imports = [ConfigModule],
///     providers = [ReportService],
/// )]
/// pub struct ReportModule;
///
/// let mut container = Container::new();
/// ReportModule::register(&mut container).unwrap();
/// assert!(container.contains::<ReportService>());
/// ```
pub trait Module {
    /// Register all providers in this module
    fn register(container: &mut Container) -> Result<()>;
}
