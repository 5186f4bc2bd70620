use proc_macro::TokenStream;

mod entity;
mod injectable;
mod module;

/// Derive macro for making a struct injectable into the DI container
///
/// Every field must be an `Arc<T>` (resolved by type) or an
/// `Arc<dyn Trait>` (resolved through a trait binding).
///
/// # Example
/// ```ignore
/// use meshestra_orm::prelude::*;
///
/// #[derive(Injectable)]
/// pub struct OrmConfig {
///     config: Arc<ConfigService>,
/// }
/// ```
#[proc_macro_derive(Injectable)]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}

/// Derive macro that names a type as a persisted entity
///
/// The entity id defaults to the type name and can be overridden with
/// `#[entity(name = "...")]`.
///
/// # Example
/// ```ignore
/// use meshestra_orm::prelude::*;
///
/// #[derive(Entity)]
/// pub struct User;
///
/// #[derive(Entity)]
/// #[entity(name = "blog_posts")]
/// pub struct Post;
/// ```
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input)
}

/// Attribute macro for defining a module with imports, providers and trait bindings
///
/// # Example
/// ```ignore
/// use meshestra_orm::prelude::*;
///
/// #[module(
///     imports = [ConfigModule],
///     providers = [OrmConfig],
///     bindings = [(dyn DataSourceOptionsFactory => OrmConfig)],
/// )]
/// pub struct DatabaseModule;
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::module_attribute(attr, item)
}
