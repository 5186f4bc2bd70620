mod builder;
mod container;
mod extractor;
mod injectable;
mod resolved;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use extractor::{HasContainer, Inject, InjectRepository};
pub use injectable::Injectable;
pub use resolved::ResolvedDependencies;
