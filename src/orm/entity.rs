use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical name of an entity, e.g. `"User"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for EntityId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A type that names an entity.
///
/// Implemented through `#[derive(Entity)]`; the entity id defaults to the
/// type name and can be overridden with `#[entity(name = "...")]`.
///
/// ```
/// use meshestra_orm::prelude::*;
///
/// #[derive(Entity)]
/// struct User;
///
/// #[derive(Entity)]
/// #[entity(name = "blog_posts")]
/// struct Post;
///
/// assert_eq!(User::entity_id().as_str(), "User");
/// assert_eq!(Post::entity_id().as_str(), "blog_posts");
/// ```
pub trait Entity: 'static {
    fn entity_id() -> EntityId;
}
