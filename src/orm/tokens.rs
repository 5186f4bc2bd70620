use crate::orm::{DEFAULT_DATA_SOURCE, EntityId};

/// Container token of a data source handle: `DataSource` for the default
/// data source, `<name>DataSource` otherwise.
pub fn data_source_token(name: &str) -> String {
    if name == DEFAULT_DATA_SOURCE {
        "DataSource".to_string()
    } else {
        format!("{}DataSource", name)
    }
}

/// Container token of a repository: `<Entity>Repository` in the default data
/// source, `<name>_<Entity>Repository` otherwise.
pub fn repository_token(entity: &EntityId, data_source: &str) -> String {
    if data_source == DEFAULT_DATA_SOURCE {
        format!("{}Repository", entity)
    } else {
        format!("{}_{}Repository", data_source, entity)
    }
}
