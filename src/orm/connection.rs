use crate::orm::DataSourceOptions;
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Error type produced by connection providers. Surfaced to callers unchanged.
pub type ConnectionError = Box<dyn std::error::Error + Send + Sync>;

/// An open connection (or pool) owned by a data source.
pub trait Connection: Send + Sync {
    fn is_open(&self) -> bool;

    fn close(&self) -> Result<(), ConnectionError>;
}

/// Opens connections for validated data source options.
///
/// This is the seam to the actual database driver. Opening happens during
/// application assembly and must not suspend.
pub trait ConnectionProvider: Send + Sync {
    fn open(&self, options: &DataSourceOptions) -> Result<Box<dyn Connection>, ConnectionError>;
}

/// Connection provider that opens nothing but remembers what it was asked to open.
#[derive(Debug, Default)]
pub struct MemoryConnectionProvider {
    opened: AtomicUsize,
    rejected: DashSet<String>,
}

impl MemoryConnectionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `open` for `name` fail.
    pub fn reject(&self, name: impl Into<String>) {
        self.rejected.insert(name.into());
    }

    /// Number of connections opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl ConnectionProvider for MemoryConnectionProvider {
    fn open(&self, options: &DataSourceOptions) -> Result<Box<dyn Connection>, ConnectionError> {
        if self.rejected.contains(&options.name) {
            return Err(format!("connection refused: {}", options.redacted_url()).into());
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            url: options.redacted_url(),
            open: AtomicBool::new(true),
        }))
    }
}

#[derive(Debug)]
pub struct MemoryConnection {
    url: String,
    open: AtomicBool,
}

impl MemoryConnection {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connection for MemoryConnection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&self) -> Result<(), ConnectionError> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Err(format!("{} is already closed", self.url).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::DatabaseType;

    #[test]
    fn memory_provider_opens_and_rejects() {
        let provider = MemoryConnectionProvider::new();
        let options = DataSourceOptions::new(DatabaseType::Sqlite).database(":memory:");

        let connection = provider.open(&options).unwrap();
        assert!(connection.is_open());
        assert_eq!(provider.opened(), 1);

        connection.close().unwrap();
        assert!(!connection.is_open());
        assert!(connection.close().is_err());

        provider.reject("default");
        let err = provider.open(&options).err().unwrap();
        assert_eq!(err.to_string(), "connection refused: sqlite://:memory:");
        assert_eq!(provider.opened(), 1);
    }
}
