//! Configuration for sage-store.

use std::path::PathBuf;

/// Configuration for the object store.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Path to store data on disk. If None, data is kept in memory only.
    pub data_path: Option<PathBuf>,

    /// Pretty-print persisted JSON files (larger, but diffable).
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: None,
            pretty_json: false,
        }
    }
}

impl Config {
    /// Create an in-memory configuration.
    ///
    /// Data will not be persisted and will be lost when the process exits.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a persistent configuration.
    ///
    /// Data will be stored at the specified path and loaded on startup.
    /// Every mutation writes the affected collection back to disk before
    /// it returns.
    pub fn persistent<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            data_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Enable or disable pretty-printed JSON on disk.
    pub fn with_pretty_json(mut self, enabled: bool) -> Self {
        self.pretty_json = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config() {
        let config = Config::memory();
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_persistent_config() {
        let config = Config::persistent("/tmp/records");
        assert!(config.data_path.is_some());
    }
}
