//! # sage-store
//!
//! A pure-Rust embedded object store: named collections of JSON records
//! keyed by string ids, with non-unique secondary indexes, batch-atomic
//! writes, and optional disk persistence.
//!
//! ## Features
//!
//! - **Pure Rust**: No native dependencies, compiles anywhere Rust does
//! - **Embedded**: No separate server process required
//! - **Secondary indexes**: Declared per collection, maintained on every write
//! - **Batch atomicity**: `put_batch`/`delete_batch` are all-or-nothing with
//!   respect to concurrent readers
//! - **Persistence**: Optional JSON files on disk, written back after every
//!   mutation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sage_store::{Store, Config, IndexSpec};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sage_store::Error> {
//!     // Create an in-memory store
//!     let store = Store::open(Config::memory()).await?;
//!
//!     // Create a collection with a secondary index
//!     store
//!         .create_collection("chunks", &[IndexSpec::new("by-document", "document_id")])
//!         .await?;
//!
//!     // Insert records
//!     store
//!         .put("chunks", "c1", json!({"document_id": "d1", "content": "hello"}))
//!         .await?;
//!
//!     // Look up through the index
//!     let keys = store.keys_by_index("chunks", "by-document", "d1").await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod error;
pub mod persistence;
pub mod types;

// Re-exports for convenience
pub use collection::Collection;
pub use config::Config;
pub use error::{Error, Result};
pub use types::{CollectionStats, IndexSpec, RecordKey};

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The main object store instance.
///
/// `Store` manages multiple collections, each holding keyed JSON records.
///
/// # Thread Safety
///
/// All operations on `Store` are thread-safe. The collection registry is an
/// `scc::HashMap` (lock-free reads, safe across `.await` points); each
/// collection guards its own records with a `parking_lot::RwLock`.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: Config,
    /// Async-safe concurrent hashmap from scc crate
    collections: scc::HashMap<String, Arc<Collection>>,
}

impl Store {
    /// Open or create an object store with the given configuration.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// // In-memory store
    /// let store = Store::open(Config::memory()).await?;
    ///
    /// // Persistent store
    /// let store = Store::open(Config::persistent("./data/records")).await?;
    /// ```
    #[instrument(skip(config), fields(persistent = config.data_path.is_some()))]
    pub async fn open(config: Config) -> Result<Self> {
        info!("Opening object store");

        let store = Self {
            inner: Arc::new(StoreInner {
                config: config.clone(),
                collections: scc::HashMap::new(),
            }),
        };

        // Load existing collections from disk if persistent
        if let Some(ref path) = config.data_path {
            store.load_collections(path).await?;
        }

        Ok(store)
    }

    /// Create a new collection with the given secondary indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection with the same name already exists.
    #[instrument(skip(self, indexes))]
    pub async fn create_collection(&self, name: &str, indexes: &[IndexSpec]) -> Result<()> {
        info!(name, "Creating collection");

        if self.inner.collections.contains(name) {
            return Err(Error::CollectionExists(name.to_string()));
        }

        let collection = Arc::new(Collection::new(name.to_string(), indexes.to_vec()));

        // Insert returns Err if key already exists (handles race condition)
        if self
            .inner
            .collections
            .insert(name.to_string(), collection)
            .is_err()
        {
            return Err(Error::CollectionExists(name.to_string()));
        }

        if let Some(ref path) = self.inner.config.data_path {
            self.persist_registry(path).await?;
            self.flush_collection(name).await?;
        }

        Ok(())
    }

    /// Create a collection unless it already exists.
    ///
    /// A no-op when the collection is present (e.g. loaded from disk on
    /// open); the existing index declarations are kept.
    pub async fn ensure_collection(&self, name: &str, indexes: &[IndexSpec]) -> Result<()> {
        match self.create_collection(name, indexes).await {
            Ok(()) => Ok(()),
            Err(Error::CollectionExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Delete a collection and all its records.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        info!(name, "Deleting collection");

        if self.inner.collections.remove(name).is_none() {
            return Err(Error::CollectionNotFound(name.to_string()));
        }

        if let Some(ref path) = self.inner.config.data_path {
            persistence::delete_collection_files(path, name).await?;
            self.persist_registry(path).await?;
        }

        Ok(())
    }

    /// Check if a collection exists.
    pub fn collection_exists(&self, name: &str) -> bool {
        self.inner.collections.contains(name)
    }

    /// List all collection names.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.inner.collections.scan(|k, _| {
            names.push(k.clone());
        });
        names
    }

    /// Get a reference to a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection doesn't exist.
    pub fn get_collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.inner
            .collections
            .read(name, |_, v| v.clone())
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Insert or overwrite a record in a collection.
    #[instrument(skip(self, value), fields(collection, key))]
    pub async fn put(&self, collection: &str, key: &str, value: Value) -> Result<()> {
        let col = self.get_collection(collection)?;
        col.put(key, value)?;
        debug!("Put record");
        self.flush_if_persistent(collection).await
    }

    /// Insert or overwrite a batch of records atomically.
    ///
    /// Readers observe either none or all of the batch. When persistence is
    /// enabled, the collection is durable on disk before this returns.
    ///
    /// # Returns
    ///
    /// The number of records written.
    #[instrument(skip(self, entries), fields(collection))]
    pub async fn put_batch(
        &self,
        collection: &str,
        entries: Vec<(RecordKey, Value)>,
    ) -> Result<usize> {
        let col = self.get_collection(collection)?;
        let count = col.put_batch(entries)?;
        debug!(count, "Put batch");
        self.flush_if_persistent(collection).await?;
        Ok(count)
    }

    /// Get a record by key.
    pub async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let col = self.get_collection(collection)?;
        Ok(col.get(key))
    }

    /// Get all records in a collection, in key order.
    pub async fn get_all(&self, collection: &str) -> Result<Vec<Value>> {
        let col = self.get_collection(collection)?;
        Ok(col.get_all())
    }

    /// Delete a record by key.
    ///
    /// # Returns
    ///
    /// `true` if the record was found and deleted, `false` if it didn't exist.
    #[instrument(skip(self), fields(collection, key))]
    pub async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let col = self.get_collection(collection)?;
        let deleted = col.delete(key);
        debug!(deleted, "Delete result");
        self.flush_if_persistent(collection).await?;
        Ok(deleted)
    }

    /// Delete a batch of records under a single guard.
    ///
    /// # Returns
    ///
    /// The number of records actually deleted.
    #[instrument(skip(self, keys), fields(collection, count = keys.len()))]
    pub async fn delete_batch(&self, collection: &str, keys: &[RecordKey]) -> Result<usize> {
        let col = self.get_collection(collection)?;
        let count = col.delete_batch(keys);
        debug!(count, "Deleted batch");
        self.flush_if_persistent(collection).await?;
        Ok(count)
    }

    /// Look up record keys through a secondary index.
    pub async fn keys_by_index(
        &self,
        collection: &str,
        index: &str,
        value: &str,
    ) -> Result<Vec<RecordKey>> {
        let col = self.get_collection(collection)?;
        col.keys_by_index(index, value)
    }

    /// Remove every record from a collection (the collection itself stays).
    #[instrument(skip(self))]
    pub async fn clear(&self, collection: &str) -> Result<()> {
        let col = self.get_collection(collection)?;
        col.clear();
        self.flush_if_persistent(collection).await
    }

    /// Get the number of records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        let col = self.get_collection(collection)?;
        Ok(col.len())
    }

    /// Get collection statistics.
    pub fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        let col = self.get_collection(collection)?;
        Ok(col.stats())
    }

    /// Persist the current state of every collection to disk.
    ///
    /// Mutating operations already write through, so this is only needed
    /// after out-of-band changes. For in-memory stores this is a no-op.
    #[instrument(skip(self))]
    pub async fn persist(&self) -> Result<()> {
        let Some(ref path) = self.inner.config.data_path else {
            debug!("Skipping persist for in-memory store");
            return Ok(());
        };

        info!("Persisting store to disk");

        let mut to_persist: Vec<Arc<Collection>> = Vec::new();
        self.inner.collections.scan(|_, collection| {
            to_persist.push(collection.clone());
        });

        for collection in to_persist {
            persistence::save_collection(path, &collection, self.inner.config.pretty_json).await?;
        }
        self.persist_registry(path).await
    }

    async fn flush_if_persistent(&self, name: &str) -> Result<()> {
        if let Some(ref path) = self.inner.config.data_path {
            self.flush_named_collection(path, name).await?;
        }
        Ok(())
    }

    async fn flush_collection(&self, name: &str) -> Result<()> {
        if let Some(ref path) = self.inner.config.data_path {
            self.flush_named_collection(path, name).await?;
        }
        Ok(())
    }

    async fn flush_named_collection(&self, path: &Path, name: &str) -> Result<()> {
        let col = self.get_collection(name)?;
        persistence::save_collection(path, &col, self.inner.config.pretty_json).await
    }

    // Internal: Load collections from disk
    async fn load_collections(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            tokio::fs::create_dir_all(path).await?;
            return Ok(());
        }

        let registry_path = path.join("collections.json");
        if !registry_path.exists() {
            return Ok(());
        }

        let data = tokio::fs::read_to_string(&registry_path).await?;
        let collection_names: Vec<String> = serde_json::from_str(&data)
            .map_err(|e| Error::Persistence(format!("Failed to parse collections.json: {}", e)))?;

        for name in collection_names {
            match persistence::load_collection(path, &name).await {
                Ok(collection) => {
                    let _ = self
                        .inner
                        .collections
                        .insert(name.clone(), Arc::new(collection));
                    info!(name = %name, "Loaded collection");
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "Failed to load collection, skipping");
                }
            }
        }

        Ok(())
    }

    async fn persist_registry(&self, base_path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(base_path).await?;
        let collections = self.list_collections();
        let data = serde_json::to_string_pretty(&collections)
            .map_err(|e| Error::Persistence(format!("Failed to serialize collections: {}", e)))?;
        tokio::fs::write(base_path.join("collections.json"), data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = Store::open(Config::memory()).await.unwrap();
        store.create_collection("docs", &[]).await.unwrap();

        store
            .put("docs", "d1", json!({"name": "notes.txt"}))
            .await
            .unwrap();

        let record = store.get("docs", "d1").await.unwrap().unwrap();
        assert_eq!(record["name"], "notes.txt");
        assert_eq!(store.count("docs").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_collection_lifecycle() {
        let store = Store::open(Config::memory()).await.unwrap();

        assert!(!store.collection_exists("docs"));

        store.create_collection("docs", &[]).await.unwrap();
        assert!(store.collection_exists("docs"));

        store.delete_collection("docs").await.unwrap();
        assert!(!store.collection_exists("docs"));
    }

    #[tokio::test]
    async fn test_duplicate_collection_error() {
        let store = Store::open(Config::memory()).await.unwrap();

        store.create_collection("docs", &[]).await.unwrap();
        let result = store.create_collection("docs", &[]).await;
        assert!(matches!(result, Err(Error::CollectionExists(_))));

        // ensure_collection tolerates the duplicate
        store.ensure_collection("docs", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_collection_error() {
        let store = Store::open(Config::memory()).await.unwrap();
        let result = store.get("nope", "k").await;
        assert!(matches!(result, Err(Error::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_index_roundtrip_through_store() {
        let store = Store::open(Config::memory()).await.unwrap();
        store
            .create_collection("chunks", &[IndexSpec::new("by-document", "document_id")])
            .await
            .unwrap();

        store
            .put_batch(
                "chunks",
                vec![
                    ("c1".to_string(), json!({"document_id": "d1"})),
                    ("c2".to_string(), json!({"document_id": "d2"})),
                    ("c3".to_string(), json!({"document_id": "d1"})),
                ],
            )
            .await
            .unwrap();

        let keys = store
            .keys_by_index("chunks", "by-document", "d1")
            .await
            .unwrap();
        assert_eq!(keys, vec!["c1", "c3"]);

        let removed = store.delete_batch("chunks", &keys).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("chunks").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persistent_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = Store::open(Config::persistent(&path)).await.unwrap();
            store
                .create_collection("chunks", &[IndexSpec::new("by-document", "document_id")])
                .await
                .unwrap();
            store
                .put("chunks", "c1", json!({"document_id": "d1", "content": "x"}))
                .await
                .unwrap();
        }

        let reopened = Store::open(Config::persistent(&path)).await.unwrap();
        assert!(reopened.collection_exists("chunks"));
        assert_eq!(reopened.count("chunks").unwrap(), 1);

        let keys = reopened
            .keys_by_index("chunks", "by-document", "d1")
            .await
            .unwrap();
        assert_eq!(keys, vec!["c1"]);
    }

    #[tokio::test]
    async fn test_collection_stats() {
        let store = Store::open(Config::memory()).await.unwrap();
        store
            .create_collection("chunks", &[IndexSpec::new("by-document", "document_id")])
            .await
            .unwrap();
        store
            .put("chunks", "c1", json!({"document_id": "d1"}))
            .await
            .unwrap();

        let stats = store.collection_stats("chunks").unwrap();
        assert_eq!(stats.name, "chunks");
        assert_eq!(stats.record_count, 1);
        assert_eq!(stats.indexes, vec!["by-document"]);
    }

    #[tokio::test]
    async fn test_persist_flushes_out_of_band_writes() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = Store::open(Config::persistent(&path)).await.unwrap();
            store.create_collection("docs", &[]).await.unwrap();

            // Writing through the collection handle bypasses the store's
            // write-through, so the record only reaches disk via persist().
            let col = store.get_collection("docs").unwrap();
            col.put("d1", json!({"name": "notes.txt"})).unwrap();

            store.persist().await.unwrap();
        }

        let reopened = Store::open(Config::persistent(&path)).await.unwrap();
        let record = reopened.get("docs", "d1").await.unwrap().unwrap();
        assert_eq!(record["name"], "notes.txt");

        // persist() on an in-memory store is a no-op
        let memory = Store::open(Config::memory()).await.unwrap();
        memory.persist().await.unwrap();
    }

    #[tokio::test]
    async fn test_clear() {
        let store = Store::open(Config::memory()).await.unwrap();
        store.create_collection("docs", &[]).await.unwrap();
        store.put("docs", "d1", json!({})).await.unwrap();

        store.clear("docs").await.unwrap();
        assert_eq!(store.count("docs").unwrap(), 0);
        assert!(store.collection_exists("docs"));
    }
}
