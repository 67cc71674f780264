//! Persistence layer for sage-store.
//!
//! This module handles saving and loading collections to/from disk.
//!
//! Layout on disk:
//! - `{base_path}/collections.json` - list of collection names
//! - `{base_path}/{name}/metadata.json` - collection name + index specs
//! - `{base_path}/{name}/records.json` - the records themselves
//!
//! Indexes are not persisted; they are rebuilt record by record on load.

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::types::{IndexSpec, RecordKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Collection metadata stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionMetadata {
    name: String,
    indexes: Vec<IndexSpec>,
}

/// Save a collection to disk.
pub(crate) async fn save_collection(
    base_path: &Path,
    collection: &Collection,
    pretty: bool,
) -> Result<()> {
    let collection_path = base_path.join(collection.name());
    tokio::fs::create_dir_all(&collection_path).await?;

    let metadata = CollectionMetadata {
        name: collection.name().to_string(),
        indexes: collection.index_specs().to_vec(),
    };

    let metadata_json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| Error::Persistence(format!("Failed to serialize metadata: {}", e)))?;
    tokio::fs::write(collection_path.join("metadata.json"), metadata_json).await?;

    let records: Vec<(RecordKey, Value)> = collection.snapshot();
    let records_json = if pretty {
        serde_json::to_string_pretty(&records)
    } else {
        serde_json::to_string(&records)
    }
    .map_err(|e| Error::Persistence(format!("Failed to serialize records: {}", e)))?;
    tokio::fs::write(collection_path.join("records.json"), records_json).await?;

    debug!(
        name = collection.name(),
        count = records.len(),
        "Saved collection"
    );
    Ok(())
}

/// Load a collection from disk, rebuilding its indexes.
pub(crate) async fn load_collection(base_path: &Path, name: &str) -> Result<Collection> {
    let collection_path = base_path.join(name);

    if !collection_path.exists() {
        return Err(Error::CollectionNotFound(name.to_string()));
    }

    let metadata_json = tokio::fs::read_to_string(collection_path.join("metadata.json")).await?;
    let metadata: CollectionMetadata = serde_json::from_str(&metadata_json)
        .map_err(|e| Error::Persistence(format!("Failed to parse metadata: {}", e)))?;

    let collection = Collection::new(metadata.name.clone(), metadata.indexes);

    let records_path = collection_path.join("records.json");
    if records_path.exists() {
        let records_json = tokio::fs::read_to_string(&records_path).await?;
        let records: Vec<(RecordKey, Value)> = serde_json::from_str(&records_json)
            .map_err(|e| Error::Persistence(format!("Failed to parse records: {}", e)))?;

        collection.put_batch(records)?;
    }

    info!(name, count = collection.len(), "Loaded collection");
    Ok(collection)
}

/// Remove a collection's files from disk.
pub(crate) async fn delete_collection_files(base_path: &Path, name: &str) -> Result<()> {
    let collection_path = base_path.join(name);
    if collection_path.exists() {
        tokio::fs::remove_dir_all(&collection_path).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_load_collection() {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path();

        let collection = Collection::new(
            "chunks".to_string(),
            vec![IndexSpec::new("by-document", "document_id")],
        );
        collection
            .put("c1", json!({"document_id": "d1", "content": "hello"}))
            .unwrap();
        collection
            .put("c2", json!({"document_id": "d1", "content": "world"}))
            .unwrap();

        save_collection(base_path, &collection, false)
            .await
            .unwrap();

        let loaded = load_collection(base_path, "chunks").await.unwrap();
        assert_eq!(loaded.name(), "chunks");
        assert_eq!(loaded.len(), 2);

        // Indexes are rebuilt on load
        let keys = loaded.keys_by_index("by-document", "d1").unwrap();
        assert_eq!(keys, vec!["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_load_missing_collection() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_collection(temp_dir.path(), "nope").await;
        assert!(matches!(result, Err(Error::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_collection_files() {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path();

        let collection = Collection::new("docs".to_string(), vec![]);
        save_collection(base_path, &collection, false)
            .await
            .unwrap();
        assert!(base_path.join("docs").exists());

        delete_collection_files(base_path, "docs").await.unwrap();
        assert!(!base_path.join("docs").exists());
    }
}
