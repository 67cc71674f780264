//! Embedded vector store backed by the `sage-store` object store.
//!
//! Documents and chunks live in two collections:
//!
//! - `documents`: key = document id, secondary index `by-name`
//! - `chunks`: key = chunk id, secondary index `by-document` on `document_id`
//!
//! The `by-document` index is what makes the delete cascade cheap: removing
//! a document looks up its chunk keys through the index instead of scanning
//! the whole chunk collection.

use crate::db::vectorstore::{rank_chunks, VectorStore};
use crate::types::{AppError, Chunk, Document, Result, StoreStats, VectorSearchResult};
use async_trait::async_trait;
use sage_store::{Config, IndexSpec, Store};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

const DOCUMENTS: &str = "documents";
const CHUNKS: &str = "chunks";

/// Vector store over the embedded `sage-store` backend.
pub struct EmbeddedVectorStore {
    store: Store,
}

impl EmbeddedVectorStore {
    /// Open the embedded store, creating the two collections on first use.
    ///
    /// Data is persisted under `path`, or kept in memory when `path` is
    /// `None`.
    #[instrument(skip(path))]
    pub async fn new(path: Option<String>) -> Result<Self> {
        let config = match path {
            Some(p) => Config::persistent(p),
            None => Config::memory(),
        };

        let store = Store::open(config).await.map_err(store_err)?;
        store
            .ensure_collection(DOCUMENTS, &[IndexSpec::new("by-name", "name")])
            .await
            .map_err(store_err)?;
        store
            .ensure_collection(CHUNKS, &[IndexSpec::new("by-document", "document_id")])
            .await
            .map_err(store_err)?;

        info!("Embedded vector store ready");
        Ok(Self { store })
    }
}

fn store_err(e: sage_store::Error) -> AppError {
    AppError::Store(e.to_string())
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AppError::Store(format!("Corrupt record: {}", e)))
}

#[async_trait]
impl VectorStore for EmbeddedVectorStore {
    fn provider_name(&self) -> &'static str {
        "embedded"
    }

    async fn save_document(&self, document: &Document) -> Result<()> {
        let value = serde_json::to_value(document)
            .map_err(|e| AppError::Internal(format!("Failed to serialize document: {}", e)))?;
        self.store
            .put(DOCUMENTS, &document.id, value)
            .await
            .map_err(store_err)
    }

    async fn save_chunks(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let entries = chunks
            .iter()
            .map(|chunk| {
                let value = serde_json::to_value(chunk).map_err(|e| {
                    AppError::Internal(format!("Failed to serialize chunk: {}", e))
                })?;
                Ok((chunk.id.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;

        self.store
            .put_batch(CHUNKS, entries)
            .await
            .map_err(store_err)
    }

    async fn get_all_documents(&self) -> Result<Vec<Document>> {
        self.store
            .get_all(DOCUMENTS)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        match self.store.get(DOCUMENTS, id).await.map_err(store_err)? {
            Some(value) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, id: &str) -> Result<()> {
        self.store.delete(DOCUMENTS, id).await.map_err(store_err)?;

        let chunk_keys = self
            .store
            .keys_by_index(CHUNKS, "by-document", id)
            .await
            .map_err(store_err)?;
        let removed = self
            .store
            .delete_batch(CHUNKS, &chunk_keys)
            .await
            .map_err(store_err)?;

        debug!(id, removed, "Deleted document and its chunks");
        Ok(())
    }

    async fn search_similar_chunks(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<VectorSearchResult>> {
        let chunks: Vec<Chunk> = self
            .store
            .get_all(CHUNKS)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(decode)
            .collect::<Result<_>>()?;

        let names: HashMap<String, String> = self
            .get_all_documents()
            .await?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();

        Ok(rank_chunks(chunks, &names, query_embedding, top_k, threshold))
    }

    async fn clear_all_data(&self) -> Result<()> {
        self.store.clear(DOCUMENTS).await.map_err(store_err)?;
        self.store.clear(CHUNKS).await.map_err(store_err)?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            document_count: self.store.count(DOCUMENTS).map_err(store_err)?,
            chunk_count: self.store.count(CHUNKS).map_err(store_err)?,
        })
    }
}
