//! Vector Store Abstraction Layer
//!
//! This module provides a unified interface over the document/chunk storage
//! backends, so the retrieval pipeline can work against an embedded
//! persistent store or a plain in-memory map through a common trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use sage::db::vectorstore::{VectorStore, VectorStoreProvider};
//!
//! // Embedded store, persisted on disk
//! let store = VectorStoreProvider::Embedded {
//!     path: Some("./data/sage".into()),
//! }
//! .create_store()
//! .await?;
//!
//! store.save_document(&document).await?;
//! store.save_chunks(&document.chunks).await?;
//!
//! let hits = store.search_similar_chunks(&query_embedding, 5, 0.3).await?;
//! ```

use crate::rag::similarity::{cosine_similarity, top_k};
use crate::types::{Chunk, Document, Result, StoreStats, VectorSearchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Document name substituted when a chunk's owning document is missing,
/// e.g. after a concurrent delete.
pub const UNKNOWN_DOCUMENT_NAME: &str = "Unknown";

// ============================================================================
// Vector Store Provider Configuration
// ============================================================================

/// Configuration for vector store providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Embedded object store (default). Pure Rust, no separate server.
    ///
    /// Data is persisted under `path`, or kept in memory when `path` is
    /// `None`.
    #[cfg(feature = "embedded-store")]
    Embedded {
        /// Path to the data directory (None for in-memory).
        path: Option<String>,
    },

    /// In-memory vector store for testing.
    ///
    /// Data is not persisted and will be lost when the process exits.
    InMemory,
}

impl VectorStoreProvider {
    /// Create a vector store instance from this provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails to open or the provider
    /// feature is not enabled.
    pub async fn create_store(&self) -> Result<Box<dyn VectorStore>> {
        match self {
            #[cfg(feature = "embedded-store")]
            VectorStoreProvider::Embedded { path } => {
                let store = super::embedded::EmbeddedVectorStore::new(path.clone()).await?;
                Ok(Box::new(store))
            }

            VectorStoreProvider::InMemory => {
                let store = InMemoryVectorStore::new();
                Ok(Box::new(store))
            }
        }
    }

    /// Create a provider from environment variables.
    ///
    /// `SAGE_STORE_PATH` selects a persistent embedded store; otherwise the
    /// embedded store runs in memory (falling back to the plain in-memory
    /// store when the feature is disabled).
    pub fn from_env() -> Self {
        #[cfg(feature = "embedded-store")]
        {
            let path = std::env::var("SAGE_STORE_PATH").ok();
            return VectorStoreProvider::Embedded { path };
        }

        #[cfg(not(feature = "embedded-store"))]
        VectorStoreProvider::InMemory
    }
}

// ============================================================================
// Vector Store Trait
// ============================================================================

/// Abstract trait for document/chunk storage and similarity search.
///
/// # Implementors
///
/// - `EmbeddedVectorStore` - Embedded object store, optional persistence (default)
/// - `InMemoryVectorStore` - Testing only
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Upsert a document record. An existing document with the same id is
    /// overwritten.
    async fn save_document(&self, document: &Document) -> Result<()>;

    /// Upsert a batch of chunks as a single logical transaction: concurrent
    /// readers observe either none or all of the batch. An empty batch is a
    /// no-op, not an error.
    ///
    /// # Returns
    ///
    /// The number of chunks written.
    async fn save_chunks(&self, chunks: &[Chunk]) -> Result<usize>;

    /// Get all documents. Ordering is whatever deterministic order the
    /// backing store provides.
    async fn get_all_documents(&self) -> Result<Vec<Document>>;

    /// Get a document by id.
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Delete a document and cascade to every chunk owned by it, via the
    /// by-document index. A missing id is a no-op, not an error.
    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Brute-force similarity search over all stored chunks.
    ///
    /// Each chunk is scored against `query_embedding` with cosine
    /// similarity and joined to its owning document's name
    /// ([`UNKNOWN_DOCUMENT_NAME`] if the join misses). Results at or above
    /// `threshold` come back sorted by similarity descending, truncated to
    /// `top_k`.
    async fn search_similar_chunks(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Empty both the document and chunk collections.
    async fn clear_all_data(&self) -> Result<()>;

    /// Count documents and chunks.
    async fn stats(&self) -> Result<StoreStats>;
}

/// Score chunks against a query, join document names and select the top K.
///
/// Shared by the store implementations so ranking semantics cannot drift
/// between backends.
pub(crate) fn rank_chunks(
    chunks: Vec<Chunk>,
    document_names: &HashMap<String, String>,
    query_embedding: &[f32],
    k: usize,
    threshold: f32,
) -> Vec<VectorSearchResult> {
    let scored: Vec<(Chunk, f32)> = chunks
        .into_iter()
        .map(|chunk| {
            let similarity = cosine_similarity(query_embedding, &chunk.embedding);
            (chunk, similarity)
        })
        .collect();

    top_k(scored, k, threshold)
        .into_iter()
        .map(|(chunk, similarity)| {
            let document_name = document_names
                .get(&chunk.document_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_DOCUMENT_NAME.to_string());
            VectorSearchResult {
                chunk,
                similarity,
                document_name,
            }
        })
        .collect()
}

// ============================================================================
// In-Memory Vector Store (for testing)
// ============================================================================

use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory vector store for testing purposes.
///
/// Data is not persisted and will be lost when the process exits.
pub struct InMemoryVectorStore {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Default)]
struct InMemoryState {
    documents: HashMap<String, Document>,
    chunks: HashMap<String, Chunk>,
}

impl InMemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryState::default())),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn save_document(&self, document: &Document) -> Result<()> {
        let mut state = self.state.write();
        state
            .documents
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn save_chunks(&self, chunks: &[Chunk]) -> Result<usize> {
        // Single write guard: the batch becomes visible all at once.
        let mut state = self.state.write();
        for chunk in chunks {
            state.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn get_all_documents(&self) -> Result<Vec<Document>> {
        let state = self.state.read();
        let mut documents: Vec<Document> = state.documents.values().cloned().collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let state = self.state.read();
        Ok(state.documents.get(id).cloned())
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        // One guard covers both steps, so no other delete or insert for the
        // same document id can interleave.
        let mut state = self.state.write();
        state.documents.remove(id);
        state.chunks.retain(|_, chunk| chunk.document_id != id);
        Ok(())
    }

    async fn search_similar_chunks(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<VectorSearchResult>> {
        let (chunks, names) = {
            let state = self.state.read();
            let mut chunks: Vec<Chunk> = state.chunks.values().cloned().collect();
            chunks.sort_by(|a, b| a.id.cmp(&b.id));
            let names: HashMap<String, String> = state
                .documents
                .values()
                .map(|d| (d.id.clone(), d.name.clone()))
                .collect();
            (chunks, names)
        };

        Ok(rank_chunks(chunks, &names, query_embedding, top_k, threshold))
    }

    async fn clear_all_data(&self) -> Result<()> {
        let mut state = self.state.write();
        state.documents.clear();
        state.chunks.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let state = self.state.read();
        Ok(StoreStats {
            document_count: state.documents.len(),
            chunk_count: state.chunks.len(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_document(id: &str, name: &str) -> Document {
        Document {
            id: id.to_string(),
            name: name.to_string(),
            content: "content".to_string(),
            chunks: vec![],
            uploaded_at: Utc::now(),
        }
    }

    fn test_chunk(id: &str, document_id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: document_id.to_string(),
            content: format!("chunk {}", id),
            embedding,
            start_index: 0,
            end_index: 10,
        }
    }

    #[tokio::test]
    async fn test_save_and_get_documents() {
        let store = InMemoryVectorStore::new();

        store.save_document(&test_document("d1", "one.txt")).await.unwrap();
        store.save_document(&test_document("d2", "two.txt")).await.unwrap();

        let docs = store.get_all_documents().await.unwrap();
        assert_eq!(docs.len(), 2);

        let doc = store.get_document("d1").await.unwrap().unwrap();
        assert_eq!(doc.name, "one.txt");
    }

    #[tokio::test]
    async fn test_save_document_overwrites() {
        let store = InMemoryVectorStore::new();

        store.save_document(&test_document("d1", "old.txt")).await.unwrap();
        store.save_document(&test_document("d1", "new.txt")).await.unwrap();

        let docs = store.get_all_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "new.txt");
    }

    #[tokio::test]
    async fn test_empty_chunk_batch_is_noop() {
        let store = InMemoryVectorStore::new();
        let written = store.save_chunks(&[]).await.unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_delete_document_cascades() {
        let store = InMemoryVectorStore::new();
        store.save_document(&test_document("d1", "one.txt")).await.unwrap();
        store
            .save_chunks(&[
                test_chunk("d1-chunk-0", "d1", vec![1.0, 0.0]),
                test_chunk("d1-chunk-1", "d1", vec![0.0, 1.0]),
                test_chunk("d2-chunk-0", "d2", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        store.delete_document("d1").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.chunk_count, 1);

        // Deleting a missing id is a no-op
        store.delete_document("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_search_ranks_and_joins() {
        let store = InMemoryVectorStore::new();
        store.save_document(&test_document("d1", "one.txt")).await.unwrap();
        store
            .save_chunks(&[
                test_chunk("c1", "d1", vec![1.0, 0.0]),
                test_chunk("c2", "d1", vec![0.9, 0.1]),
                test_chunk("c3", "d1", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store
            .search_similar_chunks(&[1.0, 0.0], 10, 0.5)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "c1");
        assert_eq!(results[1].chunk.id, "c2");
        assert_eq!(results[0].document_name, "one.txt");
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_search_unknown_document_fallback() {
        let store = InMemoryVectorStore::new();
        // Chunk whose owning document was never stored
        store
            .save_chunks(&[test_chunk("c1", "ghost", vec![1.0, 0.0])])
            .await
            .unwrap();

        let results = store
            .search_similar_chunks(&[1.0, 0.0], 5, 0.0)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_name, UNKNOWN_DOCUMENT_NAME);
    }

    #[tokio::test]
    async fn test_search_respects_top_k() {
        let store = InMemoryVectorStore::new();
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| test_chunk(&format!("c{}", i), "d1", vec![1.0, i as f32 * 0.01]))
            .collect();
        store.save_chunks(&chunks).await.unwrap();

        let results = store
            .search_similar_chunks(&[1.0, 0.0], 3, 0.0)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_clear_all_data() {
        let store = InMemoryVectorStore::new();
        store.save_document(&test_document("d1", "one.txt")).await.unwrap();
        store
            .save_chunks(&[test_chunk("c1", "d1", vec![1.0])])
            .await
            .unwrap();

        store.clear_all_data().await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.chunk_count, 0);
    }
}
