//! End-to-end retrieval pipeline: ingest documents, retrieve context,
//! answer questions.
//!
//! The pipeline owns no provider state of its own; the embedding client,
//! completion client and vector store are injected at construction so call
//! sites decide credentials and backends.

use crate::db::VectorStore;
use crate::llm::{CompletionClient, CompletionStream, EmbeddingClient};
use crate::rag::chunker::{TextChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::types::{AppError, ChunkReference, Document, Result, StoreStats};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;
/// Default minimum similarity for a chunk to count as relevant.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Tuning knobs for chunking and retrieval.
#[derive(Debug, Clone)]
pub struct RagOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub threshold: f32,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// A streamed answer together with the context passages it was grounded in.
pub struct RagAnswer {
    pub references: Vec<ChunkReference>,
    pub stream: CompletionStream,
}

pub struct RagPipeline {
    store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    completions: Arc<dyn CompletionClient>,
    chunker: TextChunker,
    options: RagOptions,
}

impl RagPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingClient>,
        completions: Arc<dyn CompletionClient>,
        options: RagOptions,
    ) -> Self {
        let chunker = TextChunker::new(options.chunk_size, options.chunk_overlap);
        Self {
            store,
            embeddings,
            completions,
            chunker,
            options,
        }
    }

    /// Chunk, embed and persist one document.
    ///
    /// Returns `None` when the text produces zero chunks; the document is
    /// skipped with a warning rather than failing, so batch uploads can
    /// continue with their other files. Chunk creation strictly precedes
    /// embedding, which strictly precedes persistence; the chunk batch is
    /// stored as a unit before this reports success.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn ingest_document(&self, name: &str, content: &str) -> Result<Option<Document>> {
        let document_id = format!("doc-{}", Uuid::new_v4());
        let text_chunks = self.chunker.chunk(content, &document_id);

        if text_chunks.is_empty() {
            warn!(name, "Document produced zero chunks, skipping");
            return Ok(None);
        }

        let texts: Vec<String> = text_chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embeddings.embed_batch(&texts).await?;
        if embeddings.len() != text_chunks.len() {
            return Err(AppError::Provider(format!(
                "Embedding count mismatch: sent {} texts, got {} vectors",
                text_chunks.len(),
                embeddings.len()
            )));
        }

        let chunks = text_chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| chunk.with_embedding(embedding))
            .collect::<Vec<_>>();

        let document = Document {
            id: document_id,
            name: name.to_string(),
            content: content.to_string(),
            chunks: chunks.clone(),
            uploaded_at: Utc::now(),
        };

        self.store.save_document(&document).await?;
        self.store.save_chunks(&chunks).await?;

        info!(
            name,
            id = %document.id,
            chunks = document.chunks.len(),
            "Ingested document"
        );
        Ok(Some(document))
    }

    /// Embed a question and return the most relevant stored passages.
    ///
    /// An empty result means nothing scored above the threshold; provider
    /// and store failures come back as errors instead.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ChunkReference>> {
        let query_embedding = self.embeddings.embed(question).await?;

        let results = self
            .store
            .search_similar_chunks(&query_embedding, self.options.top_k, self.options.threshold)
            .await?;

        Ok(results
            .into_iter()
            .map(|r| ChunkReference {
                document_name: r.document_name,
                content: r.chunk.content,
                similarity: r.similarity,
            })
            .collect())
    }

    /// Retrieve context for `question` and stream a grounded answer.
    pub async fn ask(&self, question: &str) -> Result<RagAnswer> {
        let references = self.retrieve(question).await?;
        let stream = self
            .completions
            .stream_completion(question, &references)
            .await?;

        Ok(RagAnswer { references, stream })
    }

    /// List all stored documents.
    pub async fn documents(&self) -> Result<Vec<Document>> {
        self.store.get_all_documents().await
    }

    /// Delete a document and its chunks. Missing ids are a no-op.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        self.store.delete_document(id).await
    }

    /// Remove every document and chunk.
    pub async fn clear_all_data(&self) -> Result<()> {
        self.store.clear_all_data().await
    }

    /// Corpus counters.
    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }

    pub fn options(&self) -> &RagOptions {
        &self.options
    }
}
