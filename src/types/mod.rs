use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Document Types =============

/// A source document along with the chunks it was split into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub content: String,
    pub chunks: Vec<Chunk>,
    pub uploaded_at: DateTime<Utc>,
}

/// One embedded chunk of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    /// Approximate character offset of the chunk in the normalized document.
    pub start_index: usize,
    pub end_index: usize,
}

/// Output of the chunker, before embeddings exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub start_index: usize,
    pub end_index: usize,
}

impl TextChunk {
    /// Attach an embedding, turning this into a storable [`Chunk`].
    pub fn with_embedding(self, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: self.id,
            document_id: self.document_id,
            content: self.content,
            embedding,
            start_index: self.start_index,
            end_index: self.end_index,
        }
    }
}

// ============= Search Types =============

/// A chunk returned from similarity search, joined with its document name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchResult {
    pub chunk: Chunk,
    pub similarity: f32,
    /// `"Unknown"` when the owning document record is missing.
    pub document_name: String,
}

/// A retrieved passage as surfaced to callers of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkReference {
    pub document_name: String,
    pub content: String,
    pub similarity: f32,
}

/// Corpus-wide counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub chunk_count: usize,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_embedding_preserves_fields() {
        let text_chunk = TextChunk {
            id: "d1-chunk-0".to_string(),
            document_id: "d1".to_string(),
            content: "hello".to_string(),
            start_index: 0,
            end_index: 5,
        };

        let chunk = text_chunk.with_embedding(vec![0.1, 0.2]);
        assert_eq!(chunk.id, "d1-chunk-0");
        assert_eq!(chunk.document_id, "d1");
        assert_eq!(chunk.embedding, vec![0.1, 0.2]);
        assert_eq!(chunk.end_index, 5);
    }
}
