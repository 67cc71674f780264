//! # SAGE - Semantic Augmented Generation Engine
//!
//! A retrieval core for RAG applications: deterministic text chunking, an
//! embedded vector store with brute-force cosine search, and streaming
//! question answering over the retrieved context.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sage::{RagOptions, RagPipeline, SageConfig, VectorStoreProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sage::AppError> {
//!     let config = SageConfig::load()?;
//!     let provider = config.provider()?;
//!
//!     let store: Arc<dyn sage::VectorStore> =
//!         config.store_provider().create_store().await?.into();
//!     let pipeline = RagPipeline::new(
//!         store,
//!         provider.create_embedding_client()?.into(),
//!         provider.create_completion_client()?.into(),
//!         config.rag_options(),
//!     );
//!
//!     pipeline.ingest_document("notes.txt", "Rust is a systems language.").await?;
//!
//!     let answer = pipeline.ask("What kind of language is Rust?").await?;
//!     // consume answer.stream ...
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | OpenAI embeddings and streaming completions (default) |
//! | `embedded-store` | Persistent embedded object store backend (default) |
//!
//! ## Modules
//!
//! - [`rag`] - Chunker, similarity engine and the retrieval pipeline
//! - [`db`] - Vector store trait and backends
//! - [`llm`] - Embedding and completion provider clients
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Vector store trait and backends.
pub mod db;
/// Embedding and completion provider clients.
pub mod llm;
/// Chunking, similarity and the retrieval pipeline.
pub mod rag;
/// Core types (documents, chunks, search results, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
#[cfg(feature = "embedded-store")]
pub use db::EmbeddedVectorStore;
pub use db::{InMemoryVectorStore, VectorStore, VectorStoreProvider};
pub use llm::{CompletionClient, CompletionStream, EmbeddingClient, Provider};
pub use rag::{cosine_similarity, top_k, RagAnswer, RagOptions, RagPipeline, TextChunker};
pub use types::{
    AppError, Chunk, ChunkReference, Document, Result, StoreStats, TextChunk, VectorSearchResult,
};
pub use utils::SageConfig;
