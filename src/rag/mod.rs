//! Retrieval-augmented generation: chunking, similarity and the pipeline
//! that ties them to a store and provider clients.

pub mod chunker;
pub mod pipeline;
pub mod similarity;

pub use chunker::TextChunker;
pub use pipeline::{RagAnswer, RagOptions, RagPipeline};
pub use similarity::{cosine_similarity, top_k};
