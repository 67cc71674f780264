//! Embedding and completion provider clients.

pub mod client;
#[cfg(feature = "openai")]
pub mod openai;

pub use client::{
    CompletionClient, CompletionStream, EmbeddingClient, Provider, EMBED_BATCH_SIZE,
};
#[cfg(feature = "openai")]
pub use openai::OpenAIClient;
