//! Storage backends for documents, chunks and similarity search.

#[cfg(feature = "embedded-store")]
pub mod embedded;
pub mod vectorstore;

#[cfg(feature = "embedded-store")]
pub use embedded::EmbeddedVectorStore;
pub use vectorstore::{InMemoryVectorStore, VectorStore, VectorStoreProvider};
