//! Provider abstractions for embeddings and completions.
//!
//! The retrieval pipeline talks to two provider-side capabilities through
//! these traits: turning text into vectors ([`EmbeddingClient`]) and
//! answering a question over retrieved context ([`CompletionClient`]).
//! Provider errors propagate to the caller unmodified; no retry happens at
//! this layer.

use crate::types::{AppError, ChunkReference, Result};
use async_trait::async_trait;

/// Maximum number of texts sent per embedding API call.
///
/// Larger inputs are split into batches of this size and the batches run
/// sequentially; a failed batch aborts the remaining ones.
pub const EMBED_BATCH_SIZE: usize = 100;

/// A streaming sequence of completion text fragments.
pub type CompletionStream = Box<dyn futures::Stream<Item = Result<String>> + Send + Unpin>;

/// Client for an embedding provider.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving input order.
    ///
    /// Implementations must honor [`EMBED_BATCH_SIZE`] by splitting larger
    /// inputs into sequential provider calls.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Check whether the configured credential is accepted by the provider.
    ///
    /// Returns `false` on any provider error rather than propagating it.
    async fn validate(&self) -> bool;

    /// Get the embedding model name/identifier.
    fn model_name(&self) -> &str;
}

/// Client for a completion provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Stream an answer to `question` grounded in the retrieved `context`.
    ///
    /// The stream is not restartable; callers concatenate fragments until
    /// it ends.
    async fn stream_completion(
        &self,
        question: &str,
        context: &[ChunkReference],
    ) -> Result<CompletionStream>;

    /// Get the completion model name/identifier.
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs).
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     embedding_model: "text-embedding-3-small".to_string(),
    ///     completion_model: "gpt-4o-mini".to_string(),
    /// };
    /// ```
    #[cfg(feature = "openai")]
    OpenAI {
        api_key: String,
        api_base: String,
        embedding_model: String,
        completion_model: String,
    },
}

impl Provider {
    /// Create an embedding client for this provider.
    pub fn create_embedding_client(&self) -> Result<Box<dyn EmbeddingClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                embedding_model,
                completion_model,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                embedding_model.clone(),
                completion_model.clone(),
            ))),

            #[allow(unreachable_patterns)]
            _ => Err(AppError::Configuration(
                "No completion/embedding provider enabled. Check feature flags.".into(),
            )),
        }
    }

    /// Create a completion client for this provider.
    pub fn create_completion_client(&self) -> Result<Box<dyn CompletionClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                embedding_model,
                completion_model,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                embedding_model.clone(),
                completion_model.clone(),
            ))),

            #[allow(unreachable_patterns)]
            _ => Err(AppError::Configuration(
                "No completion/embedding provider enabled. Check feature flags.".into(),
            )),
        }
    }

    /// Create a provider from environment variables.
    ///
    /// Reads `OPENAI_API_KEY`, with optional `OPENAI_API_BASE`,
    /// `SAGE_EMBEDDING_MODEL` and `SAGE_COMPLETION_MODEL` overrides.
    pub fn from_env() -> Result<Self> {
        #[cfg(feature = "openai")]
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            return Ok(Provider::OpenAI {
                api_key,
                api_base: std::env::var("OPENAI_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
                embedding_model: std::env::var("SAGE_EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".into()),
                completion_model: std::env::var("SAGE_COMPLETION_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".into()),
            });
        }

        Err(AppError::Configuration(
            "No provider configured. Set OPENAI_API_KEY or construct a Provider directly.".into(),
        ))
    }

    /// Get a human-readable name for this provider.
    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI { .. } => "OpenAI",

            #[allow(unreachable_patterns)]
            _ => "unconfigured",
        }
    }
}

/// Render retrieved chunks into the context block of the user prompt.
///
/// Each passage is labeled with its source document so the model can cite
/// it; passages are separated by a horizontal rule.
pub fn format_context(context: &[ChunkReference]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Source {}: {}]\n{}", i + 1, c.document_name, c.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str, content: &str) -> ChunkReference {
        ChunkReference {
            document_name: name.to_string(),
            content: content.to_string(),
            similarity: 0.8,
        }
    }

    #[test]
    fn test_format_context_labels_sources() {
        let context = vec![reference("notes.txt", "First passage"), reference("faq.md", "Second")];
        let formatted = format_context(&context);

        assert!(formatted.starts_with("[Source 1: notes.txt]\nFirst passage"));
        assert!(formatted.contains("\n\n---\n\n"));
        assert!(formatted.contains("[Source 2: faq.md]\nSecond"));
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(&[]), "");
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_provider_name() {
        let provider = Provider::OpenAI {
            api_key: "test".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            completion_model: "gpt-4o-mini".to_string(),
        };
        assert_eq!(provider.name(), "OpenAI");
    }
}
