//! Layered configuration: defaults, an optional `sage.toml` file, and
//! `SAGE__`-prefixed environment variables, later layers winning.

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SageConfig {
    #[serde(default)]
    pub openai: OpenAISettings,

    #[serde(default)]
    pub rag: RagSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAISettings {
    /// Taken from `OPENAI_API_KEY` when not set explicitly.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_completion_model")]
    pub completion_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Data directory for the embedded store; in-memory when unset.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    5
}

fn default_threshold() -> f32 {
    0.3
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            embedding_model: default_embedding_model(),
            completion_model: default_completion_model(),
        }
    }
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            threshold: default_threshold(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { path: None }
    }
}

impl Default for SageConfig {
    fn default() -> Self {
        Self {
            openai: OpenAISettings::default(),
            rag: RagSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

impl SageConfig {
    /// Load configuration from `sage.toml` (if present) and the
    /// environment. `SAGE__RAG__TOP_K=10` style variables override file
    /// values; `OPENAI_API_KEY` fills the credential when the file leaves
    /// it unset.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("sage").required(false))
            .add_source(config::Environment::with_prefix("SAGE").separator("__"))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to load config: {}", e)))?;

        let mut cfg: SageConfig = settings
            .try_deserialize()
            .map_err(|e| AppError::Configuration(format!("Invalid config: {}", e)))?;

        if cfg.openai.api_key.is_none() {
            cfg.openai.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        Ok(cfg)
    }

    /// Build a provider from the `[openai]` section.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no API key is available.
    #[cfg(feature = "openai")]
    pub fn provider(&self) -> Result<crate::llm::Provider> {
        let api_key = self
            .openai
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration("OPENAI_API_KEY is not set".into()))?;

        Ok(crate::llm::Provider::OpenAI {
            api_key,
            api_base: self.openai.api_base.clone(),
            embedding_model: self.openai.embedding_model.clone(),
            completion_model: self.openai.completion_model.clone(),
        })
    }

    /// Build a store provider from the `[store]` section.
    pub fn store_provider(&self) -> crate::db::VectorStoreProvider {
        #[cfg(feature = "embedded-store")]
        {
            crate::db::VectorStoreProvider::Embedded {
                path: self.store.path.clone(),
            }
        }

        #[cfg(not(feature = "embedded-store"))]
        crate::db::VectorStoreProvider::InMemory
    }

    /// Pipeline options from the `[rag]` section.
    pub fn rag_options(&self) -> crate::rag::RagOptions {
        crate::rag::RagOptions {
            chunk_size: self.rag.chunk_size,
            chunk_overlap: self.rag.chunk_overlap,
            top_k: self.rag.top_k,
            threshold: self.rag.threshold,
        }
    }
}
