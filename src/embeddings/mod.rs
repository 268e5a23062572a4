//! Embeddings generation module
//!
//! This module turns text into dense vectors for the local index:
//! - OpenAI-compatible `/embeddings` endpoints
//! - Ollama (local models)
//!
//! Everything downstream depends only on the [`TextEmbedder`] trait, so the
//! retrieval layer can be driven by any vector source.
//!
//! # Examples
//!
//! ```rust,no_run
//! use firstaid_rag::config::AppConfig;
//! use firstaid_rag::embeddings::EmbeddingService;
//! use firstaid_rag::embeddings::TextEmbedder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed("chest pain radiating to the left arm").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;
pub mod text_preprocessing;

use async_trait::async_trait;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;
pub use text_preprocessing::preprocess_text_for_embedding;

use crate::errors::Result;

/// Maximum batch size for embedding generation
pub const MAX_BATCH_SIZE: usize = 100;

/// Anything that maps text to a fixed-length vector
///
/// Implementations must be deterministic for identical input and return
/// vectors of the same dimension for every call.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Dimension of every returned vector
    fn dimension(&self) -> usize;
}

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        let embeddings = &config.embeddings;
        Self {
            provider: embeddings.provider,
            model: embeddings.model.clone(),
            dimension: embeddings.dimension,
            endpoint: embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key: Some(embeddings.api_key.clone()).filter(|k| !k.is_empty()),
        }
    }
}
