//! Embedding generation service with preprocessing and batch processing

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::preprocess_text_for_embedding;
use super::EmbeddingConfig;
use super::TextEmbedder;
use super::MAX_BATCH_SIZE;
use crate::errors::FirstAidError;
use crate::errors::Result;

/// Service for generating embeddings through an HTTP provider
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config))
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Describe a dimension mismatch, if any
    fn dimension_mismatch(&self, embedding: &[f32]) -> Option<String> {
        (embedding.len() != self.config.dimension).then(|| {
            format!(
                "Model {} returned {} dimensions, configured for {}",
                self.config.model,
                embedding.len(),
                self.config.dimension
            )
        })
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider
    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }
}

#[async_trait]
impl TextEmbedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let processed_text = preprocess_text_for_embedding(text)?;
        let embedding = self.client.generate(&processed_text).await?;
        // A drifted model at query time only takes the local source down
        if let Some(mismatch) = self.dimension_mismatch(&embedding) {
            return Err(FirstAidError::EmbeddingUnavailable(mismatch));
        }
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let processed_texts = texts
            .iter()
            .map(|t| preprocess_text_for_embedding(t))
            .collect::<Result<Vec<String>>>()?;

        let mut embeddings = Vec::with_capacity(processed_texts.len());
        for chunk in processed_texts.chunks(MAX_BATCH_SIZE) {
            debug!("Embedding batch of {} texts", chunk.len());
            let chunk_embeddings = self.client.generate_batch(chunk).await?;
            embeddings.extend(chunk_embeddings);
        }

        if let Some(mismatch) = embeddings.iter().find_map(|e| self.dimension_mismatch(e)) {
            return Err(FirstAidError::Configuration(mismatch));
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama_config(endpoint: String, dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: EmbeddingProvider::Ollama,
            model: "all-minilm".to_string(),
            dimension,
            endpoint,
            api_key: None,
        }
    }

    #[tokio::test]
    async fn test_embed_checks_dimension() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding": [0.5, 0.5]}"#)
            .create_async()
            .await;

        let ok = EmbeddingService::from_config(ollama_config(server.url(), 2)).unwrap();
        assert_eq!(ok.embed("angina").await.unwrap().len(), 2);

        let wrong = EmbeddingService::from_config(ollama_config(server.url(), 384)).unwrap();
        let err = wrong.embed("angina").await.unwrap_err();
        assert!(matches!(err, FirstAidError::EmbeddingUnavailable(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_ollama_batch_embeds_every_text_in_order() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("POST", "/api/embeddings")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"prompt": "chest pain"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding": [1.0, 0.0]}"#)
            .create_async()
            .await;
        let _second = server
            .mock("POST", "/api/embeddings")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"prompt": "low blood sugar"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding": [0.0, 1.0]}"#)
            .create_async()
            .await;

        let service = EmbeddingService::from_config(ollama_config(server.url(), 2)).unwrap();
        let texts = vec!["chest pain".to_string(), "low blood sugar".to_string()];
        let embeddings = service.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_batch_dimension_mismatch_is_configuration() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding": [0.5, 0.5]}"#)
            .create_async()
            .await;

        let service = EmbeddingService::from_config(ollama_config(server.url(), 384)).unwrap();
        let err = service
            .embed_batch(&["angina".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, FirstAidError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        // Unroutable endpoint: any request would fail
        let service =
            EmbeddingService::from_config(ollama_config("http://127.0.0.1:9".to_string(), 2))
                .unwrap();
        assert!(service.embed_batch(&[]).await.unwrap().is_empty());
    }
}
