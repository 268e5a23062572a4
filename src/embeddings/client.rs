//! Embedding API clients for various providers

use std::time::Duration;

use futures::stream::StreamExt;
use futures::stream::{self};
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::FirstAidError;
use crate::errors::Result;

/// Concurrent requests used to emulate batching on Ollama
const OLLAMA_CONCURRENCY: usize = 16;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// `OpenAI`-compatible embeddings API
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

/// Client for generating embeddings from various providers
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    /// - Missing API key for the `OpenAI` provider
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
    ) -> Result<Self> {
        if provider == EmbeddingProvider::OpenAI && api_key.is_none() {
            return Err(FirstAidError::Configuration(
                "OpenAI embedding provider requires an API key".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FirstAidError::Http(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            endpoint,
            api_key,
            client,
        })
    }

    pub const fn provider(&self) -> EmbeddingProvider {
        self.provider
    }

    /// Generate embedding for a single text
    ///
    /// # Errors
    /// - `EmbeddingUnavailable` for transport failures, non-success statuses
    ///   and malformed responses
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        match self.provider {
            EmbeddingProvider::OpenAI => {
                let mut batch = self.generate_batch_openai(&[text.to_string()]).await?;
                batch.pop().ok_or_else(|| {
                    FirstAidError::EmbeddingUnavailable("No embedding in response".to_string())
                })
            }
            EmbeddingProvider::Ollama => self.generate_ollama(text).await,
        }
    }

    /// Generate embeddings for multiple texts in batch
    pub async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.provider {
            EmbeddingProvider::OpenAI => self.generate_batch_openai(texts).await,
            EmbeddingProvider::Ollama => {
                // Ollama doesn't support batch, so fan out with bounded concurrency
                let concurrency = texts.len().clamp(1, OLLAMA_CONCURRENCY);
                let results: Vec<Result<Vec<f32>>> = stream::iter(texts.iter().cloned())
                    .map(|text| async move { self.generate_ollama(&text).await })
                    .buffered(concurrency)
                    .collect()
                    .await;

                results.into_iter().collect()
            }
        }
    }

    /// Generate embeddings in batch using `OpenAI` API
    async fn generate_batch_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct OpenAIBatchRequest<'a> {
            input: &'a [String],
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            index: usize,
            embedding: Vec<f32>,
        }

        let api_key = self.api_key.as_deref().unwrap_or_default();
        let expected = texts.len();
        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {} items", expected);

        let request = OpenAIBatchRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| FirstAidError::EmbeddingUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FirstAidError::EmbeddingUnavailable(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let mut result: OpenAIResponse = response.json().await.map_err(|e| {
            FirstAidError::EmbeddingUnavailable(format!("Failed to parse response: {e}"))
        })?;

        if result.data.len() != expected {
            return Err(FirstAidError::EmbeddingUnavailable(format!(
                "Expected {expected} embeddings, got {}",
                result.data.len()
            )));
        }

        // The API may return items out of order
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Generate embedding using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FirstAidError::EmbeddingUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FirstAidError::EmbeddingUnavailable(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response.json().await.map_err(|e| {
            FirstAidError::EmbeddingUnavailable(format!("Failed to parse response: {e}"))
        })?;

        if result.embedding.is_empty() {
            return Err(FirstAidError::EmbeddingUnavailable(
                "Ollama returned an empty embedding".to_string(),
            ));
        }

        Ok(result.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_key() {
        let result = EmbeddingClient::new(
            EmbeddingProvider::OpenAI,
            "text-embedding-3-small".to_string(),
            "https://api.openai.com/v1".to_string(),
            None,
        );
        assert!(matches!(result, Err(FirstAidError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_ollama_embedding_with_mock() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding": [0.1, 0.2, 0.3]}"#)
            .create_async()
            .await;

        let client = EmbeddingClient::new(
            EmbeddingProvider::Ollama,
            "all-minilm".to_string(),
            server.url(),
            None,
        )
        .unwrap();

        let embedding = client.generate("low blood sugar").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);

        let batch = client
            .generate_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn test_openai_batch_reorders_by_index() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": [
                    {"index": 1, "embedding": [2.0]},
                    {"index": 0, "embedding": [1.0]}
                ]}"#,
            )
            .create_async()
            .await;

        let client = EmbeddingClient::new(
            EmbeddingProvider::OpenAI,
            "text-embedding-3-small".to_string(),
            server.url(),
            Some("test-key".to_string()),
        )
        .unwrap();

        let batch = client
            .generate_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(batch, vec![vec![1.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embeddings")
            .with_status(503)
            .with_body("model loading")
            .create_async()
            .await;

        let client = EmbeddingClient::new(
            EmbeddingProvider::Ollama,
            "all-minilm".to_string(),
            server.url(),
            None,
        )
        .unwrap();

        let err = client.generate("chest pain").await.unwrap_err();
        assert!(matches!(err, FirstAidError::EmbeddingUnavailable(_)));
        assert!(err.to_string().contains("503"));
    }
}
