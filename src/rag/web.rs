//! Web search retrieval
//!
//! Web results carry no numeric score: the engine's ordering is kept as
//! `web_rank` and never compared against local distances.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::errors::FirstAidError;
use crate::errors::Result;
use crate::models::Candidate;
use crate::models::WebHit;
use crate::rag::SourceOutcome;

/// Per-request result cap of the Custom Search JSON API
pub const MAX_RESULTS_PER_REQUEST: usize = 10;

/// Default bound on one search request
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// A third-party search engine
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Up to `max_results` hits for `query`, in engine order
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>>;
}

/// Client for the Google Custom Search JSON API
pub struct GoogleSearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    cse_id: String,
}

impl GoogleSearchClient {
    /// Create a new search client
    ///
    /// # Errors
    /// - `Configuration` when the API key or engine id is empty
    /// - HTTP client build errors
    pub fn new(endpoint: String, api_key: String, cse_id: String) -> Result<Self> {
        if api_key.is_empty() || cse_id.is_empty() {
            return Err(FirstAidError::Configuration(
                "Google Custom Search needs both an API key and an engine id".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FirstAidError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            cse_id,
        })
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        Self::new(
            config.web_search.endpoint.clone(),
            config.web_search.api_key.clone(),
            config.web_search.cse_id.clone(),
        )
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    snippet: Option<String>,
    title: Option<String>,
    link: Option<String>,
}

impl From<SearchItem> for WebHit {
    fn from(item: SearchItem) -> Self {
        Self {
            snippet: item.snippet.unwrap_or_default(),
            title: item.title.unwrap_or_else(|| "No Title".to_string()),
            link: item.link.unwrap_or_else(|| "#".to_string()),
        }
    }
}

#[async_trait]
impl WebSearchProvider for GoogleSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>> {
        let num = max_results.min(MAX_RESULTS_PER_REQUEST).to_string();
        debug!("Calling Custom Search API: q={}, num={}", query, num);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FirstAidError::WebSearch(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FirstAidError::WebSearch(format!(
                "Custom Search API error ({status}): {error_text}"
            )));
        }

        let result: SearchResponse = response
            .json()
            .await
            .map_err(|e| FirstAidError::WebSearch(format!("Failed to parse response: {e}")))?;

        Ok(result.items.into_iter().map(WebHit::from).collect())
    }
}

/// Retriever for web candidates; never fails
pub struct WebRetriever {
    provider: Option<Arc<dyn WebSearchProvider>>,
    timeout: Duration,
}

impl WebRetriever {
    pub fn new(provider: Arc<dyn WebSearchProvider>) -> Self {
        Self {
            provider: Some(provider),
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    /// A retriever with no provider; every query yields nothing
    pub fn disabled() -> Self {
        Self {
            provider: None,
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    /// Build from config, falling back to [`WebRetriever::disabled`] when
    /// web search is turned off or has no credentials
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        if !config.web_search.enabled {
            info!("Web search disabled in configuration");
            return Self::disabled();
        }

        let retriever = match GoogleSearchClient::from_config(config) {
            Ok(client) => Self::new(Arc::new(client)),
            Err(e) => {
                warn!("Web search unavailable, continuing with local results only: {}", e);
                Self::disabled()
            }
        };
        retriever.with_timeout(config.call_timeout())
    }

    /// Bound the search request
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Web candidates for `query`, or nothing on any failure
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<Candidate> {
        self.retrieve_outcome(query, k).await.into_candidates()
    }

    /// Like [`WebRetriever::retrieve`], but says why a result is empty
    pub async fn retrieve_outcome(&self, query: &str, k: usize) -> SourceOutcome {
        let Some(provider) = &self.provider else {
            return SourceOutcome::Empty;
        };
        if k == 0 {
            return SourceOutcome::Empty;
        }

        let max_results = k.min(MAX_RESULTS_PER_REQUEST);
        let hits = match tokio::time::timeout(self.timeout, provider.search(query, max_results)).await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!("Error during web search: {}", e);
                return SourceOutcome::failed(e.to_string());
            }
            Err(_) => {
                warn!("Web search timed out after {:?}", self.timeout);
                return SourceOutcome::failed(format!("timed out after {:?}", self.timeout));
            }
        };

        // Providers may ignore the requested cap
        let candidates: Vec<Candidate> = hits
            .into_iter()
            .take(max_results)
            .enumerate()
            .filter_map(|(rank, hit)| Candidate::web(hit, rank))
            .collect();

        debug!("Web search returned {} candidates", candidates.len());
        SourceOutcome::from_candidates(candidates)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    struct StubSearch {
        hits: Vec<WebHit>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WebSearchProvider for StubSearch {
        async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<WebHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.iter().take(max_results).cloned().collect())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl WebSearchProvider for FailingSearch {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<WebHit>> {
            Err(FirstAidError::WebSearch("network unreachable".to_string()))
        }
    }

    struct SlowSearch;

    #[async_trait]
    impl WebSearchProvider for SlowSearch {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<WebHit>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![WebHit::new("Too late.", "Slow", "https://slow.example")])
        }
    }

    fn three_hits_one_blank() -> Vec<WebHit> {
        vec![
            WebHit::new("Call emergency services for chest pain.", "Heart Attack", "https://a.example"),
            WebHit::new("", "Empty", "https://b.example"),
            WebHit::new("Chew aspirin if advised.", "Aspirin", "https://c.example"),
        ]
    }

    #[tokio::test]
    async fn test_empty_snippets_are_filtered() {
        let retriever = WebRetriever::new(Arc::new(StubSearch {
            hits: three_hits_one_blank(),
            calls: AtomicUsize::new(0),
        }));

        let results = retriever.retrieve("chest pain", 5).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(Candidate::is_web));
        assert!(results.iter().all(|c| c.origin_score.is_none()));
        assert_eq!(results[0].web_rank, Some(0));
        assert_eq!(results[1].web_rank, Some(2));
        assert_eq!(results[1].title.as_deref(), Some("Aspirin"));
    }

    #[tokio::test]
    async fn test_provider_failure_yields_empty() {
        let retriever = WebRetriever::new(Arc::new(FailingSearch));
        assert!(retriever.retrieve("chest pain", 5).await.is_empty());

        let outcome = retriever.retrieve_outcome("chest pain", 5).await;
        assert!(outcome.is_failed());
    }

    #[tokio::test]
    async fn test_search_timeout_yields_empty() {
        let retriever =
            WebRetriever::new(Arc::new(SlowSearch)).with_timeout(Duration::from_millis(20));

        let outcome = retriever.retrieve_outcome("chest pain", 5).await;
        assert!(matches!(&outcome, SourceOutcome::Failed { reason } if reason.contains("timed out")));
        assert!(retriever.retrieve("chest pain", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_and_zero_k_make_no_request() {
        assert_eq!(
            WebRetriever::disabled().retrieve_outcome("q", 5).await,
            SourceOutcome::Empty
        );

        let stub = Arc::new(StubSearch {
            hits: three_hits_one_blank(),
            calls: AtomicUsize::new(0),
        });
        let retriever = WebRetriever::new(stub.clone());
        assert!(retriever.retrieve("q", 0).await.is_empty());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_google_client_parses_items() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/customsearch/v1")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("cx".into(), "engine".into()),
                mockito::Matcher::UrlEncoded("num".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [
                    {"snippet": "Give glucose.", "title": "Hypoglycaemia", "link": "https://a.example"},
                    {"snippet": "No title here."}
                ]}"#,
            )
            .create_async()
            .await;

        let client = GoogleSearchClient::new(
            format!("{}/customsearch/v1", server.url()),
            "key".to_string(),
            "engine".to_string(),
        )
        .unwrap();

        // Requests above the cap are clamped to 10
        let hits = client.search("low blood sugar", 25).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Hypoglycaemia");
        assert_eq!(hits[1].title, "No Title");
        assert_eq!(hits[1].link, "#");
    }

    #[tokio::test]
    async fn test_google_client_no_items_and_quota_error() {
        let mut server = mockito::Server::new_async().await;
        let _empty = server
            .mock("GET", "/ok")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"kind": "customsearch#search"}"#)
            .create_async()
            .await;
        let _quota = server
            .mock("GET", "/quota")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_body("Quota exceeded")
            .create_async()
            .await;

        let ok = GoogleSearchClient::new(format!("{}/ok", server.url()), "k".into(), "c".into())
            .unwrap();
        assert!(ok.search("q", 5).await.unwrap().is_empty());

        let quota =
            GoogleSearchClient::new(format!("{}/quota", server.url()), "k".into(), "c".into())
                .unwrap();
        let retriever = WebRetriever::new(Arc::new(quota));
        let outcome = retriever.retrieve_outcome("q", 5).await;
        assert!(matches!(outcome, SourceOutcome::Failed { reason } if reason.contains("429")));
    }

    #[test]
    fn test_client_requires_credentials() {
        let result = GoogleSearchClient::new(
            "https://www.googleapis.com/customsearch/v1".to_string(),
            String::new(),
            "engine".to_string(),
        );
        assert!(matches!(result, Err(FirstAidError::Configuration(_))));
    }
}
