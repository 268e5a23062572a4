//! Cross-encoder re-ranking
//!
//! Local hits carry an L2 distance and web hits an engine rank; neither
//! means anything to the other. The re-ranker scores every `(query,
//! content)` pair with one relevance model and orders on that score alone.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::RerankerProvider;
use crate::errors::FirstAidError;
use crate::errors::Result;
use crate::models::Candidate;

/// Default bound on one scoring call
pub const DEFAULT_RERANK_TIMEOUT: Duration = Duration::from_secs(15);

/// A model scoring how well a text answers a query; higher is better
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// One score per text, in input order
    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>>;

    fn name(&self) -> &str;
}

/// Client for a cross-encoder served behind a `/rerank` endpoint
/// (text-embeddings-inference protocol)
pub struct CrossEncoderClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl CrossEncoderClient {
    pub fn new(endpoint: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| FirstAidError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl RelevanceScorer for CrossEncoderClient {
    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct RerankRequest<'a> {
            query: &'a str,
            texts: &'a [String],
            raw_scores: bool,
            truncate: bool,
        }

        #[derive(Deserialize)]
        struct RankedText {
            index: usize,
            score: f32,
        }

        let url = format!("{}/rerank", self.endpoint);
        debug!("Calling rerank API for {} texts: {}", texts.len(), url);

        let request = RerankRequest {
            query,
            texts,
            raw_scores: false,
            truncate: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FirstAidError::Reranker(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FirstAidError::Reranker(format!(
                "Rerank API error ({status}): {error_text}"
            )));
        }

        let ranked: Vec<RankedText> = response
            .json()
            .await
            .map_err(|e| FirstAidError::Reranker(format!("Failed to parse response: {e}")))?;

        // The service returns texts sorted by score; put scores back in input order
        let mut scores = vec![None; texts.len()];
        for item in ranked {
            let slot = scores.get_mut(item.index).ok_or_else(|| {
                FirstAidError::Reranker(format!("Score for unknown index {}", item.index))
            })?;
            *slot = Some(item.score);
        }

        scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| FirstAidError::Reranker(format!("No score for text {i}")))
            })
            .collect()
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Offline relevance: share of query terms that appear in the text
pub struct TermOverlapScorer;

impl TermOverlapScorer {
    fn terms(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() > 2)
            .map(str::to_lowercase)
            .collect()
    }

    pub fn score(query: &str, text: &str) -> f32 {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return 0.0;
        }
        let text_terms = Self::terms(text);
        let overlap = query_terms.intersection(&text_terms).count();
        overlap as f32 / query_terms.len() as f32
    }
}

#[async_trait]
impl RelevanceScorer for TermOverlapScorer {
    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        Ok(texts.iter().map(|t| Self::score(query, t)).collect())
    }

    fn name(&self) -> &str {
        "term-overlap"
    }
}

/// Result of a re-ranking pass
#[derive(Debug, Clone, PartialEq)]
pub enum RerankOutcome {
    /// Scored and sorted descending by `rerank_score`
    Ranked(Vec<Candidate>),
    /// Model unavailable: every score is 0.0 and input order is kept
    Degraded {
        candidates: Vec<Candidate>,
        reason: String,
    },
}

impl RerankOutcome {
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Ranked(candidates) | Self::Degraded { candidates, .. } => candidates,
        }
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        match self {
            Self::Ranked(candidates) | Self::Degraded { candidates, .. } => candidates,
        }
    }
}

/// Descending by score, NaN last
fn by_score_desc(a: &Candidate, b: &Candidate) -> Ordering {
    let key = |c: &Candidate| match c.rerank_score {
        Some(s) if !s.is_nan() => s,
        _ => f32::NEG_INFINITY,
    };
    key(b).total_cmp(&key(a))
}

/// Re-ranker over any [`RelevanceScorer`]
pub struct ReRanker {
    scorer: Option<Arc<dyn RelevanceScorer>>,
    timeout: Duration,
}

impl ReRanker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self {
            scorer: Some(scorer),
            timeout: DEFAULT_RERANK_TIMEOUT,
        }
    }

    /// A re-ranker whose model failed to load; always degraded
    pub fn unavailable() -> Self {
        Self {
            scorer: None,
            timeout: DEFAULT_RERANK_TIMEOUT,
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        let reranker = match config.reranker.provider {
            RerankerProvider::Lexical => Self::new(Arc::new(TermOverlapScorer)),
            RerankerProvider::CrossEncoder => match CrossEncoderClient::new(
                config.reranker.endpoint.clone(),
                config.reranker.model.clone(),
            ) {
                Ok(client) => {
                    info!("Using re-ranker model: {}", config.reranker.model);
                    Self::new(Arc::new(client))
                }
                Err(e) => {
                    warn!("Error loading re-ranker model {}: {}", config.reranker.model, e);
                    Self::unavailable()
                }
            },
        };
        reranker.with_timeout(config.call_timeout())
    }

    /// Bound the scoring call
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Score and sort `candidates`; see [`ReRanker::rerank_outcome`]
    pub async fn rerank(&self, query: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
        self.rerank_outcome(query, candidates).await.into_candidates()
    }

    /// Score every candidate against `query` and sort descending
    ///
    /// Ties keep input order. If the model is missing, fails, times out or
    /// returns the wrong number of scores, every candidate gets 0.0 and the
    /// input order is returned unchanged.
    pub async fn rerank_outcome(&self, query: &str, mut candidates: Vec<Candidate>) -> RerankOutcome {
        if candidates.is_empty() {
            return RerankOutcome::Ranked(candidates);
        }

        let scores = match self.score(query, &candidates).await {
            Ok(scores) => scores,
            Err(reason) => {
                warn!("Re-ranker unavailable, keeping original order: {}", reason);
                for candidate in &mut candidates {
                    candidate.rerank_score = Some(0.0);
                }
                return RerankOutcome::Degraded { candidates, reason };
            }
        };

        for (candidate, score) in candidates.iter_mut().zip(scores) {
            candidate.rerank_score = Some(score);
        }

        // Stable: equal scores keep their input positions
        candidates.sort_by(by_score_desc);
        debug!("Re-ranked {} candidates", candidates.len());
        RerankOutcome::Ranked(candidates)
    }

    async fn score(&self, query: &str, candidates: &[Candidate]) -> std::result::Result<Vec<f32>, String> {
        let scorer = self
            .scorer
            .as_ref()
            .ok_or_else(|| "re-ranker model not loaded".to_string())?;

        let texts: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let scores = tokio::time::timeout(self.timeout, scorer.score_batch(query, &texts))
            .await
            .map_err(|_| format!("{} timed out after {:?}", scorer.name(), self.timeout))?
            .map_err(|e| e.to_string())?;

        if scores.len() == candidates.len() {
            Ok(scores)
        } else {
            Err(format!(
                "{} returned {} scores for {} candidates",
                scorer.name(),
                scores.len(),
                candidates.len()
            ))
        }
    }
}
