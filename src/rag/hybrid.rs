//! Hybrid retrieval: local + web, re-ranked on one scale

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::config::RetrievalConfig;
use crate::corpus::CorpusManager;
use crate::errors::Result;
use crate::models::Candidate;
use crate::rag::reranker::RerankOutcome;
use crate::rag::LocalRetriever;
use crate::rag::ReRanker;
use crate::rag::SourceOutcome;
use crate::rag::SourceStatus;
use crate::rag::WebRetriever;

/// How one hybrid retrieval went, source by source
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalReport {
    /// Final context, best first, at most `final_context_n` long
    pub context: Vec<Candidate>,
    pub local: SourceStatus,
    pub web: SourceStatus,
    /// Candidates handed to the re-ranker
    pub combined: usize,
    /// Why re-ranking fell back to input order, if it did
    pub rerank_degraded: Option<String>,
}

impl RetrievalReport {
    fn empty(local: SourceStatus, web: SourceStatus) -> Self {
        Self {
            context: Vec::new(),
            local,
            web,
            combined: 0,
            rerank_degraded: None,
        }
    }
}

/// Orchestrates both retrievers and the re-ranker for one query
pub struct HybridRetriever {
    local: LocalRetriever,
    web: WebRetriever,
    reranker: ReRanker,
    local_k: usize,
    web_k: usize,
    final_context_n: usize,
}

impl HybridRetriever {
    /// Create a retriever with the default limits
    pub fn new(local: LocalRetriever, web: WebRetriever, reranker: ReRanker) -> Self {
        Self::with_limits(local, web, reranker, &RetrievalConfig::default())
    }

    pub fn with_limits(
        local: LocalRetriever,
        web: WebRetriever,
        reranker: ReRanker,
        limits: &RetrievalConfig,
    ) -> Self {
        Self {
            local,
            web,
            reranker,
            local_k: limits.local_k,
            web_k: limits.web_k,
            final_context_n: limits.final_context_n,
        }
    }

    /// Wire every component from configuration over a built corpus
    pub fn from_config(config: &AppConfig, corpus: Arc<CorpusManager>) -> Self {
        let local = LocalRetriever::new(corpus).with_timeout(config.call_timeout());
        let web = WebRetriever::from_config(config);
        let reranker = ReRanker::from_config(config);
        Self::with_limits(local, web, reranker, &config.retrieval)
    }

    pub fn local(&self) -> &LocalRetriever {
        &self.local
    }

    pub fn web(&self) -> &WebRetriever {
        &self.web
    }

    pub const fn final_context_n(&self) -> usize {
        self.final_context_n
    }

    /// Best `final_context_n` candidates for `query`, best first
    ///
    /// # Errors
    /// Only misconfiguration of the local index; every source outage
    /// degrades to fewer candidates instead.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Candidate>> {
        Ok(self.retrieve_with_report(query).await?.context)
    }

    /// Like [`HybridRetriever::retrieve`], with per-source status
    pub async fn retrieve_with_report(&self, query: &str) -> Result<RetrievalReport> {
        info!("Hybrid retrieval for query: {}", query);

        let (local, web) = tokio::join!(
            self.local_outcome(query),
            self.web.retrieve_outcome(query, self.web_k)
        );
        let local = local?;

        let local_status = local.status();
        let web_status = web.status();
        debug!(
            "Retrieved {} local and {} web candidates",
            local.len(),
            web.len()
        );

        // Local first, then web; ties in the re-ranker keep this order
        let mut combined = local.into_candidates();
        combined.extend(web.into_candidates());

        if combined.is_empty() {
            warn!("No candidates from any source for query: {}", query);
            return Ok(RetrievalReport::empty(local_status, web_status));
        }

        let combined_len = combined.len();
        let (mut context, rerank_degraded) = match self.reranker.rerank_outcome(query, combined).await
        {
            RerankOutcome::Ranked(candidates) => (candidates, None),
            RerankOutcome::Degraded { candidates, reason } => (candidates, Some(reason)),
        };
        context.truncate(self.final_context_n);

        info!(
            "Selected {} of {} candidates for context",
            context.len(),
            combined_len
        );

        Ok(RetrievalReport {
            context,
            local: local_status,
            web: web_status,
            combined: combined_len,
            rerank_degraded,
        })
    }

    async fn local_outcome(&self, query: &str) -> Result<SourceOutcome> {
        if self.local_k == 0 {
            return Ok(SourceOutcome::Empty);
        }

        match self.local.retrieve(query, self.local_k).await {
            Ok(candidates) => Ok(SourceOutcome::from_candidates(candidates)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Local retrieval failed, continuing with web results: {}", e);
                Ok(SourceOutcome::failed(e.to_string()))
            }
        }
    }
}
