//! Local semantic retrieval over the snippet index

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::corpus::CorpusManager;
use crate::errors::FirstAidError;
use crate::errors::Result;
use crate::models::Candidate;

/// Default bound on the query embedding call
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(15);

/// Retriever for the local first-aid corpus
pub struct LocalRetriever {
    corpus: Arc<CorpusManager>,
    timeout: Duration,
}

impl LocalRetriever {
    /// Create a new retriever over a built corpus
    pub fn new(corpus: Arc<CorpusManager>) -> Self {
        Self {
            corpus,
            timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }

    /// Bound the embedding call
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn corpus(&self) -> &Arc<CorpusManager> {
        &self.corpus
    }

    /// Top `k` local candidates for `query`, closest first
    ///
    /// # Errors
    /// - `EmbeddingUnavailable` when the query cannot be embedded in time or
    ///   its dimension no longer matches the index
    /// - `NotBuilt` / `Configuration` for index misuse
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Candidate>> {
        debug!("Performing local search: {}", query);

        let query_embedding =
            tokio::time::timeout(self.timeout, self.corpus.embedder().embed(query))
                .await
                .map_err(|_| {
                    FirstAidError::EmbeddingUnavailable(format!(
                        "query embedding timed out after {:?}",
                        self.timeout
                    ))
                })??;

        let index = self.corpus.index();
        if let Some(dimension) = index.dimension() {
            if query_embedding.len() != dimension {
                return Err(FirstAidError::EmbeddingUnavailable(format!(
                    "query embedding has {} dimensions, index has {}",
                    query_embedding.len(),
                    dimension
                )));
            }
        }

        let hits = index.search(&query_embedding, k)?;

        let results: Vec<Candidate> = hits
            .into_iter()
            .filter_map(|hit| Candidate::local(hit.snippet, hit.distance))
            .collect();

        debug!("Local search returned {} candidates", results.len());
        Ok(results)
    }
}
