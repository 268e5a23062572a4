//! RAG (Retrieval-Augmented Generation) module
//!
//! This module provides end-to-end RAG functionality for first-aid queries:
//! - Semantic retrieval over the local snippet index
//! - Live web search
//! - Cross-encoder re-ranking of both sources on one relevance scale
//! - Context assembly and LLM-based answer generation
//!
//! # Examples
//!
//! ```rust,no_run
//! use firstaid_rag::config::AppConfig;
//! use firstaid_rag::rag::FirstAidChatbot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let chatbot = FirstAidChatbot::new(&config).await?;
//!
//!     let response = chatbot.ask("my glucometer reads 55 mg/dL").await?;
//!     println!("{}", response.answer);
//!     println!("Context: {} snippets", response.context.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod hybrid;
pub mod pipeline;
pub mod reranker;
pub mod retriever;
pub mod web;

pub use context::ContextAssembler;
pub use hybrid::HybridRetriever;
pub use hybrid::RetrievalReport;
pub use pipeline::ChatResponse;
pub use pipeline::FirstAidChatbot;
pub use reranker::CrossEncoderClient;
pub use reranker::ReRanker;
pub use reranker::RelevanceScorer;
pub use reranker::RerankOutcome;
pub use reranker::TermOverlapScorer;
pub use retriever::LocalRetriever;
pub use web::GoogleSearchClient;
pub use web::WebRetriever;
pub use web::WebSearchProvider;

use crate::models::Candidate;

/// What one retrieval source produced for a query
///
/// A failed source is not an error: it contributes nothing and the
/// pipeline carries on. The variant records why, so callers and tests can
/// tell an empty answer from an outage.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// At least one candidate
    Hits(Vec<Candidate>),
    /// The source worked but had nothing to return
    Empty,
    /// The source failed; its error was absorbed
    Failed { reason: String },
}

impl SourceOutcome {
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        if candidates.is_empty() {
            Self::Empty
        } else {
            Self::Hits(candidates)
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Hits(candidates) => candidates.len(),
            Self::Empty | Self::Failed { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> SourceStatus {
        match self {
            Self::Hits(candidates) => SourceStatus::Ok(candidates.len()),
            Self::Empty => SourceStatus::Ok(0),
            Self::Failed { reason } => SourceStatus::Failed(reason.clone()),
        }
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        match self {
            Self::Hits(candidates) => candidates,
            Self::Empty | Self::Failed { .. } => Vec::new(),
        }
    }
}

/// Summary of a source outcome, kept after its candidates are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Ok(usize),
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_candidates() {
        assert_eq!(SourceOutcome::from_candidates(Vec::new()), SourceOutcome::Empty);

        let candidate = Candidate::local("Chest pain may indicate MI.", 1.0).unwrap();
        let outcome = SourceOutcome::from_candidates(vec![candidate]);
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.status(), SourceStatus::Ok(1));
    }

    #[test]
    fn test_failed_outcome_has_no_candidates() {
        let outcome = SourceOutcome::failed("quota exceeded");
        assert!(outcome.is_failed());
        assert!(outcome.is_empty());
        assert_eq!(outcome.status(), SourceStatus::Failed("quota exceeded".to_string()));
        assert!(outcome.into_candidates().is_empty());
    }
}
