//! Complete RAG pipeline: Retrieve -> Re-rank -> Generate

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::corpus::CorpusManager;
use crate::errors::Result;
use crate::llm::with_disclaimer;
use crate::llm::AnswerGenerator;
use crate::llm::LlmService;
use crate::metrics::MetricsTracker;
use crate::models::Candidate;
use crate::rag::HybridRetriever;
use crate::rag::RetrievalReport;

/// Answer to one query
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Final answer, wrapped in the disclaimer
    pub answer: String,
    /// Context the answer was generated from, best first
    pub context: Vec<Candidate>,
    pub token_usage: u64,
    pub sources_used: Vec<String>,
    #[serde(skip)]
    pub report: RetrievalReport,
}

impl ChatResponse {
    /// Get a formatted string representation
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&self.answer);
        output.push_str("\n\n");
        output.push_str(&format!("Sources ({} snippets):\n", self.sources_used.len()));
        for (idx, source) in self.sources_used.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", idx + 1, source));
        }
        output
    }
}

/// First-aid chatbot: hybrid retrieval, LLM generation and session metrics
pub struct FirstAidChatbot {
    retriever: HybridRetriever,
    generator: Arc<dyn AnswerGenerator>,
    metrics: Mutex<MetricsTracker>,
}

impl FirstAidChatbot {
    /// Create a chatbot from configuration
    ///
    /// # Errors
    /// - Embedding provider errors while building the local index
    /// - LLM configuration errors (missing API key)
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let generator = Arc::new(LlmService::new(config)?);
        let corpus = Arc::new(CorpusManager::from_config(config).await?);
        let retriever = HybridRetriever::from_config(config, corpus);
        info!("First-aid chatbot initialized");
        Ok(Self::from_services(retriever, generator))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(retriever: HybridRetriever, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self {
            retriever,
            generator,
            metrics: Mutex::new(MetricsTracker::new()),
        }
    }

    /// Answer one query
    ///
    /// # Errors
    /// Only a misconfigured local index; source and LLM outages degrade the
    /// answer instead of failing it.
    pub async fn ask(&self, query: &str) -> Result<ChatResponse> {
        let started = Instant::now();
        info!("Processing query: {}", query);

        debug!("Step 1: Hybrid retrieval");
        let report = self.retriever.retrieve_with_report(query).await?;

        debug!("Step 2: Generating answer from {} snippets", report.context.len());
        let generated = self.generator.generate_answer(query, &report.context).await;

        self.metrics
            .lock()
            .await
            .record_query(started.elapsed(), generated.token_usage);

        Ok(ChatResponse {
            answer: with_disclaimer(&generated.answer),
            context: report.context.clone(),
            token_usage: generated.token_usage,
            sources_used: generated.sources_used,
            report,
        })
    }

    /// Snapshot of the session metrics
    pub async fn metrics(&self) -> MetricsTracker {
        self.metrics.lock().await.clone()
    }

    pub async fn reset_metrics(&self) {
        self.metrics.lock().await.reset();
    }

    /// Get retriever reference
    #[must_use]
    pub const fn retriever(&self) -> &HybridRetriever {
        &self.retriever
    }
}
