//! LLM answer generation
//!
//! Talks to any OpenAI-compatible chat completions endpoint (Groq by
//! default). Generation never fails the pipeline: a provider error turns
//! into a fixed apology that still carries the disclaimer.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
pub use client::ChatMessage;
pub use client::LlmService;
pub use prompts::with_disclaimer;
pub use prompts::FirstAidPrompts;
pub use prompts::PromptTemplate;
pub use prompts::DISCLAIMER;
use serde::Deserialize;
use serde::Serialize;

use crate::models::Candidate;

/// Answer produced for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub answer: String,
    /// Total tokens reported by the provider; 0 on fallback
    pub token_usage: u64,
    /// Citation lines for the context that was sent
    pub sources_used: Vec<String>,
}

impl GeneratedAnswer {
    /// The apology returned when the provider is unreachable
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            answer: FirstAidPrompts::fallback_answer(),
            token_usage: 0,
            sources_used: Vec::new(),
        }
    }
}

/// Something that turns a query and its context into an answer
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate_answer(&self, query: &str, context: &[Candidate]) -> GeneratedAnswer;
}
