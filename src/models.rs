use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Which retriever produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Local,
    Web,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// One retrieved snippet with its provenance and scores
///
/// `origin_score` and `web_rank` come from the retriever that produced the
/// candidate and are only meaningful within that retriever. Final ordering
/// uses `rerank_score` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub content: String,
    pub source: CandidateSource,
    /// Squared L2 distance for local hits (lower is better)
    pub origin_score: Option<f32>,
    /// Position in the web result list
    pub web_rank: Option<usize>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub rerank_score: Option<f32>,
}

impl Candidate {
    /// Build a local candidate; `None` when the snippet is blank
    #[must_use]
    pub fn local(content: impl Into<String>, distance: f32) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return None;
        }
        Some(Self {
            content,
            source: CandidateSource::Local,
            origin_score: Some(distance),
            web_rank: None,
            title: None,
            link: None,
            rerank_score: None,
        })
    }

    /// Build a web candidate; `None` when the snippet is blank
    #[must_use]
    pub fn web(hit: WebHit, rank: usize) -> Option<Self> {
        if hit.snippet.trim().is_empty() {
            return None;
        }
        Some(Self {
            content: hit.snippet,
            source: CandidateSource::Web,
            origin_score: None,
            web_rank: Some(rank),
            title: Some(hit.title),
            link: Some(hit.link),
            rerank_score: None,
        })
    }

    pub fn is_local(&self) -> bool {
        self.source == CandidateSource::Local
    }

    pub fn is_web(&self) -> bool {
        self.source == CandidateSource::Web
    }

    /// Re-rank score, or 0.0 before re-ranking has run
    pub fn score(&self) -> f32 {
        self.rerank_score.unwrap_or(0.0)
    }
}

/// Raw item returned by a web search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub snippet: String,
    pub title: String,
    pub link: String,
}

impl WebHit {
    pub fn new(
        snippet: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            snippet: snippet.into(),
            title: title.into(),
            link: link.into(),
        }
    }
}
