//! Context assembly from retrieved candidates

use crate::models::Candidate;
use crate::models::CandidateSource;

/// Characters of a local snippet quoted in its citation
pub const CITATION_PREVIEW_CHARS: usize = 80;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// Returns the truncated string with a "..." suffix if truncated, otherwise
/// the original string.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Formats re-ranked candidates for the LLM prompt and for citations
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextAssembler;

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// One labelled block per candidate, separated by blank lines
    ///
    /// Every candidate is emitted, in order.
    #[must_use]
    pub fn assemble(&self, candidates: &[Candidate]) -> String {
        candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| {
                format!(
                    "[{}]\n{}",
                    Self::label(idx, candidate),
                    candidate.content.replace('\n', " ").trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn label(idx: usize, candidate: &Candidate) -> String {
        match candidate.source {
            CandidateSource::Local => format!("Local Snippet {}", idx + 1),
            CandidateSource::Web => format!(
                "Web Source {} (Title: {}, URL: {})",
                idx + 1,
                candidate.title.as_deref().unwrap_or("N/A"),
                candidate.link.as_deref().unwrap_or("N/A")
            ),
        }
    }

    /// One citation line per candidate, in context order
    #[must_use]
    pub fn citations(&self, candidates: &[Candidate]) -> Vec<String> {
        candidates.iter().map(Self::citation).collect()
    }

    fn citation(candidate: &Candidate) -> String {
        match candidate.source {
            CandidateSource::Local => {
                let preview: String = candidate
                    .content
                    .trim()
                    .chars()
                    .take(CITATION_PREVIEW_CHARS)
                    .collect();
                format!("Local Snippet: \"{preview}...\"")
            }
            CandidateSource::Web => format!(
                "Web: {} ({})",
                candidate.title.as_deref().unwrap_or("N/A"),
                candidate.link.as_deref().unwrap_or("N/A")
            ),
        }
    }

    /// Create a summary of the retrieved candidates
    #[must_use]
    pub fn create_summary(&self, candidates: &[Candidate]) -> String {
        if candidates.is_empty() {
            return "No relevant snippets found.".to_string();
        }

        let mut summary = format!("Found {} relevant snippet(s):\n\n", candidates.len());

        for (idx, candidate) in candidates.iter().enumerate() {
            let origin = match candidate.source {
                CandidateSource::Local => "local".to_string(),
                CandidateSource::Web => {
                    format!("web: {}", candidate.title.as_deref().unwrap_or("N/A"))
                }
            };

            summary.push_str(&format!(
                "{}. [{}] Score: {:.3}\n   {}\n\n",
                idx + 1,
                origin,
                candidate.score(),
                truncate_str(&candidate.content, 100)
            ));
        }

        summary
    }
}
