//! Text preprocessing utilities for embedding generation
//!
//! Cleans and normalizes text before it is sent to an embedding model.

use tracing::debug;
use tracing::warn;

use crate::errors::FirstAidError;

/// Longest text (in characters) sent to the embedding model
pub const MAX_EMBEDDING_CHARS: usize = 1500;

/// Preprocess text for embedding generation
///
/// This function handles:
/// - Normalizing whitespace and newlines
/// - Replacing control characters
/// - Truncating long texts at a word boundary
pub fn preprocess_text_for_embedding(text: &str) -> Result<String, FirstAidError> {
    let sanitized = sanitize_text(text);

    if sanitized.is_empty() {
        return Err(FirstAidError::EmbeddingUnavailable(
            "Text is empty after preprocessing".to_string(),
        ));
    }

    if sanitized.chars().count() > MAX_EMBEDDING_CHARS {
        warn!(
            "Text too long ({} chars), truncating to {}",
            sanitized.chars().count(),
            MAX_EMBEDDING_CHARS
        );
        return Ok(truncate_at_word_boundary(&sanitized, MAX_EMBEDDING_CHARS));
    }

    debug!(
        "Preprocessed text: {} -> {} chars",
        text.len(),
        sanitized.len()
    );
    Ok(sanitized)
}

/// Replace control characters and collapse all whitespace runs to one space
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Cut to `max_chars` characters, backing off to the last space when possible
fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(' ') {
        // Only back off if it keeps most of the text
        Some(pos) if pos > truncated.len() / 2 => truncated[..pos].to_string(),
        _ => truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_normalization() {
        let processed = preprocess_text_for_embedding("chest\npain\r\n\tleft   arm").unwrap();
        assert_eq!(processed, "chest pain left arm");
    }

    #[test]
    fn test_control_characters_replaced() {
        let processed = preprocess_text_for_embedding("glucose\u{0007}tablets").unwrap();
        assert_eq!(processed, "glucose tablets");
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(preprocess_text_for_embedding("").is_err());
        assert!(preprocess_text_for_embedding(" \n\t ").is_err());
    }

    #[test]
    fn test_long_text_truncated_at_word() {
        let long = "hypoglycaemia ".repeat(200);
        let processed = preprocess_text_for_embedding(&long).unwrap();
        assert!(processed.chars().count() <= MAX_EMBEDDING_CHARS);
        assert!(processed.ends_with("hypoglycaemia"));
    }

    #[test]
    fn test_unicode_is_kept() {
        let processed = preprocess_text_for_embedding("glucose ≥ 126 mg/dL — confirm").unwrap();
        assert!(processed.contains('≥'));
    }
}
