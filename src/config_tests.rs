//! Unit tests for configuration module
//!
//! These tests validate configuration parsing, defaults, and validation.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use crate::config::*;
    use crate::embeddings::EmbeddingProvider;
    use crate::FirstAidError;

    const MINIMAL: &str = r#"
[logging]
level = "debug"
backtrace = false

[embeddings]
provider = "ollama"
endpoint = "http://localhost:11434"
model = "all-minilm"
dimension = 384
"#;

    // ====== Default Value Tests ======

    #[test]
    fn test_retrieval_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.retrieval.local_k, 10);
        assert_eq!(config.retrieval.web_k, 5);
        assert_eq!(config.retrieval.final_context_n, 8);
        assert_eq!(config.retrieval.call_timeout_secs, 15);
        assert!(config.retrieval.corpus_path.is_none());
    }

    #[test]
    fn test_llm_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.llm_model(), "llama3-8b-8192");
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.llm.max_tokens, 400);
        assert!(config.llm_endpoint().contains("groq"));
    }

    #[test]
    fn test_reranker_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.reranker.provider, RerankerProvider::CrossEncoder);
        assert_eq!(config.reranker.model, "cross-encoder/ms-marco-MiniLM-L-6-v2");
    }

    #[test]
    fn test_embedding_provider_parsing() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.embeddings.provider, EmbeddingProvider::Ollama);
        assert_eq!(config.embedding_dimension(), 384);

        let openai = MINIMAL.replace("\"ollama\"", "\"openai\"");
        let config = AppConfig::from_toml_str(&openai).unwrap();
        assert_eq!(config.embeddings.provider, EmbeddingProvider::OpenAI);
    }

    #[test]
    fn test_lexical_reranker_parsing() {
        let toml = format!("{MINIMAL}\n[reranker]\nprovider = \"lexical\"\n");
        let config = AppConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config.reranker.provider, RerankerProvider::Lexical);
    }

    // ====== Environment Override Tests ======

    #[test]
    fn test_env_overrides_fill_empty_keys() {
        let env: HashMap<&str, &str> = [
            (ENV_GOOGLE_CSE_API_KEY, "cse-key"),
            (ENV_GOOGLE_CSE_ID, "cse-id"),
            (ENV_GROQ_API_KEY, "groq-key"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert!(!config.web_search_ready());

        config.apply_env_overrides(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.web_search.api_key, "cse-key");
        assert_eq!(config.web_search.cse_id, "cse-id");
        assert_eq!(config.llm_key(), "groq-key");
        assert!(config.embeddings.api_key.is_empty());
        assert!(config.web_search_ready());
    }

    #[test]
    fn test_env_overrides_keep_file_values() {
        let toml = format!("{MINIMAL}\n[llm]\nllm_key = \"from-file\"\n");
        let mut config = AppConfig::from_toml_str(&toml).unwrap();
        config.apply_env_overrides(|_| Some("from-env".to_string()));
        assert_eq!(config.llm_key(), "from-file");
    }

    // ====== Validation Tests ======

    #[test]
    fn test_validate_default_config() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_context() {
        let mut config = AppConfig::default();
        config.retrieval.final_context_n = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, FirstAidError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = AppConfig::default();
        config.reranker.endpoint = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reranker.endpoint"));

        // Lexical re-ranking never calls the endpoint
        config.reranker.provider = RerankerProvider::Lexical;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.backtrace);
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[logging\nlevel = ").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, FirstAidError::TomlParsing(_)));
    }
}
