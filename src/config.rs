use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::embeddings::EmbeddingProvider;
use crate::FirstAidError;

/// Environment variables consulted when a key is left empty in the config file
pub const ENV_GOOGLE_CSE_API_KEY: &str = "GOOGLE_CSE_API_KEY";
pub const ENV_GOOGLE_CSE_ID: &str = "GOOGLE_CSE_ID";
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_EMBEDDING_API_KEY: &str = "EMBEDDING_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    pub provider: EmbeddingProvider,
    pub endpoint: String,
    pub model: String,
    pub dimension: usize,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates requested from the local index
    #[serde(default = "default_local_k")]
    pub local_k: usize,
    /// Candidates requested from web search
    #[serde(default = "default_web_k")]
    pub web_k: usize,
    /// Cap on the re-ranked context handed to the LLM
    #[serde(default = "default_final_context_n")]
    pub final_context_n: usize,
    /// Per-call timeout for embedding, web search and re-ranking
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Optional JSON file (array of strings) replacing the built-in corpus
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,
}

const fn default_local_k() -> usize {
    10
}

const fn default_web_k() -> usize {
    5
}

const fn default_final_context_n() -> usize {
    8
}

const fn default_call_timeout_secs() -> u64 {
    15
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            local_k: default_local_k(),
            web_k: default_web_k(),
            final_context_n: default_final_context_n(),
            call_timeout_secs: default_call_timeout_secs(),
            corpus_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_web_search_enabled")]
    pub enabled: bool,
    #[serde(default = "default_web_search_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub cse_id: String,
}

const fn default_web_search_enabled() -> bool {
    true
}

fn default_web_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_search_enabled(),
            endpoint: default_web_search_endpoint(),
            api_key: String::new(),
            cse_id: String::new(),
        }
    }
}

/// Which relevance model backs the re-ranker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RerankerProvider {
    /// HTTP cross-encoder service exposing `/rerank`
    CrossEncoder,
    /// Offline query-term overlap
    Lexical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    #[serde(default = "default_reranker_provider")]
    pub provider: RerankerProvider,
    #[serde(default = "default_reranker_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_reranker_model")]
    pub model: String,
}

const fn default_reranker_provider() -> RerankerProvider {
    RerankerProvider::CrossEncoder
}

fn default_reranker_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_reranker_model() -> String {
    "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string()
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            provider: default_reranker_provider(),
            endpoint: default_reranker_endpoint(),
            model: default_reranker_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama3-8b-8192".to_string()
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_max_tokens() -> u32 {
    400
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: default_llm_endpoint(),
            llm_key: String::new(),
            llm_model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub web_search: WebSearchConfig,
    #[serde(default)]
    pub reranker: RerankerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(FirstAidError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Fill API keys that were left empty in the file from `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut String, name: &str| {
            if slot.is_empty() {
                if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                    *slot = value;
                }
            }
        };

        fill(&mut self.web_search.api_key, ENV_GOOGLE_CSE_API_KEY);
        fill(&mut self.web_search.cse_id, ENV_GOOGLE_CSE_ID);
        fill(&mut self.llm.llm_key, ENV_GROQ_API_KEY);
        fill(&mut self.embeddings.api_key, ENV_EMBEDDING_API_KEY);
    }

    /// Reject configurations that cannot produce a working pipeline
    pub fn validate(&self) -> crate::Result<()> {
        if self.retrieval.final_context_n == 0 {
            return Err(FirstAidError::Configuration(
                "retrieval.final_context_n must be greater than zero".to_string(),
            ));
        }
        if self.embeddings.dimension == 0 {
            return Err(FirstAidError::Configuration(
                "embeddings.dimension must be greater than zero".to_string(),
            ));
        }

        let mut endpoints = vec![
            ("embeddings.endpoint", self.embeddings.endpoint.as_str()),
            ("llm.llm_endpoint", self.llm.llm_endpoint.as_str()),
        ];
        if self.web_search.enabled {
            endpoints.push(("web_search.endpoint", self.web_search.endpoint.as_str()));
        }
        if self.reranker.provider == RerankerProvider::CrossEncoder {
            endpoints.push(("reranker.endpoint", self.reranker.endpoint.as_str()));
        }

        for (name, endpoint) in endpoints {
            url::Url::parse(endpoint).map_err(|e| {
                FirstAidError::Configuration(format!("{name} is not a valid URL ({endpoint}): {e}"))
            })?;
        }

        Ok(())
    }

    /// Whether web search has everything it needs to run
    pub fn web_search_ready(&self) -> bool {
        self.web_search.enabled
            && !self.web_search.api_key.is_empty()
            && !self.web_search.cse_id.is_empty()
    }

    /// Get per-call timeout
    pub fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.retrieval.call_timeout_secs)
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM key
    pub fn llm_key(&self) -> &str {
        &self.llm.llm_key
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
            embeddings: EmbeddingsConfig {
                provider: EmbeddingProvider::Ollama,
                endpoint: "http://localhost:11434".to_string(),
                model: "all-minilm".to_string(),
                dimension: 384,
                api_key: String::new(),
            },
            retrieval: RetrievalConfig::default(),
            web_search: WebSearchConfig::default(),
            reranker: RerankerConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}
