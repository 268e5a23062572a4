use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirstAidError {
    /// Invalid index input or invalid configuration; fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local index searched before it was built
    #[error("Local index has not been built")]
    NotBuilt,

    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Web search error: {0}")]
    WebSearch(String),

    #[error("Re-ranker error: {0}")]
    Reranker(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FirstAidError {
    /// Whether the error comes from index misuse or bad configuration.
    ///
    /// These are the only errors allowed to abort a query; every other
    /// variant is absorbed by the retrieval layer.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::NotBuilt)
    }
}

pub type Result<T> = std::result::Result<T, FirstAidError>;
