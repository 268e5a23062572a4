pub mod cli;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod errors;
pub mod index;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod rag;

#[cfg(test)]
mod config_tests;

pub use config::AppConfig;
pub use errors::*;
