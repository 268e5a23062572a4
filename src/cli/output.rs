//! CLI output formatting utilities

use crate::rag::ChatResponse;
use crate::rag::RetrievalReport;
use crate::rag::SourceStatus;
use crate::AppConfig;

/// Show only the last four characters of a secret
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}

fn describe_status(status: &SourceStatus) -> String {
    match status {
        SourceStatus::Ok(n) => format!("{n} candidate(s)"),
        SourceStatus::Failed(reason) => format!("unavailable ({reason})"),
    }
}

/// Print the welcome banner for interactive sessions
pub fn print_banner() {
    println!("\n--- Welcome to the RAG-Powered First-Aid Chatbot ---");
    println!("Focus areas: Diabetes, Cardiac, Renal Emergencies.");
    println!(
        "Always remember: This bot provides educational first-aid guidance only. \
         It is not a substitute for professional medical advice."
    );
    println!("In case of a medical emergency, call emergency services immediately.");
    println!("\nType your medical symptoms or questions. Type 'exit' to quit.");
}

/// Print an answer with its citations
pub fn print_response(response: &ChatResponse) {
    println!("\n--- Chatbot's First-Aid Guidance ---");
    println!("{}", response.format());
}

/// Print per-source status for one retrieval
pub fn print_report(report: &RetrievalReport) {
    println!("🔍 Retrieval:");
    println!("  Local: {}", describe_status(&report.local));
    println!("  Web: {}", describe_status(&report.web));
    println!("  Combined: {}", report.combined);
    match &report.rerank_degraded {
        Some(reason) => println!("  Re-ranking: skipped ({reason})"),
        None => println!("  Re-ranking: ok"),
    }
    println!();
}

pub fn print_config(config: &AppConfig) {
    println!("📋 First-Aid RAG Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {:?}", config.embeddings.provider);
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!();

    println!("📚 Retrieval:");
    println!("  Local k: {}", config.retrieval.local_k);
    println!("  Web k: {}", config.retrieval.web_k);
    println!("  Final context: {}", config.retrieval.final_context_n);
    println!("  Call timeout: {}s", config.retrieval.call_timeout_secs);
    match &config.retrieval.corpus_path {
        Some(path) => println!("  Corpus: {}", path.display()),
        None => println!("  Corpus: built-in"),
    }
    println!();

    println!("🌐 Web search:");
    println!("  Enabled: {}", config.web_search.enabled);
    println!("  Ready: {}", config.web_search_ready());
    println!("  API key: {}", mask_secret(&config.web_search.api_key));
    println!("  Engine id: {}", mask_secret(&config.web_search.cse_id));
    println!();

    println!("⚖️  Re-ranker:");
    println!("  Provider: {:?}", config.reranker.provider);
    println!("  Endpoint: {}", config.reranker.endpoint);
    println!("  Model: {}", config.reranker.model);
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!("  Key: {}", mask_secret(config.llm_key()));
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}

pub fn print_prompt(msg: &str) {
    print!("{msg}");
    let _ = std::io::Write::flush(&mut std::io::stdout());
}
