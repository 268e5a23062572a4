//! CLI command definitions and argument parsing

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "firstaid-rag")]
#[command(about = "First-aid chatbot for diabetes, cardiac and renal emergencies")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a single question and exit
    Ask {
        /// Describe the symptoms or situation
        query: String,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session; type "exit" to quit
    Chat,
    /// Show the re-ranked context for a query without calling the LLM
    Search {
        /// Query to retrieve context for
        query: String,
        /// Print the context as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
}
