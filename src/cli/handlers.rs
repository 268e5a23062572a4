//! CLI command handlers

use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::info;

use crate::cli::output::*;
use crate::corpus::CorpusManager;
use crate::rag::ContextAssembler;
use crate::rag::FirstAidChatbot;
use crate::rag::HybridRetriever;
use crate::AppConfig;
use crate::Result;

/// What the interactive loop should do with one input line
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Exit,
    Empty,
    Query(&'a str),
}

impl<'a> ChatInput<'a> {
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else if line.is_empty() {
            Self::Empty
        } else {
            Self::Query(line)
        }
    }
}

/// Handle ask command
pub async fn handle_ask(config: &AppConfig, query: &str, json: bool) -> Result<()> {
    let chatbot = FirstAidChatbot::new(config).await?;
    let response = chatbot.ask(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

/// Handle chat command: read queries until "exit" or end of input
pub async fn handle_chat(config: &AppConfig) -> Result<()> {
    let chatbot = FirstAidChatbot::new(config).await?;
    print_banner();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt("\nYour symptoms: ");
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ChatInput::parse(&line) {
            ChatInput::Exit => break,
            ChatInput::Empty => {
                print_warning("Please enter some symptoms.");
            }
            ChatInput::Query(query) => {
                println!("\nProcessing your request...");
                match chatbot.ask(query).await {
                    Ok(response) => print_response(&response),
                    Err(e) => print_error(&format!("Could not answer: {e}")),
                }
            }
        }
    }

    println!("\n--- End of Session Metrics ---");
    println!("{}", chatbot.metrics().await);
    print_success("Thank you for using the chatbot. Stay safe!");
    Ok(())
}

/// Handle search command: retrieval and re-ranking only
pub async fn handle_search(config: &AppConfig, query: &str, json: bool) -> Result<()> {
    let corpus = Arc::new(CorpusManager::from_config(config).await?);
    info!("Local corpus ready with {} snippets", corpus.len());

    let retriever = HybridRetriever::from_config(config, corpus);
    let report = retriever.retrieve_with_report(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.context)?);
        return Ok(());
    }

    print_info(&format!("Context for: \"{query}\""));
    println!();
    print_report(&report);
    println!("{}", ContextAssembler::default().create_summary(&report.context));
    Ok(())
}

/// Handle config command
pub fn handle_config(config: &AppConfig) -> Result<()> {
    print_config(config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_input() {
        assert_eq!(ChatInput::parse("exit"), ChatInput::Exit);
        assert_eq!(ChatInput::parse("  EXIT \n"), ChatInput::Exit);
        assert_eq!(ChatInput::parse("   "), ChatInput::Empty);
        assert_eq!(
            ChatInput::parse(" chest pain \n"),
            ChatInput::Query("chest pain")
        );
    }
}
