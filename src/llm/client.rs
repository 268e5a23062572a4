//! OpenAI-compatible chat completions client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::FirstAidError;
use crate::errors::Result;
use crate::llm::AnswerGenerator;
use crate::llm::FirstAidPrompts;
use crate::llm::GeneratedAnswer;
use crate::models::Candidate;
use crate::rag::ContextAssembler;

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A completion and what it cost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub total_tokens: u64,
}

/// Chat completions client plus the first-aid prompt wiring
pub struct LlmService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    context_assembler: ContextAssembler,
}

impl LlmService {
    /// Create a new LLM service from configuration
    ///
    /// # Errors
    /// - `Configuration` when no API key is set
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.llm_key().is_empty() {
            return Err(FirstAidError::Configuration(
                "LLM API key is not set (llm.llm_key or GROQ_API_KEY)".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| FirstAidError::Http(e.to_string()))?;

        info!("LLM initialized with model: {}", config.llm_model());

        Ok(Self {
            client,
            endpoint: config.llm_endpoint().trim_end_matches('/').to_string(),
            api_key: config.llm_key().to_string(),
            model: config.llm_model().to_string(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            context_assembler: ContextAssembler::default(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a chat completion with the configured sampling parameters
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<Completion> {
        self.chat_with_params(messages, self.temperature, self.max_tokens)
            .await
    }

    /// Run a chat completion
    ///
    /// # Errors
    /// - `Llm` for transport failures, non-success statuses, malformed
    ///   responses or a response without choices
    pub async fn chat_with_params(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
            #[serde(default)]
            usage: Option<Usage>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessage,
        }

        #[derive(Deserialize)]
        struct Usage {
            total_tokens: u64,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {} ({} messages)", url, messages.len());

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| FirstAidError::Llm(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FirstAidError::Llm(format!(
                "Chat API error ({status}): {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| FirstAidError::Llm(format!("Failed to parse response: {e}")))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| FirstAidError::Llm("No choices in response".to_string()))?;

        Ok(Completion {
            content,
            total_tokens: result.usage.map_or(0, |u| u.total_tokens),
        })
    }
}

#[async_trait]
impl AnswerGenerator for LlmService {
    async fn generate_answer(&self, query: &str, context: &[Candidate]) -> GeneratedAnswer {
        let formatted_context = self.context_assembler.assemble(context);
        let messages = [
            ChatMessage::system(FirstAidPrompts::system_message()),
            ChatMessage::user(FirstAidPrompts::user_message(query, &formatted_context)),
        ];

        match self.chat(&messages).await {
            Ok(completion) => GeneratedAnswer {
                answer: completion.content,
                token_usage: completion.total_tokens,
                sources_used: self.context_assembler.citations(context),
            },
            Err(e) => {
                warn!("Error during LLM call: {}", e);
                GeneratedAnswer::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::DISCLAIMER;
    use crate::models::WebHit;

    fn config_for(endpoint: &str, key: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.llm_endpoint = endpoint.to_string();
        config.llm.llm_key = key.to_string();
        config
    }

    fn context() -> Vec<Candidate> {
        vec![
            Candidate::local("For severe hypoglycaemia with unconsciousness, give glucagon 1 mg.", 0.1)
                .unwrap(),
            Candidate::web(
                WebHit::new("Call emergency services.", "First Aid Guide", "https://example.com/first-aid"),
                0,
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let result = LlmService::new(&config_for("https://api.groq.com/openai/v1", ""));
        assert!(matches!(result, Err(FirstAidError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_generate_answer_reports_tokens_and_citations() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer groq-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "Condition: Hypoglycaemia"}}],
                    "usage": {"prompt_tokens": 300, "completion_tokens": 42, "total_tokens": 342}}"#,
            )
            .create_async()
            .await;

        let llm = LlmService::new(&config_for(&server.url(), "groq-key")).unwrap();
        let answer = llm.generate_answer("unconscious, sugar low", &context()).await;

        assert_eq!(answer.answer, "Condition: Hypoglycaemia");
        assert_eq!(answer.token_usage, 342);
        assert_eq!(answer.sources_used.len(), 2);
        assert_eq!(answer.sources_used[1], "Web: First Aid Guide (https://example.com/first-aid)");
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let llm = LlmService::new(&config_for(&server.url(), "bad-key")).unwrap();
        let answer = llm.generate_answer("chest pain", &context()).await;

        assert!(answer.answer.starts_with(DISCLAIMER));
        assert_eq!(answer.token_usage, 0);
        assert!(answer.sources_used.is_empty());
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let llm = LlmService::new(&config_for(&server.url(), "k")).unwrap();
        let err = llm.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, FirstAidError::Llm(_)));
    }
}
