//! Chat orchestration
//!
//! One turn: retrieve passages, build the prompt against the current
//! history window, generate, then record the exchange.

use crate::prompt::{PromptBuilder, PromptConfig};
use crate::session::ConversationSession;
use aivo_core::{AppConfig, GenerationParams, LlmClient, PassageSearch, Result};
use std::sync::Arc;
use std::time::Instant;

/// Returned in place of an answer when generation fails
pub const APOLOGY: &str =
    "I apologize, but I encountered a technical issue. Please try your question again.";

/// Retrieval-augmented chatbot
pub struct ChatBot {
    /// Passage retrieval backend
    retriever: Arc<dyn PassageSearch>,

    /// LLM client
    llm_client: Arc<dyn LlmClient>,

    /// Prompt template
    prompt: PromptBuilder,

    /// Conversation history
    session: ConversationSession,

    /// Sampling parameters
    params: GenerationParams,

    /// Passages retrieved per turn
    top_k: usize,
}

impl ChatBot {
    /// Create a chatbot with default settings
    pub fn new(retriever: Arc<dyn PassageSearch>, llm_client: Arc<dyn LlmClient>) -> Self {
        Self {
            retriever,
            llm_client,
            prompt: PromptBuilder::default(),
            session: ConversationSession::default(),
            params: GenerationParams::default(),
            top_k: 2,
        }
    }

    /// Create from config
    pub fn from_config(
        retriever: Arc<dyn PassageSearch>,
        llm_client: Arc<dyn LlmClient>,
        config: &AppConfig,
    ) -> Self {
        tracing::info!(
            model = %llm_client.model(),
            retriever = %retriever.name(),
            "ChatBot initialized"
        );

        Self {
            retriever,
            llm_client,
            prompt: PromptBuilder::new(PromptConfig::from(&config.chat)),
            session: ConversationSession::new(config.chat.max_history),
            params: GenerationParams::from(&config.generation),
            top_k: config.chat.top_k,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Answer one query
    ///
    /// Generation failures are logged and answered with [`APOLOGY`]
    /// without touching the history. Retrieval failures are returned.
    pub async fn respond(&mut self, query: &str) -> Result<String> {
        let start_time = Instant::now();

        let passages = self.retriever.search(query, self.top_k).await?;
        let passage_texts: Vec<String> = passages.into_iter().map(|p| p.text).collect();
        tracing::debug!("Retrieved {} passages", passage_texts.len());

        let window = self.prompt.config().history_window;
        let prompt = self
            .prompt
            .build(query, &passage_texts, &self.session.recent(window));

        tracing::info!(
            "Calling LLM with prompt length: {} chars",
            prompt.chars().count()
        );
        let answer = match self.llm_client.generate(&prompt, &self.params).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(kind = e.kind(), "Error generating response: {e}");
                return Ok(APOLOGY.to_string());
            }
        };

        tracing::info!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "LLM response received: {} chars",
            answer.chars().count()
        );

        self.session.record(query, answer.as_str(), passage_texts);
        Ok(answer)
    }
}
