//! AIVO Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout AIVO:
//! - Retrieved passages and conversation exchanges
//! - Generation sampling parameters
//! - Common error types
//! - Collaborator traits for the vector store and the language model
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ChatConfig, ConfigError, GenerationConfig, LlmConfig, LlmProvider, LoggingConfig,
    VectorConfig,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for AIVO operations
///
/// Backend failures are split by cause so callers can tell a dead
/// connection from an empty or unparseable answer without inspecting
/// message text.
#[derive(Error, Debug)]
pub enum AivoError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AivoError {
    /// Short stable label for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Backend { .. } => "backend_status",
            Self::EmptyResponse => "empty_response",
            Self::MalformedResponse(_) => "malformed_response",
            Self::VectorStore(_) => "vector_store",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

impl From<ConfigError> for AivoError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AivoError>;

// ============================================================================
// Retrieval Models
// ============================================================================

/// A document chunk returned by the vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Chunk text
    pub text: String,

    /// Relevance score (higher is better)
    pub score: f32,
}

impl Passage {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

// ============================================================================
// Conversation Models
// ============================================================================

/// One completed question/answer turn
///
/// Fields are private; an exchange cannot change after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    query: String,
    response: String,
    timestamp: DateTime<Utc>,
    passages: Vec<String>,
}

impl Exchange {
    /// Create an exchange stamped with the current time
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        passages: Vec<String>,
    ) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            timestamp: Utc::now(),
            passages,
        }
    }

    /// The user's question
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The assistant's answer
    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Passage texts the answer was generated from
    pub fn passages(&self) -> &[String] {
        &self.passages
    }
}

// ============================================================================
// Generation Parameters
// ============================================================================

/// Sampling parameters sent with every generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Upper bound on generated tokens
    pub max_new_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling mass
    pub top_p: f32,

    /// Enable sampling (non-deterministic output)
    pub do_sample: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            temperature: 0.7,
            top_p: 0.95,
            do_sample: true,
        }
    }
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            do_sample: config.do_sample,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for passage retrieval (vector store)
#[async_trait::async_trait]
pub trait PassageSearch: Send + Sync {
    /// Return up to `top_k` passages, most relevant first
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Passage>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Model identifier for logging
    fn model(&self) -> &str;
}

/// Trait for collection management in the vector store
#[async_trait::async_trait]
pub trait CollectionStore: Send + Sync {
    /// Names of all collections
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Drop a collection and everything in it
    async fn delete_collection(&self, name: &str) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
