//! Embedding client for turning queries into vectors
//!
//! Supports the Hugging Face feature-extraction pipeline and the
//! Ollama embedding API.

use aivo_core::{AivoError, LlmConfig, LlmProvider, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Embedding Trait
// ============================================================================

/// Trait for embedding generation
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding model identifier
    fn model(&self) -> &str;
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AivoError::Config(format!("Failed to build HTTP client: {e}")))
}

// ============================================================================
// Hugging Face Embedding Client
// ============================================================================

/// Hugging Face feature-extraction client
pub struct HuggingFaceEmbedding {
    client: Client,
    token: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
}

/// Sentence models return one vector, token models return one per token
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Sentence(Vec<f32>),
    Tokens(Vec<Vec<f32>>),
}

impl FeatureExtractionResponse {
    fn into_vector(self) -> Result<Vec<f32>> {
        match self {
            Self::Sentence(v) if !v.is_empty() => Ok(v),
            Self::Tokens(rows) => mean_pool(rows),
            Self::Sentence(_) => Err(AivoError::EmptyResponse),
        }
    }
}

fn mean_pool(rows: Vec<Vec<f32>>) -> Result<Vec<f32>> {
    let Some(width) = rows.first().map(Vec::len) else {
        return Err(AivoError::EmptyResponse);
    };
    if width == 0 {
        return Err(AivoError::EmptyResponse);
    }
    if rows.iter().any(|r| r.len() != width) {
        return Err(AivoError::MalformedResponse(
            "token embeddings have uneven width".to_string(),
        ));
    }

    let mut pooled = vec![0.0f32; width];
    for row in &rows {
        for (acc, x) in pooled.iter_mut().zip(row) {
            *acc += x;
        }
    }
    let n = rows.len() as f32;
    pooled.iter_mut().for_each(|x| *x /= n);
    Ok(pooled)
}

impl HuggingFaceEmbedding {
    /// Create a new Hugging Face embedding client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: None,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            token: config.hf_token.clone(),
            base_url: config.hf_base_url.clone(),
            model: config.embedding_model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/pipeline/feature-extraction/{}",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl EmbeddingClient for HuggingFaceEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut request = self
            .client
            .post(self.endpoint())
            .json(&FeatureExtractionRequest { inputs: text });
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AivoError::Transport(format!("Embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AivoError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let result: FeatureExtractionResponse = response.json().await.map_err(|e| {
            AivoError::MalformedResponse(format!("Failed to parse embedding response: {e}"))
        })?;

        result.into_vector()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama Embedding Client
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config.ollama_url.clone(),
            model: config.embedding_model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AivoError::Transport(format!("Ollama embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AivoError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let result: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            AivoError::MalformedResponse(format!("Failed to parse embedding response: {e}"))
        })?;

        if result.embedding.is_empty() {
            return Err(AivoError::EmptyResponse);
        }
        Ok(result.embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config
pub fn create_embedding_client(config: &LlmConfig) -> Result<Box<dyn EmbeddingClient>> {
    match config.provider {
        LlmProvider::HuggingFace => Ok(Box::new(HuggingFaceEmbedding::from_config(config)?)),
        LlmProvider::Ollama => Ok(Box::new(OllamaEmbedding::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hf_endpoint() {
        let client = HuggingFaceEmbedding::new(
            "https://api-inference.huggingface.co/",
            "sentence-transformers/all-MiniLM-L6-v2",
        )
        .with_token("hf_test");
        assert_eq!(
            client.endpoint(),
            "https://api-inference.huggingface.co/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2"
        );
        assert_eq!(client.token.as_deref(), Some("hf_test"));
    }

    #[test]
    fn test_sentence_response_parses() {
        let parsed: FeatureExtractionResponse = serde_json::from_str("[0.1, 0.2, 0.3]").unwrap();
        assert_eq!(parsed.into_vector().unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_token_response_is_mean_pooled() {
        let parsed: FeatureExtractionResponse =
            serde_json::from_str("[[1.0, 2.0], [3.0, 4.0]]").unwrap();
        assert_eq!(parsed.into_vector().unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_empty_response_is_rejected() {
        let parsed: FeatureExtractionResponse = serde_json::from_str("[]").unwrap();
        assert!(matches!(
            parsed.into_vector(),
            Err(AivoError::EmptyResponse)
        ));
    }

    #[test]
    fn test_uneven_token_rows_are_malformed() {
        assert!(matches!(
            mean_pool(vec![vec![1.0, 2.0], vec![3.0]]),
            Err(AivoError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_factory_follows_provider() {
        let mut config = LlmConfig::default();
        let client = create_embedding_client(&config).unwrap();
        assert_eq!(client.model(), "sentence-transformers/all-MiniLM-L6-v2");

        config.provider = LlmProvider::Ollama;
        config.embedding_model = "nomic-embed-text".to_string();
        let client = create_embedding_client(&config).unwrap();
        assert_eq!(client.model(), "nomic-embed-text");
    }
}
