//! LLM Client implementations
//!
//! Provides clients for the Hugging Face text-generation inference API
//! and the Ollama generate API.

use aivo_core::{AivoError, GenerationParams, LlmClient, LlmConfig, LlmProvider, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AivoError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Turn a non-success status into a backend error
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AivoError::Backend {
        status: status.as_u16(),
        body,
    })
}

fn non_empty(text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(AivoError::EmptyResponse)
    } else {
        Ok(text)
    }
}

// ============================================================================
// Hugging Face Client
// ============================================================================

/// Hugging Face inference API client
pub struct HuggingFaceClient {
    client: Client,
    token: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: TextGenerationParameters,
}

#[derive(Debug, Serialize)]
struct TextGenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    do_sample: bool,
    return_full_text: bool,
}

impl From<&GenerationParams> for TextGenerationParameters {
    fn from(params: &GenerationParams) -> Self {
        Self {
            max_new_tokens: params.max_new_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            do_sample: params.do_sample,
            return_full_text: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// The endpoint answers with a list, some deployments with a bare object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextGenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

impl TextGenerationResponse {
    fn into_text(self) -> Result<String> {
        let text = match self {
            Self::Batch(items) => items
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or(AivoError::EmptyResponse)?,
            Self::Single(item) => item.generated_text,
        };
        non_empty(text)
    }
}

impl HuggingFaceClient {
    /// Create a new Hugging Face client
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
        if config.hf_token.is_none() {
            tracing::warn!("HF_TOKEN not set; using anonymous inference quota");
        }

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            token: config.hf_token.clone(),
            base_url: config.hf_base_url.clone(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}

#[async_trait]
impl LlmClient for HuggingFaceClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let request = TextGenerationRequest {
            inputs: prompt,
            parameters: params.into(),
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AivoError::Transport(format!("Request failed: {e}")))?;
        let response = check_status(response).await?;

        let result: TextGenerationResponse = response
            .json()
            .await
            .map_err(|e| AivoError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        result.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama Client
// ============================================================================

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

impl From<&GenerationParams> for OllamaOptions {
    fn from(params: &GenerationParams) -> Self {
        Self {
            // Ollama has no sampling switch; zero temperature is greedy.
            temperature: if params.do_sample {
                params.temperature
            } else {
                0.0
            },
            top_p: params.top_p,
            num_predict: params.max_new_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct OllamaResponse {
    response: String,
    done: bool,
}

impl OllamaClient {
    /// Create a new Ollama client
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
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: params.into(),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AivoError::Transport(format!("Ollama request failed: {e}")))?;
        let response = check_status(response).await?;

        let result: OllamaResponse = response.json().await.map_err(|e| {
            AivoError::MalformedResponse(format!("Failed to parse Ollama response: {e}"))
        })?;

        non_empty(result.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an LLM client from config
pub fn create_llm_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider {
        LlmProvider::HuggingFace => Ok(Box::new(HuggingFaceClient::from_config(config)?)),
        LlmProvider::Ollama => Ok(Box::new(OllamaClient::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huggingface_client_creation() {
        let client = HuggingFaceClient::new(
            "https://api-inference.huggingface.co/",
            "meta-llama/Llama-3.2-11B-Vision-Instruct",
        )
        .with_token("hf_test");
        assert_eq!(client.model(), "meta-llama/Llama-3.2-11B-Vision-Instruct");
        assert_eq!(
            client.endpoint(),
            "https://api-inference.huggingface.co/models/meta-llama/Llama-3.2-11B-Vision-Instruct"
        );
    }

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new("http://localhost:11434", "llama3");
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_text_generation_request_shape() {
        let params = GenerationParams::default();
        let request = TextGenerationRequest {
            inputs: "prompt",
            parameters: (&params).into(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["inputs"], "prompt");
        assert_eq!(json["parameters"]["max_new_tokens"], 256);
        assert_eq!(json["parameters"]["do_sample"], true);
        assert_eq!(json["parameters"]["return_full_text"], false);
    }

    #[test]
    fn test_text_generation_response_variants() {
        let batch: TextGenerationResponse =
            serde_json::from_str(r#"[{"generated_text": "Paging splits memory."}]"#).unwrap();
        assert_eq!(batch.into_text().unwrap(), "Paging splits memory.");

        let single: TextGenerationResponse =
            serde_json::from_str(r#"{"generated_text": "A mutex."}"#).unwrap();
        assert_eq!(single.into_text().unwrap(), "A mutex.");
    }

    #[test]
    fn test_empty_generation_is_distinguished() {
        let empty: TextGenerationResponse = serde_json::from_str("[]").unwrap();
        assert!(matches!(empty.into_text(), Err(AivoError::EmptyResponse)));

        let blank: TextGenerationResponse =
            serde_json::from_str(r#"[{"generated_text": "  "}]"#).unwrap();
        assert!(matches!(blank.into_text(), Err(AivoError::EmptyResponse)));
    }

    #[test]
    fn test_error_payload_is_malformed() {
        let parsed = serde_json::from_str::<TextGenerationResponse>(
            r#"{"error": "Model is currently loading"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_ollama_greedy_when_sampling_disabled() {
        let params = GenerationParams {
            do_sample: false,
            ..Default::default()
        };
        let options = OllamaOptions::from(&params);
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.num_predict, 256);
    }

    #[test]
    fn test_factory_follows_provider() {
        let mut config = LlmConfig::default();
        assert_eq!(
            create_llm_client(&config).unwrap().model(),
            "meta-llama/Llama-3.2-11B-Vision-Instruct"
        );

        config.provider = LlmProvider::Ollama;
        config.model = "llama3".to_string();
        assert_eq!(create_llm_client(&config).unwrap().model(), "llama3");
    }
}
