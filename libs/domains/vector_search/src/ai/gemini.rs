//! Google Gemini (Generative Language API).
//!
//! Authenticates with the API key in the query string. Gemini has no
//! system role on this endpoint, so the grounding instruction and the
//! question travel together in a single user part.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::driver::{system_instruction, ChatDriver, EmbeddingDriver};
use super::openai::MODEL_TIMEOUT;
use crate::error::{VectorError, VectorResult};
use crate::models::DriverConfig;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            embedding_model: "gemini-embedding-001".to_string(),
            chat_model: "gemini-2.5-flash".to_string(),
        }
    }

    pub fn from_driver_config(config: &DriverConfig) -> VectorResult<Self> {
        let defaults = Self::new(config.require("api_key")?);
        Ok(Self {
            base_url: config
                .get_or("base_url", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            embedding_model: config
                .get_or("embedding_model", &defaults.embedding_model)
                .to_string(),
            chat_model: config.get_or("chat_model", &defaults.chat_model).to_string(),
            ..defaults
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}?key={}", self.base_url, model, method, self.api_key)
    }
}

pub struct GeminiDriver {
    config: GeminiConfig,
    transport: Arc<dyn HttpTransport>,
}

impl GeminiDriver {
    pub fn new(config: GeminiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn from_config(config: &DriverConfig) -> VectorResult<Self> {
        Ok(Self::new(
            GeminiConfig::from_driver_config(config)?,
            Arc::new(ReqwestTransport::new(MODEL_TIMEOUT)?),
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

impl Content {
    fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[async_trait]
impl EmbeddingDriver for GeminiDriver {
    #[instrument(
        skip(self, text),
        fields(provider = "gemini", model = %self.config.embedding_model)
    )]
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let body = serde_json::to_value(EmbedContentRequest {
            content: Content::text(text),
        })?;
        let url = self
            .config
            .endpoint(&self.config.embedding_model, "embedContent");

        let response: EmbedContentResponse = self
            .transport
            .post(HttpRequest::post(url, body))
            .await?
            .json("gemini", "embed")?;

        Ok(response.embedding.values)
    }
}

#[async_trait]
impl ChatDriver for GeminiDriver {
    #[instrument(
        skip(self, prompt, context),
        fields(provider = "gemini", model = %self.config.chat_model)
    )]
    async fn chat(&self, prompt: &str, context: &str) -> VectorResult<String> {
        let full_prompt = format!(
            "{}\n\nUser Question:\n{}",
            system_instruction(context),
            prompt
        );
        let body = serde_json::to_value(GenerateContentRequest {
            contents: vec![Content::text(full_prompt)],
        })?;
        let url = self.config.endpoint(&self.config.chat_model, "generateContent");

        let response: GenerateContentResponse = self
            .transport
            .post(HttpRequest::post(url, body))
            .await?
            .json("gemini", "chat")?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| VectorError::provider("gemini", "chat", "No candidate returned"))
    }
}
