use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::driver::{system_instruction, ChatDriver, EmbeddingDriver};
use crate::error::{VectorError, VectorResult};
use crate::models::DriverConfig;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const MODEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for an OpenAI-compatible chat + embeddings API
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, embedding: impl Into<String>, chat: impl Into<String>) -> Self {
        self.embedding_model = embedding.into();
        self.chat_model = chat.into();
        self
    }

    /// Read `api_key`, `base_url`, `embedding_model` and `chat_model`,
    /// using `defaults` for whatever the block leaves out.
    pub fn from_driver_config(config: &DriverConfig, defaults: OpenAiConfig) -> VectorResult<Self> {
        Ok(Self::new(config.require("api_key")?)
            .with_base_url(config.get_or("base_url", &defaults.base_url))
            .with_models(
                config.get_or("embedding_model", &defaults.embedding_model),
                config.get_or("chat_model", &defaults.chat_model),
            ))
    }
}

/// Driver for the OpenAI API and anything speaking its wire protocol
pub struct OpenAiDriver {
    provider: &'static str,
    config: OpenAiConfig,
    transport: Arc<dyn HttpTransport>,
}

impl OpenAiDriver {
    pub fn new(config: OpenAiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::named("openai", config, transport)
    }

    /// Same wire protocol, different provider label in errors and logs
    pub fn named(
        provider: &'static str,
        config: OpenAiConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            provider,
            config,
            transport,
        }
    }

    pub fn from_config(config: &DriverConfig) -> VectorResult<Self> {
        let config = OpenAiConfig::from_driver_config(config, OpenAiConfig::new(""))?;
        Ok(Self::new(config, Arc::new(ReqwestTransport::new(MODEL_TIMEOUT)?)))
    }

    fn request(&self, path: &str, body: serde_json::Value) -> HttpRequest {
        HttpRequest::post(format!("{}/{}", self.config.base_url, path), body)
            .bearer(&self.config.api_key)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl EmbeddingDriver for OpenAiDriver {
    #[instrument(
        skip(self, text),
        fields(provider = self.provider, model = %self.config.embedding_model)
    )]
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let body = serde_json::to_value(EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        })?;

        let response: EmbeddingResponse = self
            .transport
            .post(self.request("embeddings", body))
            .await?
            .json(self.provider, "embed")?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| VectorError::provider(self.provider, "embed", "No embedding returned"))
    }
}

#[async_trait]
impl ChatDriver for OpenAiDriver {
    #[instrument(
        skip(self, prompt, context),
        fields(provider = self.provider, model = %self.config.chat_model)
    )]
    async fn chat(&self, prompt: &str, context: &str) -> VectorResult<String> {
        let body = serde_json::to_value(ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(system_instruction(context)),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(prompt.to_string()),
                },
            ],
        })?;

        let response: ChatResponse = self
            .transport
            .post(self.request("chat/completions", body))
            .await?
            .json(self.provider, "chat")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| VectorError::provider(self.provider, "chat", "No completion returned"))
    }
}
