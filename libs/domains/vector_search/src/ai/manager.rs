use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::deepseek::DeepSeekDriver;
use super::driver::{AiModel, ChatDriver, EmbeddingDriver};
use super::gemini::GeminiDriver;
use super::openai::OpenAiDriver;
use crate::config::VectorSearchConfig;
use crate::error::VectorResult;
use crate::manager::DriverManager;
use crate::models::DriverConfig;

/// Resolves logical model names ("openai", "gemini", ...) to [`AiModel`]s.
pub struct ModelManager {
    models: DriverManager<AiModel>,
    default_embedding: String,
}

impl ModelManager {
    /// `default_chat` doubles as the default for [`model`](Self::model).
    pub fn new(
        default_embedding: impl Into<String>,
        default_chat: impl Into<String>,
        configs: HashMap<String, DriverConfig>,
    ) -> Self {
        let models = DriverManager::new("AI model", default_chat, configs)
            .with_builtin("openai", |config| {
                Ok(Arc::new(AiModel::from_driver(OpenAiDriver::from_config(config)?)))
            })
            .with_builtin("gemini", |config| {
                Ok(Arc::new(AiModel::from_driver(GeminiDriver::from_config(config)?)))
            })
            .with_builtin("deepseek", |config| {
                Ok(Arc::new(AiModel::from_driver(DeepSeekDriver::from_config(config)?)))
            });

        Self {
            models,
            default_embedding: default_embedding.into(),
        }
    }

    pub fn from_config(config: &VectorSearchConfig) -> Self {
        Self::new(
            config.default_embedding_model.clone(),
            config.default_chat_model.clone(),
            config.models.clone(),
        )
    }

    /// Logical model by name, defaulting to the chat model
    pub fn model(&self, name: Option<&str>) -> VectorResult<Arc<AiModel>> {
        self.models.resolve(name)
    }

    pub fn embedding_driver(&self, name: Option<&str>) -> VectorResult<Arc<dyn EmbeddingDriver>> {
        let name = name.unwrap_or(self.default_embedding.as_str());
        Ok(self.models.resolve(Some(name))?.embedding())
    }

    pub fn chat_driver(&self, name: Option<&str>) -> VectorResult<Arc<dyn ChatDriver>> {
        Ok(self.models.resolve(name)?.chat())
    }

    /// Register a custom model factory; see [`DriverManager::extend`]
    pub fn extend<F>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        F: Fn(&DriverConfig) -> VectorResult<AiModel> + Send + Sync + 'static,
    {
        self.models
            .extend(name, move |config| factory(config).map(Arc::new));
        self
    }

    pub fn forget(&self, name: &str) -> bool {
        self.models.forget(name)
    }

    pub fn config(&self, name: &str) -> VectorResult<&DriverConfig> {
        self.models.config(name)
    }

    pub fn default_embedding(&self) -> &str {
        &self.default_embedding
    }

    pub fn default_chat(&self) -> &str {
        self.models.default_name()
    }
}

/// Embeds with the default embedding model
#[async_trait]
impl EmbeddingDriver for ModelManager {
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        self.embedding_driver(None)?.embed(text).await
    }
}

/// Chats with the default chat model
#[async_trait]
impl ChatDriver for ModelManager {
    async fn chat(&self, prompt: &str, context: &str) -> VectorResult<String> {
        self.chat_driver(None)?.chat(prompt, context).await
    }
}
