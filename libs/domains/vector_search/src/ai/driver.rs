use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VectorResult;

/// Turns text into an embedding vector
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingDriver: Send + Sync {
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>>;
}

/// Answers a prompt grounded in retrieved context
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatDriver: Send + Sync {
    async fn chat(&self, prompt: &str, context: &str) -> VectorResult<String>;
}

/// System instruction placed ahead of every user prompt.
pub fn system_instruction(context: &str) -> String {
    format!(
        "You are a helpful assistant. Answer the user's question based ONLY on the following context:\n\nContext:\n{}",
        context
    )
}

/// A logical model: one embedding capability and one chat capability.
///
/// The built-in providers put the same driver behind both halves.
#[derive(Clone)]
pub struct AiModel {
    embedding: Arc<dyn EmbeddingDriver>,
    chat: Arc<dyn ChatDriver>,
}

impl AiModel {
    pub fn new(embedding: Arc<dyn EmbeddingDriver>, chat: Arc<dyn ChatDriver>) -> Self {
        Self { embedding, chat }
    }

    /// Share one driver for both capabilities
    pub fn from_driver<D>(driver: D) -> Self
    where
        D: EmbeddingDriver + ChatDriver + 'static,
    {
        let driver = Arc::new(driver);
        Self {
            embedding: Arc::clone(&driver) as Arc<dyn EmbeddingDriver>,
            chat: driver,
        }
    }

    pub fn embedding(&self) -> Arc<dyn EmbeddingDriver> {
        Arc::clone(&self.embedding)
    }

    pub fn chat(&self) -> Arc<dyn ChatDriver> {
        Arc::clone(&self.chat)
    }
}

impl std::fmt::Debug for AiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiModel").finish_non_exhaustive()
    }
}
