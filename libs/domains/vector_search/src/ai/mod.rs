mod deepseek;
mod driver;
mod gemini;
mod manager;
mod openai;

pub use deepseek::{DeepSeekDriver, DEEPSEEK_BASE_URL};
pub use driver::{system_instruction, AiModel, ChatDriver, EmbeddingDriver};
pub use gemini::{GeminiConfig, GeminiDriver, GEMINI_BASE_URL};
pub use manager::ModelManager;
pub use openai::{OpenAiConfig, OpenAiDriver, OPENAI_BASE_URL};

#[cfg(test)]
pub(crate) use driver::{MockChatDriver, MockEmbeddingDriver};
