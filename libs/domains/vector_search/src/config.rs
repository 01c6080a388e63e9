use std::collections::HashMap;

use core_config::{env_optional, env_or_default, env_parse, ConfigError, FromEnv};

use crate::models::DriverConfig;

/// Driver blocks for every logical store and model name, plus the defaults.
///
/// Read once at startup; blocks for unused drivers are harmless because
/// nothing is constructed until a name is first resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchConfig {
    pub default_store: String,
    pub default_embedding_model: String,
    pub default_chat_model: String,
    pub stores: HashMap<String, DriverConfig>,
    pub models: HashMap<String, DriverConfig>,
}

impl VectorSearchConfig {
    /// Empty configuration with the given defaults
    pub fn new(
        default_store: impl Into<String>,
        default_embedding_model: impl Into<String>,
        default_chat_model: impl Into<String>,
    ) -> Self {
        Self {
            default_store: default_store.into(),
            default_embedding_model: default_embedding_model.into(),
            default_chat_model: default_chat_model.into(),
            stores: HashMap::new(),
            models: HashMap::new(),
        }
    }

    pub fn with_store(mut self, name: impl Into<String>, config: DriverConfig) -> Self {
        self.stores.insert(name.into(), config);
        self
    }

    pub fn with_model(mut self, name: impl Into<String>, config: DriverConfig) -> Self {
        self.models.insert(name.into(), config);
        self
    }
}

impl FromEnv for VectorSearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let qdrant_timeout: u64 = env_parse("QDRANT_TIMEOUT_SECS", 30)?;

        let config = Self::new(
            env_or_default("VECTOR_STORE", "upstash"),
            env_or_default("VECTOR_EMBEDDING_MODEL", "openai"),
            env_or_default("VECTOR_CHAT_MODEL", "openai"),
        )
        .with_store(
            "upstash",
            DriverConfig::new()
                .with_opt("url", env_optional("UPSTASH_VECTOR_URL"))
                .with_opt("token", env_optional("UPSTASH_VECTOR_TOKEN")),
        )
        .with_store(
            "chroma",
            DriverConfig::new()
                .with("host", env_or_default("CHROMA_HOST", "127.0.0.1"))
                .with("port", env_or_default("CHROMA_PORT", "8000"))
                .with("collection", env_or_default("CHROMA_COLLECTION", "laravel-rag"))
                .with_opt("token", env_optional("CHROMA_TOKEN")),
        )
        .with_store(
            "pinecone",
            DriverConfig::new()
                .with_opt("api_key", env_optional("PINECONE_API_KEY"))
                .with_opt("host", env_optional("PINECONE_HOST")),
        )
        .with_store(
            "qdrant",
            DriverConfig::new()
                .with("url", env_or_default("QDRANT_URL", "http://localhost:6334"))
                .with_opt("api_key", env_optional("QDRANT_API_KEY"))
                .with("collection", env_or_default("QDRANT_COLLECTION", "vector-search"))
                .with("timeout_secs", qdrant_timeout.to_string()),
        )
        .with_model(
            "openai",
            DriverConfig::new()
                .with_opt("api_key", env_optional("OPENAI_API_KEY"))
                .with_opt("base_url", env_optional("OPENAI_BASE_URL"))
                .with("embedding_model", "text-embedding-3-small")
                .with("chat_model", "gpt-4o-mini"),
        )
        .with_model(
            "gemini",
            DriverConfig::new()
                .with_opt("api_key", env_optional("GEMINI_API_KEY"))
                .with("embedding_model", "gemini-embedding-001")
                .with("chat_model", "gemini-2.5-flash"),
        )
        .with_model(
            "deepseek",
            DriverConfig::new()
                .with_opt("api_key", env_optional("DEEPSEEK_API_KEY"))
                .with("embedding_model", "deepseek-embedder-v1")
                .with("chat_model", "deepseek-chat"),
        );

        Ok(config)
    }
}
