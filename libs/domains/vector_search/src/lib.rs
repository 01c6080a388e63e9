//! Vector Search Domain Library
//!
//! Retrieval-augmented generation over pluggable embedding/chat models and
//! pluggable vector databases.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │   VectorSearch   │        │    VectorSync    │  ← record observer (write path)
//! │ similar / chat   │        └───┬──────────┬───┘
//! └───┬──────────┬───┘            │          │
//!     │          │                │          │
//! ┌───▼──────────▼───┐        ┌───▼──────────▼───┐
//! │   ModelManager   │        │   StoreManager   │  ← lazy, cached, extendable
//! └────────┬─────────┘        └────────┬─────────┘
//!          │                           │
//! ┌────────▼─────────┐        ┌────────▼─────────┐
//! │ EmbeddingDriver  │        │VectorStoreDriver │
//! │ ChatDriver       │        │  Upstash, Chroma │
//! │ OpenAI, Gemini,  │        │  Pinecone, Qdrant│
//! │ DeepSeek         │        └──────────────────┘
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use core_config::FromEnv;
//! use domain_vector_search::{
//!     RecordHooks, RecordRegistry, VectorSearch, VectorSearchConfig, VectorSync,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VectorSearchConfig::from_env()?;
//! let search = VectorSearch::from_config(&config, RecordRegistry::new());
//!
//! // Keep vectors in step with saved records
//! let hooks = RecordHooks::new();
//! hooks.subscribe(Arc::new(VectorSync::new(
//!     Arc::clone(search.model()),
//!     Arc::clone(search.store()),
//! )))?;
//!
//! let answer = search.chat("How do I reset my password?").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod ai;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod record;
pub mod service;
pub mod stores;
pub mod sync;
pub mod transport;

pub use ai::{AiModel, ChatDriver, EmbeddingDriver, ModelManager};
pub use config::VectorSearchConfig;
pub use error::{VectorError, VectorResult};
pub use models::{DriverConfig, Metadata, ScoreKind, SearchResult, Vector};
pub use record::{
    Record, RecordHooks, RecordObserver, RecordRegistry, RecordRepository, Vectorizable,
};
pub use service::{build_context, RetrievedRecord, VectorSearch, CHAT_TOP_K, NO_CONTEXT};
pub use stores::{StoreManager, VectorStoreDriver};
pub use sync::VectorSync;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
