use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::chroma::ChromaDriver;
use super::driver::VectorStoreDriver;
use super::pinecone::PineconeDriver;
use super::qdrant::QdrantDriver;
use super::upstash::UpstashDriver;
use crate::config::VectorSearchConfig;
use crate::error::VectorResult;
use crate::manager::DriverManager;
use crate::models::{DriverConfig, Metadata, SearchResult, Vector};

/// Resolves logical store names ("upstash", "chroma", ...) to drivers.
pub struct StoreManager {
    stores: DriverManager<dyn VectorStoreDriver>,
}

impl StoreManager {
    pub fn new(default_store: impl Into<String>, configs: HashMap<String, DriverConfig>) -> Self {
        let stores = DriverManager::new("Vector store", default_store, configs)
            .with_builtin("upstash", |config| {
                Ok(Arc::new(UpstashDriver::from_config(config)?) as Arc<dyn VectorStoreDriver>)
            })
            .with_builtin("chroma", |config| {
                Ok(Arc::new(ChromaDriver::from_config(config)?) as Arc<dyn VectorStoreDriver>)
            })
            .with_builtin("pinecone", |config| {
                Ok(Arc::new(PineconeDriver::from_config(config)?) as Arc<dyn VectorStoreDriver>)
            })
            .with_builtin("qdrant", |config| {
                Ok(Arc::new(QdrantDriver::from_config(config)?) as Arc<dyn VectorStoreDriver>)
            });

        Self { stores }
    }

    pub fn from_config(config: &VectorSearchConfig) -> Self {
        Self::new(config.default_store.clone(), config.stores.clone())
    }

    pub fn store(&self, name: Option<&str>) -> VectorResult<Arc<dyn VectorStoreDriver>> {
        self.stores.resolve(name)
    }

    /// Register a custom store factory; see [`DriverManager::extend`]
    pub fn extend<F, D>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        F: Fn(&DriverConfig) -> VectorResult<D> + Send + Sync + 'static,
        D: VectorStoreDriver + 'static,
    {
        self.stores.extend(name, move |config| {
            Ok(Arc::new(factory(config)?) as Arc<dyn VectorStoreDriver>)
        });
        self
    }

    pub fn forget(&self, name: &str) -> bool {
        self.stores.forget(name)
    }

    pub fn config(&self, name: &str) -> VectorResult<&DriverConfig> {
        self.stores.config(name)
    }

    pub fn default_store(&self) -> &str {
        self.stores.default_name()
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.stores.is_resolved(name)
    }
}

/// Every call goes to the default store
#[async_trait]
impl VectorStoreDriver for StoreManager {
    async fn upsert(&self, vectors: &[Vector]) -> VectorResult<bool> {
        self.store(None)?.upsert(vectors).await
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Metadata,
    ) -> VectorResult<Vec<SearchResult>> {
        self.store(None)?.query(vector, top_k, filter).await
    }

    async fn delete(&self, ids: &[String]) -> VectorResult<bool> {
        self.store(None)?.delete(ids).await
    }
}
