use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::VectorResult;
use crate::models::{Metadata, SearchResult, Vector};

pub const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Capability set every vector database driver provides.
///
/// `upsert` and `delete` report whether the store acknowledged the batch;
/// a rejected request (4xx/5xx) is an error instead. Partial batch failures
/// cannot be told apart from total ones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStoreDriver: Send + Sync {
    /// Insert or replace vectors by id
    async fn upsert(&self, vectors: &[Vector]) -> VectorResult<bool>;

    /// Nearest neighbours of `vector`, best first.
    ///
    /// Metadata filtering is not supported by the built-in drivers yet; a
    /// non-empty `filter` is ignored with a warning.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Metadata,
    ) -> VectorResult<Vec<SearchResult>>;

    /// Remove vectors by id
    async fn delete(&self, ids: &[String]) -> VectorResult<bool>;
}

pub(crate) fn ignore_filter(provider: &'static str, filter: &Metadata) {
    if !filter.is_empty() {
        warn!(
            provider,
            keys = ?filter.keys().collect::<Vec<_>>(),
            "Metadata filters are not supported by this store, ignoring"
        );
    }
}
