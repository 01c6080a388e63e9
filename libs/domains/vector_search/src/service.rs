use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::ai::ModelManager;
use crate::config::VectorSearchConfig;
use crate::error::VectorResult;
use crate::models::{Metadata, ScoreKind};
use crate::record::{Record, RecordRegistry};
use crate::stores::StoreManager;

/// Context handed to the chat model when retrieval finds nothing usable
pub const NO_CONTEXT: &str = "No relevant context found.";

/// Number of records retrieved as context for [`VectorSearch::chat`]
pub const CHAT_TOP_K: usize = 3;

/// A hydrated record with the hit it came from.
#[derive(Clone)]
pub struct RetrievedRecord {
    pub record: Arc<dyn Record>,
    pub score: f32,
    pub score_kind: ScoreKind,
    /// Zero-based position of the hit in the store's response
    pub rank: usize,
}

impl fmt::Debug for RetrievedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievedRecord")
            .field("class", &self.record.class_name())
            .field("key", &self.record.key())
            .field("score", &self.score)
            .field("score_kind", &self.score_kind)
            .field("rank", &self.rank)
            .finish()
    }
}

/// Retrieval-augmented search and chat over the default model and store.
///
/// Read path: embed the query, query the store, hydrate hits back into
/// records through the [`RecordRegistry`], then (for `chat`) format the
/// records as context for the chat model.
pub struct VectorSearch {
    models: Arc<ModelManager>,
    stores: Arc<StoreManager>,
    records: RecordRegistry,
}

impl VectorSearch {
    pub fn new(
        models: Arc<ModelManager>,
        stores: Arc<StoreManager>,
        records: RecordRegistry,
    ) -> Self {
        Self {
            models,
            stores,
            records,
        }
    }

    pub fn from_config(config: &VectorSearchConfig, records: RecordRegistry) -> Self {
        Self::new(
            Arc::new(ModelManager::from_config(config)),
            Arc::new(StoreManager::from_config(config)),
            records,
        )
    }

    pub fn store(&self) -> &Arc<StoreManager> {
        &self.stores
    }

    pub fn model(&self) -> &Arc<ModelManager> {
        &self.models
    }

    /// Records most similar to `query`, best first.
    ///
    /// At most `top_k` hits are considered. Hits without origin metadata or
    /// whose class has no registered repository are dropped, and a record
    /// matched more than once keeps its best rank.
    #[instrument(skip(self, query))]
    pub async fn similar(&self, query: &str, top_k: usize) -> VectorResult<Vec<RetrievedRecord>> {
        let embedding = self.models.embedding_driver(None)?.embed(query).await?;
        let hits = self
            .stores
            .store(None)?
            .query(&embedding, top_k, &Metadata::new())
            .await?;
        debug!(hits = hits.len(), "Store query complete");

        // Hits arrive best first, so the first occurrence of an origin is its best rank
        let mut ranks: HashMap<(String, String), (usize, f32, ScoreKind)> = HashMap::new();
        let mut classes: Vec<(String, Vec<String>)> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for (rank, hit) in hits.iter().take(top_k).enumerate() {
            let Some((class, id)) = hit.origin() else {
                debug!(id = %hit.id, "Hit has no origin metadata, skipping");
                continue;
            };
            let origin = (class.to_string(), id);
            if !seen.insert(origin.clone()) {
                continue;
            }

            ranks.insert(origin.clone(), (rank, hit.score, hit.score_kind));
            match classes.iter_mut().find(|(name, _)| *name == origin.0) {
                Some((_, ids)) => ids.push(origin.1),
                None => classes.push((origin.0, vec![origin.1])),
            }
        }

        let mut retrieved = Vec::with_capacity(ranks.len());
        for (class, ids) in classes {
            let Some(repository) = self.records.get(&class) else {
                warn!(class = %class, "No repository registered for record class, skipping hits");
                continue;
            };

            for record in repository.find_many(&ids).await? {
                let origin = (class.clone(), record.key());
                if let Some(&(rank, score, score_kind)) = ranks.get(&origin) {
                    retrieved.push(RetrievedRecord {
                        record,
                        score,
                        score_kind,
                        rank,
                    });
                }
            }
        }

        retrieved.sort_by_key(|r| r.rank);
        retrieved.dedup_by_key(|r| r.rank);
        Ok(retrieved)
    }

    /// Answer `query` grounded in the [`CHAT_TOP_K`] most similar records.
    #[instrument(skip(self, query))]
    pub async fn chat(&self, query: &str) -> VectorResult<String> {
        let records = self.similar(query, CHAT_TOP_K).await?;

        let mut context = build_context(&records);
        if context.is_empty() {
            context = NO_CONTEXT.to_string();
        }

        self.models.chat_driver(None)?.chat(query, &context).await
    }
}

/// Render vectorizable records as chat context, in the given order.
pub fn build_context(records: &[RetrievedRecord]) -> String {
    let mut context = String::new();

    for retrieved in records {
        let record = retrieved.record.as_ref();
        let Some(vectorizable) = record.as_vectorizable() else {
            continue;
        };

        let lines: Vec<String> = vectorizable
            .vector_columns()
            .into_iter()
            .map(|column| {
                let value = record.attribute(&column).unwrap_or_default();
                format!("{}: {}", column, value)
            })
            .collect();

        context.push_str(&format!(
            "--- Document (from {}:{}) ---\n{}\n\n",
            record.table(),
            record.key(),
            lines.join("\n")
        ));
    }

    context.trim().to_string()
}
