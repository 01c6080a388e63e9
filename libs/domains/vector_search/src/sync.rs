//! Keeps a record's vector in step with the record itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument};

use crate::ai::ModelManager;
use crate::error::{VectorError, VectorResult};
use crate::models::{Metadata, Vector, MODEL_CLASS_KEY, MODEL_ID_KEY, TEXT_KEY};
use crate::record::{Record, RecordObserver};
use crate::stores::StoreManager;

/// Record observer that upserts on save and deletes on delete.
///
/// Subscribe it to the persistence layer's [`RecordHooks`](crate::record::RecordHooks).
pub struct VectorSync {
    models: Arc<ModelManager>,
    stores: Arc<StoreManager>,
    model: Option<String>,
    store: Option<String>,
}

impl VectorSync {
    pub fn new(models: Arc<ModelManager>, stores: Arc<StoreManager>) -> Self {
        Self {
            models,
            stores,
            model: None,
            store: None,
        }
    }

    /// Embed with `name` instead of the default embedding model
    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model = Some(name.into());
        self
    }

    /// Write to `name` instead of the default store
    pub fn with_store(mut self, name: impl Into<String>) -> Self {
        self.store = Some(name.into());
        self
    }

    /// The space-joined, non-empty values of the record's vector columns.
    pub fn vector_text(record: &dyn Record) -> VectorResult<String> {
        let vectorizable =
            record
                .as_vectorizable()
                .ok_or_else(|| VectorError::MissingCapability {
                    record: record.class_name().to_string(),
                    capability: "vector_columns",
                })?;

        Ok(vectorizable
            .vector_columns()
            .iter()
            .filter_map(|column| record.attribute(column))
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }

    pub fn vector_id(record: &dyn Record) -> String {
        format!("{}:{}", record.class_name(), record.key())
    }
}

#[async_trait]
impl RecordObserver for VectorSync {
    #[instrument(skip(self, record), fields(class = record.class_name(), key = %record.key()))]
    async fn saved(&self, record: &dyn Record) -> VectorResult<()> {
        let text = Self::vector_text(record)?;
        if text.is_empty() {
            // A previously stored vector for this record stays in place
            debug!("No vector text, skipping sync");
            return Ok(());
        }

        let values = self
            .models
            .embedding_driver(self.model.as_deref())?
            .embed(&text)
            .await?;

        let mut metadata = Metadata::new();
        metadata.insert(MODEL_CLASS_KEY.to_string(), json!(record.class_name()));
        metadata.insert(MODEL_ID_KEY.to_string(), json!(record.key()));
        metadata.insert(TEXT_KEY.to_string(), json!(text));

        let vector = Vector::new(Self::vector_id(record), values)?.with_metadata(metadata);
        let acknowledged = self
            .stores
            .store(self.store.as_deref())?
            .upsert(&[vector])
            .await?;

        debug!(acknowledged, "Vector synced");
        Ok(())
    }

    #[instrument(skip(self, record), fields(class = record.class_name(), key = %record.key()))]
    async fn deleted(&self, record: &dyn Record) -> VectorResult<()> {
        let acknowledged = self
            .stores
            .store(self.store.as_deref())?
            .delete(&[Self::vector_id(record)])
            .await?;

        debug!(acknowledged, "Vector removed");
        Ok(())
    }
}
