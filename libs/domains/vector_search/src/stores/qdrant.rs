//! Qdrant over gRPC via `qdrant-client`.
//!
//! Qdrant only accepts UUIDs or integers as point ids, so each vector id is
//! mapped to a deterministic UUIDv5 and the original id travels in the
//! payload under [`VECTOR_ID_KEY`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    self, point_id::PointIdOptions, DeletePointsBuilder, ListValue, NullValue, PointId,
    PointStruct, ScoredPoint, SearchPointsBuilder, Struct, UpdateStatus, UpsertPointsBuilder,
    Value as QdrantValue,
};
use qdrant_client::Qdrant;
use tracing::instrument;
use uuid::Uuid;

use super::driver::{ignore_filter, VectorStoreDriver};
use crate::error::{VectorError, VectorResult};
use crate::models::{DriverConfig, Metadata, ScoreKind, SearchResult, Vector};

const PROVIDER: &str = "qdrant";

/// Payload key carrying the caller's vector id
pub const VECTOR_ID_KEY: &str = "_vector_id";

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "vector-search".to_string(),
            timeout_secs: 30,
        }
    }
}

impl QdrantConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn from_driver_config(config: &DriverConfig) -> VectorResult<Self> {
        let defaults = Self::default();
        let timeout_secs = match config.get("timeout_secs") {
            Some(secs) => secs.parse().map_err(|e| {
                VectorError::Config(format!("invalid qdrant timeout_secs '{}': {}", secs, e))
            })?,
            None => defaults.timeout_secs,
        };

        Ok(Self {
            url: config.get_or("url", &defaults.url).to_string(),
            api_key: config
                .get("api_key")
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            collection: config.get_or("collection", &defaults.collection).to_string(),
            timeout_secs,
        })
    }
}

pub struct QdrantDriver {
    client: Qdrant,
    collection: String,
}

impl QdrantDriver {
    /// Builds the client; no connection is made until the first call.
    pub fn new(config: QdrantConfig) -> VectorResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| VectorError::Config(format!("Failed to build qdrant client: {}", e)))?;

        Ok(Self::from_client(client, config.collection))
    }

    pub fn from_client(client: Qdrant, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    pub fn from_config(config: &DriverConfig) -> VectorResult<Self> {
        Self::new(QdrantConfig::from_driver_config(config)?)
    }
}

/// Deterministic point id for a vector id
pub fn point_id(vector_id: &str) -> PointId {
    PointId::from(Uuid::new_v5(&Uuid::NAMESPACE_OID, vector_id.as_bytes()).to_string())
}

fn point_struct(vector: &Vector) -> PointStruct {
    let mut payload = metadata_to_payload(vector.metadata());
    payload.insert(
        VECTOR_ID_KEY.to_string(),
        QdrantValue::from(vector.id().to_string()),
    );

    PointStruct::new(point_id(vector.id()), vector.values().to_vec(), payload)
}

fn to_search_result(point: ScoredPoint) -> SearchResult {
    let mut metadata = payload_to_metadata(point.payload);
    let id = match metadata.remove(VECTOR_ID_KEY) {
        Some(serde_json::Value::String(id)) => id,
        _ => point.id.as_ref().map(point_id_to_string).unwrap_or_default(),
    };

    SearchResult::new(id, metadata, point.score, ScoreKind::Similarity)
}

fn point_id_to_string(point_id: &PointId) -> String {
    match &point_id.point_id_options {
        Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

fn metadata_to_payload(metadata: &Metadata) -> HashMap<String, QdrantValue> {
    metadata
        .iter()
        .map(|(key, value)| (key.clone(), json_to_qdrant_value(value.clone())))
        .collect()
}

fn payload_to_metadata(payload: HashMap<String, QdrantValue>) -> Metadata {
    payload
        .into_iter()
        .map(|(key, value)| (key, qdrant_value_to_json(value)))
        .collect()
}

fn json_to_qdrant_value(val: serde_json::Value) -> QdrantValue {
    use qdrant::value::Kind;

    let kind = match val {
        serde_json::Value::Null => Kind::NullValue(NullValue::NullValue.into()),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant_value).collect(),
        }),
        serde_json::Value::Object(fields) => Kind::StructValue(Struct {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key, json_to_qdrant_value(value)))
                .collect(),
        }),
    };

    QdrantValue { kind: Some(kind) }
}

fn qdrant_value_to_json(val: QdrantValue) -> serde_json::Value {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => serde_json::Value::Array(
            list.values.into_iter().map(qdrant_value_to_json).collect(),
        ),
        Some(Kind::StructValue(object)) => serde_json::Value::Object(
            object
                .fields
                .into_iter()
                .map(|(key, value)| (key, qdrant_value_to_json(value)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
    }
}

fn completed(result: Option<qdrant::UpdateResult>) -> bool {
    result.is_some_and(|r| r.status() == UpdateStatus::Completed)
}

#[async_trait]
impl VectorStoreDriver for QdrantDriver {
    #[instrument(
        skip(self, vectors),
        fields(provider = PROVIDER, collection = %self.collection, count = vectors.len())
    )]
    async fn upsert(&self, vectors: &[Vector]) -> VectorResult<bool> {
        let points: Vec<PointStruct> = vectors.iter().map(point_struct).collect();

        let response = self
            .client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| VectorError::provider(PROVIDER, "upsert", e.to_string()))?;

        Ok(completed(response.result))
    }

    #[instrument(
        skip(self, vector, filter),
        fields(provider = PROVIDER, collection = %self.collection)
    )]
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Metadata,
    ) -> VectorResult<Vec<SearchResult>> {
        ignore_filter(PROVIDER, filter);

        let builder = SearchPointsBuilder::new(&self.collection, vector.to_vec(), top_k as u64)
            .with_payload(true);

        let response = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| VectorError::provider(PROVIDER, "query", e.to_string()))?;

        Ok(response.result.into_iter().map(to_search_result).collect())
    }

    #[instrument(
        skip(self, ids),
        fields(provider = PROVIDER, collection = %self.collection, count = ids.len())
    )]
    async fn delete(&self, ids: &[String]) -> VectorResult<bool> {
        let point_ids: Vec<PointId> = ids.iter().map(|id| point_id(id)).collect();

        let response = self
            .client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(point_ids)
                    .wait(true),
            )
            .await
            .map_err(|e| VectorError::provider(PROVIDER, "delete", e.to_string()))?;

        Ok(completed(response.result))
    }
}
