use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::driver::{ignore_filter, VectorStoreDriver, STORE_TIMEOUT};
use crate::error::VectorResult;
use crate::models::{DriverConfig, Metadata, ScoreKind, SearchResult, Vector};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

const PROVIDER: &str = "pinecone";

/// Pinecone index data-plane settings; `host` is the full index URL.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub host: String,
    pub api_key: String,
}

impl PineconeConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_driver_config(config: &DriverConfig) -> VectorResult<Self> {
        Ok(Self::new(config.require("host")?, config.require("api_key")?))
    }
}

pub struct PineconeDriver {
    config: PineconeConfig,
    transport: Arc<dyn HttpTransport>,
}

impl PineconeDriver {
    pub fn new(config: PineconeConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn from_config(config: &DriverConfig) -> VectorResult<Self> {
        Ok(Self::new(
            PineconeConfig::from_driver_config(config)?,
            Arc::new(ReqwestTransport::new(STORE_TIMEOUT)?),
        ))
    }

    fn request(&self, path: &str, body: serde_json::Value) -> HttpRequest {
        HttpRequest::post(format!("{}/{}", self.config.host, path), body)
            .header("Api-Key", &self.config.api_key)
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [Vector],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

#[async_trait]
impl VectorStoreDriver for PineconeDriver {
    #[instrument(skip(self, vectors), fields(provider = PROVIDER, count = vectors.len()))]
    async fn upsert(&self, vectors: &[Vector]) -> VectorResult<bool> {
        // Vector serializes as {id, values, metadata}, Pinecone's own shape
        let body = serde_json::to_value(UpsertRequest { vectors })?;
        self.transport
            .post(self.request("vectors/upsert", body))
            .await?
            .acknowledged(PROVIDER, "upsert")
    }

    #[instrument(skip(self, vector, filter), fields(provider = PROVIDER))]
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Metadata,
    ) -> VectorResult<Vec<SearchResult>> {
        ignore_filter(PROVIDER, filter);

        let body = serde_json::to_value(QueryRequest {
            vector,
            top_k,
            include_metadata: true,
        })?;

        let response: QueryResponse = self
            .transport
            .post(self.request("query", body))
            .await?
            .json(PROVIDER, "query")?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| {
                SearchResult::new(
                    m.id,
                    m.metadata.unwrap_or_default(),
                    m.score,
                    ScoreKind::Similarity,
                )
            })
            .collect())
    }

    #[instrument(skip(self, ids), fields(provider = PROVIDER, count = ids.len()))]
    async fn delete(&self, ids: &[String]) -> VectorResult<bool> {
        let body = serde_json::to_value(DeleteRequest { ids })?;
        self.transport
            .post(self.request("vectors/delete", body))
            .await?
            .acknowledged(PROVIDER, "delete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorError;
    use crate::stores::testing::{sample_vector, RecordingTransport};
    use crate::transport::HttpResponse;
    use serde_json::json;

    const HOST: &str = "https://docs-abc123.svc.pinecone.io";

    fn driver(transport: Arc<RecordingTransport>) -> PineconeDriver {
        PineconeDriver::new(PineconeConfig::new(format!("{}/", HOST), "pc-key"), transport)
    }

    #[tokio::test]
    async fn test_upsert_then_query_round_trip() {
        let transport = Arc::new(RecordingTransport::new());
        let store = driver(Arc::clone(&transport));
        let vector = sample_vector("Post:1");

        transport.push(HttpResponse::new(200, r#"{"upsertedCount":1}"#)).await;
        assert!(store.upsert(std::slice::from_ref(&vector)).await.unwrap());

        let upsert = transport.request(0).await;
        assert_eq!(upsert.url, format!("{}/vectors/upsert", HOST));
        assert_eq!(upsert.headers, vec![("Api-Key".to_string(), "pc-key".to_string())]);
        let stored = &upsert.body["vectors"][0];
        assert_eq!(stored["values"], json!(vector.values()));

        let response = json!({
            "matches": [{"id": stored["id"], "score": 0.88, "metadata": stored["metadata"]}],
            "namespace": "",
        });
        transport.push(HttpResponse::new(200, response.to_string())).await;

        let hits = store.query(vector.values(), 2, &Metadata::new()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "Post:1");
        assert_eq!(&hits[0].metadata, vector.metadata());
        assert_eq!(hits[0].score_kind, ScoreKind::Similarity);

        let query = transport.request(1).await;
        assert_eq!(query.url, format!("{}/query", HOST));
        assert_eq!(query.body["topK"], 2);
    }

    #[tokio::test]
    async fn test_delete_body() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(HttpResponse::new(200, "{}")).await;

        assert!(driver(Arc::clone(&transport))
            .delete(&["a".to_string(), "b".to_string()])
            .await
            .unwrap());

        let request = transport.request(0).await;
        assert_eq!(request.url, format!("{}/vectors/delete", HOST));
        assert_eq!(request.body, json!({"ids": ["a", "b"]}));
    }

    #[tokio::test]
    async fn test_missing_matches_is_provider_error() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(HttpResponse::new(200, r#"{"results":[]}"#)).await;

        let err = driver(transport).query(&[0.1], 1, &Metadata::new()).await.unwrap_err();
        assert!(matches!(err, VectorError::Provider { provider: "pinecone", .. }));
    }

    #[test]
    fn test_config_requires_host_and_key() {
        let config = DriverConfig::new().with("host", HOST);
        let err = PineconeConfig::from_driver_config(&config).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }
}
