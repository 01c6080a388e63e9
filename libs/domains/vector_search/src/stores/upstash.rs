use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::driver::{ignore_filter, VectorStoreDriver, STORE_TIMEOUT};
use crate::error::VectorResult;
use crate::models::{DriverConfig, Metadata, ScoreKind, SearchResult, Vector};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

const PROVIDER: &str = "upstash";

/// Upstash Vector REST connection settings
#[derive(Debug, Clone)]
pub struct UpstashConfig {
    pub url: String,
    pub token: String,
}

impl UpstashConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn from_driver_config(config: &DriverConfig) -> VectorResult<Self> {
        Ok(Self::new(config.require("url")?, config.require("token")?))
    }
}

pub struct UpstashDriver {
    config: UpstashConfig,
    transport: Arc<dyn HttpTransport>,
}

impl UpstashDriver {
    pub fn new(config: UpstashConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn from_config(config: &DriverConfig) -> VectorResult<Self> {
        Ok(Self::new(
            UpstashConfig::from_driver_config(config)?,
            Arc::new(ReqwestTransport::new(STORE_TIMEOUT)?),
        ))
    }

    fn request(&self, path: &str, body: serde_json::Value) -> HttpRequest {
        HttpRequest::post(format!("{}/{}", self.config.url, path), body).bearer(&self.config.token)
    }
}

/// Upstash names the values field `vector`
#[derive(Debug, Serialize)]
struct UpstashVector<'a> {
    id: &'a str,
    vector: &'a [f32],
    metadata: &'a Metadata,
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
    result: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[async_trait]
impl VectorStoreDriver for UpstashDriver {
    #[instrument(skip(self, vectors), fields(provider = PROVIDER, count = vectors.len()))]
    async fn upsert(&self, vectors: &[Vector]) -> VectorResult<bool> {
        let payload: Vec<UpstashVector<'_>> = vectors
            .iter()
            .map(|v| UpstashVector {
                id: v.id(),
                vector: v.values(),
                metadata: v.metadata(),
            })
            .collect();

        self.transport
            .post(self.request("upsert", serde_json::to_value(payload)?))
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
            .result
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
        // Upstash takes the bare id array as the body
        self.transport
            .post(self.request("delete", serde_json::to_value(ids)?))
            .await?
            .acknowledged(PROVIDER, "delete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::testing::{sample_vector, RecordingTransport};
    use crate::transport::HttpResponse;
    use serde_json::json;

    fn driver(transport: Arc<RecordingTransport>) -> UpstashDriver {
        UpstashDriver::new(
            UpstashConfig::new("https://db.upstash.io/", "tok"),
            transport,
        )
    }

    #[tokio::test]
    async fn test_upsert_then_query_round_trip() {
        let transport = Arc::new(RecordingTransport::new());
        let store = driver(Arc::clone(&transport));
        let vector = sample_vector("Post:1");

        transport.push(HttpResponse::new(200, r#"{"result":"Success"}"#)).await;
        assert!(store.upsert(std::slice::from_ref(&vector)).await.unwrap());

        let upsert = transport.request(0).await;
        assert_eq!(upsert.url, "https://db.upstash.io/upsert");
        assert!(upsert.headers.contains(&("Authorization".to_string(), "Bearer tok".to_string())));
        let stored = &upsert.body[0];
        assert_eq!(stored["vector"], json!(vector.values()));
        assert!(stored.get("values").is_none());

        let response = json!({"result": [{
            "id": stored["id"],
            "score": 0.97,
            "metadata": stored["metadata"],
        }]});
        transport.push(HttpResponse::new(200, response.to_string())).await;

        let hits = store.query(vector.values(), 3, &Metadata::new()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "Post:1");
        assert_eq!(&hits[0].metadata, vector.metadata());
        assert_eq!(hits[0].score_kind, ScoreKind::Similarity);

        let query = transport.request(1).await;
        assert_eq!(query.url, "https://db.upstash.io/query");
        assert_eq!(query.body["topK"], 3);
        assert_eq!(query.body["includeMetadata"], true);
    }

    #[tokio::test]
    async fn test_query_without_metadata() {
        let transport = Arc::new(RecordingTransport::new());
        transport
            .push(HttpResponse::new(200, r#"{"result":[{"id":"a","score":0.5}]}"#))
            .await;

        let hits = driver(transport).query(&[0.1], 1, &Metadata::new()).await.unwrap();
        assert!(hits[0].metadata.is_empty());
    }

    #[tokio::test]
    async fn test_delete_sends_bare_array() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(HttpResponse::new(200, r#"{"result":{"deleted":1}}"#)).await;

        let deleted = driver(Arc::clone(&transport))
            .delete(&["Post:1".to_string()])
            .await
            .unwrap();

        assert!(deleted);
        let request = transport.request(0).await;
        assert_eq!(request.url, "https://db.upstash.io/delete");
        assert_eq!(request.body, json!(["Post:1"]));
    }

    #[tokio::test]
    async fn test_rejected_upsert_is_an_error() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(HttpResponse::new(400, "dimension mismatch")).await;

        let err = driver(transport).upsert(&[sample_vector("x:1")]).await.unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }
}
