//! Chroma HTTP API (v1 collections endpoints).
//!
//! Chroma works in column arrays rather than per-vector objects and reports
//! distances, so scores from this driver are lower-is-better.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::driver::{ignore_filter, VectorStoreDriver, STORE_TIMEOUT};
use crate::error::{VectorError, VectorResult};
use crate::models::{DriverConfig, Metadata, ScoreKind, SearchResult, Vector};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

const PROVIDER: &str = "chroma";

#[derive(Debug, Clone)]
pub struct ChromaConfig {
    pub host: String,
    pub port: u16,
    pub collection: String,
    pub token: Option<String>,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            collection: "laravel-rag".to_string(),
            token: None,
        }
    }
}

impl ChromaConfig {
    pub fn from_driver_config(config: &DriverConfig) -> VectorResult<Self> {
        let defaults = Self::default();
        let port = match config.get("port") {
            Some(port) => port.parse().map_err(|e| {
                VectorError::Config(format!("invalid chroma port '{}': {}", port, e))
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: config.get_or("host", &defaults.host).to_string(),
            port,
            collection: config.get_or("collection", &defaults.collection).to_string(),
            token: config
                .get("token")
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        })
    }

    pub fn collection_url(&self) -> String {
        format!(
            "http://{}:{}/api/v1/collections/{}",
            self.host, self.port, self.collection
        )
    }
}

pub struct ChromaDriver {
    config: ChromaConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ChromaDriver {
    pub fn new(config: ChromaConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn from_config(config: &DriverConfig) -> VectorResult<Self> {
        Ok(Self::new(
            ChromaConfig::from_driver_config(config)?,
            Arc::new(ReqwestTransport::new(STORE_TIMEOUT)?),
        ))
    }

    fn request(&self, operation: &str, body: serde_json::Value) -> HttpRequest {
        let request = HttpRequest::post(
            format!("{}/{}", self.config.collection_url(), operation),
            body,
        );
        match &self.config.token {
            Some(token) => request.bearer(token),
            None => request,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    metadatas: Vec<&'a Metadata>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    include: [&'static str; 2],
}

/// One batch per query embedding; only the first is ever sent
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<Metadata>>>,
    #[serde(default)]
    distances: Vec<Vec<f32>>,
}

impl QueryResponse {
    fn into_results(self) -> VectorResult<Vec<SearchResult>> {
        let Some(ids) = self.ids.into_iter().next() else {
            return Ok(Vec::new());
        };
        let mut metadatas = self.metadatas.into_iter().next().unwrap_or_default().into_iter();
        let distances = self.distances.into_iter().next().unwrap_or_default();

        if distances.len() < ids.len() {
            return Err(VectorError::provider(
                PROVIDER,
                "query",
                format!("{} ids but {} distances", ids.len(), distances.len()),
            ));
        }

        Ok(ids
            .into_iter()
            .zip(distances)
            .map(|(id, distance)| {
                let metadata = metadatas.next().flatten().unwrap_or_default();
                SearchResult::new(id, metadata, distance, ScoreKind::Distance)
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

#[async_trait]
impl VectorStoreDriver for ChromaDriver {
    #[instrument(
        skip(self, vectors),
        fields(provider = PROVIDER, collection = %self.config.collection, count = vectors.len())
    )]
    async fn upsert(&self, vectors: &[Vector]) -> VectorResult<bool> {
        let payload = UpsertRequest {
            ids: vectors.iter().map(Vector::id).collect(),
            embeddings: vectors.iter().map(Vector::values).collect(),
            metadatas: vectors.iter().map(Vector::metadata).collect(),
        };

        self.transport
            .post(self.request("upsert", serde_json::to_value(payload)?))
            .await?
            .acknowledged(PROVIDER, "upsert")
    }

    #[instrument(
        skip(self, vector, filter),
        fields(provider = PROVIDER, collection = %self.config.collection)
    )]
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Metadata,
    ) -> VectorResult<Vec<SearchResult>> {
        ignore_filter(PROVIDER, filter);

        let body = serde_json::to_value(QueryRequest {
            query_embeddings: [vector],
            n_results: top_k,
            include: ["metadatas", "distances"],
        })?;

        self.transport
            .post(self.request("query", body))
            .await?
            .json::<QueryResponse>(PROVIDER, "query")?
            .into_results()
    }

    #[instrument(
        skip(self, ids),
        fields(provider = PROVIDER, collection = %self.config.collection, count = ids.len())
    )]
    async fn delete(&self, ids: &[String]) -> VectorResult<bool> {
        let body = serde_json::to_value(DeleteRequest { ids })?;
        self.transport
            .post(self.request("delete", body))
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

    fn driver(transport: Arc<RecordingTransport>) -> ChromaDriver {
        ChromaDriver::new(ChromaConfig::default(), transport)
    }

    #[tokio::test]
    async fn test_upsert_then_query_round_trip() {
        let transport = Arc::new(RecordingTransport::new());
        let store = driver(Arc::clone(&transport));
        let vector = sample_vector("Post:1");

        transport.push(HttpResponse::new(200, "true")).await;
        assert!(store.upsert(std::slice::from_ref(&vector)).await.unwrap());

        let upsert = transport.request(0).await;
        assert_eq!(
            upsert.url,
            "http://127.0.0.1:8000/api/v1/collections/laravel-rag/upsert"
        );
        assert!(upsert.headers.is_empty());
        assert_eq!(upsert.body["embeddings"][0], json!(vector.values()));

        let response = json!({
            "ids": [upsert.body["ids"].clone()],
            "metadatas": [upsert.body["metadatas"].clone()],
            "distances": [[0.12]],
            "documents": null,
        });
        transport.push(HttpResponse::new(200, response.to_string())).await;

        let hits = store.query(vector.values(), 5, &Metadata::new()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "Post:1");
        assert_eq!(&hits[0].metadata, vector.metadata());
        assert_eq!(hits[0].score_kind, ScoreKind::Distance);

        let query = transport.request(1).await;
        assert_eq!(query.body["n_results"], 5);
        assert_eq!(query.body["include"], json!(["metadatas", "distances"]));
        assert_eq!(query.body["query_embeddings"][0], json!(vector.values()));
    }

    #[tokio::test]
    async fn test_empty_first_batch_is_no_results() {
        let transport = Arc::new(RecordingTransport::new());
        transport
            .push(HttpResponse::new(200, r#"{"ids":[[]],"metadatas":[[]],"distances":[[]]}"#))
            .await;
        transport.push(HttpResponse::new(200, "{}")).await;

        let store = driver(transport);
        assert!(store.query(&[0.1], 3, &Metadata::new()).await.unwrap().is_empty());
        assert!(store.query(&[0.1], 3, &Metadata::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_distances_is_provider_error() {
        let transport = Arc::new(RecordingTransport::new());
        transport
            .push(HttpResponse::new(200, r#"{"ids":[["a","b"]],"distances":[[0.1]]}"#))
            .await;

        let err = driver(transport)
            .query(&[0.1], 2, &Metadata::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorError::Provider { provider: "chroma", operation: "query", ref message }
                if message.contains("2 ids but 1 distances")
        ));
    }

    #[tokio::test]
    async fn test_null_metadata_becomes_empty() {
        let transport = Arc::new(RecordingTransport::new());
        transport
            .push(HttpResponse::new(
                200,
                r#"{"ids":[["a"]],"metadatas":[[null]],"distances":[[0.4]]}"#,
            ))
            .await;

        let hits = driver(transport).query(&[0.1], 1, &Metadata::new()).await.unwrap();
        assert!(hits[0].metadata.is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_token() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(HttpResponse::new(200, "[]")).await;

        let config = ChromaConfig {
            token: Some("chroma-token".to_string()),
            collection: "docs".to_string(),
            ..ChromaConfig::default()
        };
        let store = ChromaDriver::new(config, Arc::clone(&transport) as Arc<dyn HttpTransport>);
        assert!(store.delete(&["Post:1".to_string()]).await.unwrap());

        let request = transport.request(0).await;
        assert!(request.url.ends_with("/collections/docs/delete"));
        assert_eq!(request.body, json!({"ids": ["Post:1"]}));
        assert_eq!(request.headers[0].1, "Bearer chroma-token");
    }

    #[test]
    fn test_config_from_block() {
        let config = ChromaConfig::from_driver_config(
            &DriverConfig::new().with("host", "chroma").with("port", "9000").with("token", ""),
        )
        .unwrap();
        assert_eq!(config.collection_url(), "http://chroma:9000/api/v1/collections/laravel-rag");
        assert!(config.token.is_none());

        let config = DriverConfig::new().with("port", "http");
        let err = ChromaConfig::from_driver_config(&config).unwrap_err();
        assert!(matches!(err, VectorError::Config(_)));
    }
}
