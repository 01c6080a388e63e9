//! Scripted transport for store driver tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use crate::error::{VectorError, VectorResult};
use crate::models::{Metadata, Vector, MODEL_CLASS_KEY, MODEL_ID_KEY, TEXT_KEY};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Replays queued responses in order and keeps every request it saw
#[derive(Default)]
pub(crate) struct RecordingTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, response: HttpResponse) {
        self.responses.lock().await.push_back(response);
    }

    pub async fn request(&self, index: usize) -> HttpRequest {
        self.requests.lock().await[index].clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn post(&self, request: HttpRequest) -> VectorResult<HttpResponse> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| VectorError::Http("no scripted response".to_string()))
    }
}

pub(crate) fn sample_vector(id: &str) -> Vector {
    let mut metadata = Metadata::new();
    metadata.insert(MODEL_CLASS_KEY.to_string(), json!("Post"));
    metadata.insert(MODEL_ID_KEY.to_string(), json!("1"));
    metadata.insert(TEXT_KEY.to_string(), json!("hello world"));

    Vector::new(id, vec![0.25, -0.5, 1.0])
        .expect("non-empty id")
        .with_metadata(metadata)
}
