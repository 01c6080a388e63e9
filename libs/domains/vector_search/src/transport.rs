//! HTTP capability shared by every REST-backed driver.
//!
//! Drivers describe a request as data and hand it to an [`HttpTransport`];
//! the production implementation is [`ReqwestTransport`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{VectorError, VectorResult};

/// A JSON POST request
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }
}

/// Header values and the query string are credentials for most providers
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, _)| (name.as_str(), "[redacted]"))
            .collect();

        f.debug_struct("HttpRequest")
            .field("url", &redact(&self.url))
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Raw response: status code and body text
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `Err` for 4xx/5xx, otherwise whether the provider answered exactly 200.
    pub fn acknowledged(
        &self,
        provider: &'static str,
        operation: &'static str,
    ) -> VectorResult<bool> {
        if self.status >= 400 {
            return Err(self.status_error(provider, operation));
        }
        Ok(self.status == 200)
    }

    /// Decode a successful response body into `T`.
    pub fn json<T: DeserializeOwned>(
        &self,
        provider: &'static str,
        operation: &'static str,
    ) -> VectorResult<T> {
        if !self.is_success() {
            return Err(self.status_error(provider, operation));
        }

        serde_json::from_str(&self.body).map_err(|e| {
            VectorError::provider(provider, operation, format!("unexpected response: {}", e))
        })
    }

    fn status_error(&self, provider: &'static str, operation: &'static str) -> VectorError {
        VectorError::provider(
            provider,
            operation,
            format!("API error ({}): {}", self.status, self.body),
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, request: HttpRequest) -> VectorResult<HttpResponse>;
}

/// `reqwest`-backed transport with a fixed per-call timeout
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VectorError::Http(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> VectorResult<HttpResponse> {
        let url = redact(&request.url);
        debug!(%url, "POST");

        let mut builder = self
            .client
            .post(&request.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let failed = |e: reqwest::Error| {
            VectorError::Http(format!("POST {} failed: {}", url, e.without_url()))
        };

        let response = builder.json(&request.body).send().await.map_err(failed)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(failed)?;

        Ok(HttpResponse { status, body })
    }
}

/// Strip the query string so API keys passed as `?key=` never hit the logs
fn redact(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}
