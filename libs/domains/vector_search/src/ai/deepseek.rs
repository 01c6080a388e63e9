//! DeepSeek speaks the OpenAI wire protocol; only the endpoint and the
//! default models differ.

use std::sync::Arc;

use super::openai::{OpenAiConfig, OpenAiDriver, MODEL_TIMEOUT};
use crate::error::VectorResult;
use crate::models::DriverConfig;
use crate::transport::{HttpTransport, ReqwestTransport};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

pub struct DeepSeekDriver;

impl DeepSeekDriver {
    pub fn defaults() -> OpenAiConfig {
        OpenAiConfig::new("")
            .with_base_url(DEEPSEEK_BASE_URL)
            .with_models("deepseek-embedder-v1", "deepseek-chat")
    }

    pub fn new(config: OpenAiConfig, transport: Arc<dyn HttpTransport>) -> OpenAiDriver {
        OpenAiDriver::named("deepseek", config, transport)
    }

    pub fn from_config(config: &DriverConfig) -> VectorResult<OpenAiDriver> {
        let config = OpenAiConfig::from_driver_config(config, Self::defaults())?;
        Ok(Self::new(config, Arc::new(ReqwestTransport::new(MODEL_TIMEOUT)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::driver::EmbeddingDriver;
    use crate::error::VectorError;
    use crate::transport::{HttpResponse, MockHttpTransport};

    #[tokio::test]
    async fn test_uses_deepseek_endpoint_and_models() {
        let config = OpenAiConfig::from_driver_config(
            &DriverConfig::new().with("api_key", "ds"),
            DeepSeekDriver::defaults(),
        )
        .unwrap();

        let mut transport = MockHttpTransport::new();
        transport
            .expect_post()
            .withf(|request| {
                request.url == "https://api.deepseek.com/v1/embeddings"
                    && request.body["model"] == "deepseek-embedder-v1"
            })
            .returning(|_| Ok(HttpResponse::new(200, r#"{"data":[{"embedding":[0.5]}]}"#)));

        let driver = DeepSeekDriver::new(config, Arc::new(transport));
        assert_eq!(driver.embed("x").await.unwrap(), vec![0.5]);
    }

    #[tokio::test]
    async fn test_errors_are_labelled_deepseek() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_post()
            .returning(|_| Ok(HttpResponse::new(200, r#"{"object":"list"}"#)));

        let driver = DeepSeekDriver::new(DeepSeekDriver::defaults(), Arc::new(transport));
        let err = driver.embed("x").await.unwrap_err();
        assert!(matches!(err, VectorError::Provider { provider: "deepseek", .. }));
    }
}
