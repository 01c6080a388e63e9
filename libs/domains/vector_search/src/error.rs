use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("{kind} driver [{name}] not supported")]
    DriverNotSupported { kind: &'static str, name: String },

    #[error("Config for {kind} [{name}] not found")]
    ConfigNotFound { kind: &'static str, name: String },

    #[error("{record} must implement {capability}")]
    MissingCapability {
        record: String,
        capability: &'static str,
    },

    #[error("{provider} {operation} failed: {message}")]
    Provider {
        provider: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl VectorError {
    pub(crate) fn provider(
        provider: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        VectorError::Provider {
            provider,
            operation,
            message: message.into(),
        }
    }
}

/// The URL is stripped because some providers carry the API key in the query string.
impl From<reqwest::Error> for VectorError {
    fn from(err: reqwest::Error) -> Self {
        VectorError::Http(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Internal(format!("JSON error: {}", err))
    }
}

impl From<ConfigError> for VectorError {
    fn from(err: ConfigError) -> Self {
        VectorError::Config(err.to_string())
    }
}
