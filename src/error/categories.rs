//! Error category types for construction-time failures.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Missing API key for provider {provider}")]
    MissingApiKey { provider: String },

    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Unsupported provider: {name} (expected `openai` or `gemini`)")]
    UnsupportedProvider { name: String },

    #[error("Invalid retry policy: {message}")]
    InvalidRetryPolicy { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Transport-level errors raised by an [`HttpTransport`](crate::transport::HttpTransport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("request error: {0}")]
    Request(String),
}
