//! Main error type for the graph query integration.

use super::categories::*;
use thiserror::Error;

/// Result type alias for fallible construction and configuration.
pub type GraphQueryResult<T> = Result<T, GraphQueryError>;

/// Top-level error type.
///
/// Only raised while building clients and configuration. Orchestrated calls
/// never return it: their failures are folded into a
/// [`QueryResult`](crate::resilience::QueryResult).
#[derive(Error, Debug, Clone)]
pub enum GraphQueryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<url::ParseError> for GraphQueryError {
    fn from(err: url::ParseError) -> Self {
        GraphQueryError::Configuration(ConfigurationError::InvalidBaseUrl {
            url: err.to_string(),
        })
    }
}
