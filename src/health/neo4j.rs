//! Neo4j connectivity probe over the transactional HTTP endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ReadinessProbe;
use crate::auth::{AuthManager, BasicAuthManager};
use crate::config::DataStoreConfig;
use crate::transport::{HttpRequest, HttpTransport};

#[derive(Debug, Serialize)]
struct CommitRequest {
    statements: Vec<Statement>,
}

#[derive(Debug, Serialize)]
struct Statement {
    statement: &'static str,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Runs `RETURN 1` in an auto-commit transaction.
///
/// Ready iff the server answers 2xx with an empty `errors` array.
pub struct Neo4jProbe {
    transport: Arc<dyn HttpTransport>,
    auth: BasicAuthManager,
    endpoint: String,
}

impl Neo4jProbe {
    /// Creates a probe for the configured database.
    pub fn new(transport: Arc<dyn HttpTransport>, config: DataStoreConfig) -> Self {
        let endpoint = format!(
            "{}/db/{}/tx/commit",
            config.http_uri.as_str().trim_end_matches('/'),
            config.database
        );
        Self {
            transport,
            auth: BasicAuthManager::new(config.username, config.password),
            endpoint,
        }
    }
}

#[async_trait]
impl ReadinessProbe for Neo4jProbe {
    async fn probe(&self) -> Result<(), String> {
        let body = CommitRequest {
            statements: vec![Statement {
                statement: "RETURN 1",
            }],
        };
        let mut request =
            HttpRequest::post_json(self.endpoint.as_str(), &body).map_err(|e| e.to_string())?;
        if let Some((name, value)) = self.auth.get_auth_header() {
            request = request.header(name, value);
        }
        request = request.header("accept", "application/json");

        let response = self.transport.send(request).await.map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!("HTTP {}: {}", response.status, response.text()));
        }

        let parsed: CommitResponse =
            serde_json::from_slice(&response.body).map_err(|e| format!("unexpected response: {}", e))?;
        match parsed.errors.first() {
            None => Ok(()),
            Some(err) => Err(format!("{}: {}", err.code, err.message)),
        }
    }
}
