//! AI provider clients.
//!
//! Every provider implements [`ProviderClient`]: it turns a [`QueryRequest`]
//! into a [`StructuredQuery`] or reports a [`ProviderFailure`] carrying the
//! provider's own error text. Providers never retry; the
//! [`RetryController`](crate::resilience::RetryController) owns that.
//!
//! A provider may also contribute [`PhraseRule`]s describing its error
//! vocabulary. These are layered in front of the base classifier table.

mod gemini;
mod openai;
pub mod prompt;

pub use gemini::{GeminiProvider, DEFAULT_GEMINI_API_VERSION, DEFAULT_GEMINI_BASE_URL};
pub use openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ProviderSettings;
use crate::error::{ErrorClassifier, PhraseRule, ProviderFailure};
use crate::transport::HttpTransport;
use crate::types::{ProviderChoice, QueryRequest, StructuredQuery};

/// Capability shared by all AI providers.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Which provider this client talks to.
    fn choice(&self) -> ProviderChoice;

    /// Provider-specific classification rules, evaluated before the base table.
    fn phrase_rules(&self) -> Vec<PhraseRule> {
        Vec::new()
    }

    /// Classifier combining this provider's rules with the base table.
    fn classifier(&self) -> ErrorClassifier {
        ErrorClassifier::new().with_provider_rules(self.phrase_rules())
    }

    /// Translates the request's question into a structured query.
    async fn generate(&self, request: &QueryRequest) -> Result<StructuredQuery, ProviderFailure>;

    /// Cheap round trip proving the credentials and model work.
    async fn ping(&self, model: &str) -> Result<(), ProviderFailure>;
}

/// Builds the client for `choice` from its settings.
pub fn create_provider(
    choice: ProviderChoice,
    settings: &ProviderSettings,
    transport: Arc<dyn HttpTransport>,
) -> Arc<dyn ProviderClient> {
    let api_key = settings.api_key.clone();
    let base_url = settings.base_url.clone();
    match choice {
        ProviderChoice::OpenAi => Arc::new(OpenAiProvider::new(transport, api_key, base_url)),
        ProviderChoice::Gemini => Arc::new(GeminiProvider::new(transport, api_key, base_url)),
    }
}

/// Error envelope shared by OpenAI and Gemini: `{"error": {"message": ..}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    /// OpenAI `code`, e.g. `insufficient_quota`.
    #[serde(default)]
    code: Option<serde_json::Value>,
    /// Gemini `status`, e.g. `RESOURCE_EXHAUSTED`.
    #[serde(default)]
    status: Option<String>,
}

/// Builds a [`ProviderFailure`] from a non-2xx response, keeping the
/// provider's message unmodified. Bodies that are not the standard error
/// envelope are passed through as text.
fn failure_from_response(provider: ProviderChoice, status: u16, body: &[u8]) -> ProviderFailure {
    match serde_json::from_slice::<ApiErrorResponse>(body) {
        Ok(envelope) => {
            let detail = envelope.error;
            let code = detail
                .status
                .or_else(|| match detail.code {
                    Some(serde_json::Value::String(s)) => Some(s),
                    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|c| !c.is_empty());
            let message = if detail.message.is_empty() {
                status_line(status)
            } else {
                detail.message
            };
            let failure = ProviderFailure::new(provider, message).with_status(status);
            match code {
                Some(code) => failure.with_code(code),
                None => failure,
            }
        }
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            let message = if text.is_empty() {
                status_line(status)
            } else {
                text
            };
            ProviderFailure::new(provider, message).with_status(status)
        }
    }
}

fn status_line(status: u16) -> String {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason());
    match reason {
        Some(reason) => format!("HTTP {} {}", status, reason),
        None => format!("HTTP {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_matches_choice() {
        let transport = Arc::new(crate::mocks::MockHttpTransport::new());
        let settings = ProviderSettings::new(
            secrecy::SecretString::new("key".into()),
            DEFAULT_GEMINI_BASE_URL,
        )
        .unwrap();
        let provider = create_provider(ProviderChoice::Gemini, &settings, transport);
        assert_eq!(provider.choice(), ProviderChoice::Gemini);
    }

    #[test]
    fn test_openai_error_envelope() {
        let body = br#"{"error": {"message": "Incorrect API key provided: sk-abc.", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        let failure = failure_from_response(ProviderChoice::OpenAi, 401, body);
        assert_eq!(failure.message, "Incorrect API key provided: sk-abc.");
        assert_eq!(failure.code.as_deref(), Some("invalid_api_key"));
        assert_eq!(failure.status, Some(401));
    }

    #[test]
    fn test_gemini_error_envelope_prefers_status() {
        let body = br#"{"error": {"code": 429, "message": "Resource has been exhausted (e.g. check quota).", "status": "RESOURCE_EXHAUSTED"}}"#;
        let failure = failure_from_response(ProviderChoice::Gemini, 429, body);
        assert_eq!(failure.code.as_deref(), Some("RESOURCE_EXHAUSTED"));
    }

    #[test]
    fn test_plain_text_body_passes_through() {
        let failure = failure_from_response(ProviderChoice::OpenAi, 502, b"Bad Gateway");
        assert_eq!(failure.message, "Bad Gateway");
        assert_eq!(failure.code, None);
    }

    #[test]
    fn test_empty_body_uses_status() {
        let failure = failure_from_response(ProviderChoice::Gemini, 503, b"");
        assert_eq!(failure.message, "HTTP 503 Service Unavailable");

        let failure = failure_from_response(ProviderChoice::Gemini, 504, b"");
        assert_eq!(failure.message, "HTTP 504 Gateway Timeout");
    }
}
