//! OpenAI chat-completions provider.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use super::prompt::{parse_structured_query, QUERY_TEMPERATURE, SYSTEM_PROMPT};
use super::{failure_from_response, ProviderClient};
use crate::auth::{ApiKeyAuthManager, ApiKeyScheme, AuthManager};
use crate::error::{ErrorKind, PhraseRule, ProviderFailure};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{ProviderChoice, QueryRequest, StructuredQuery};

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Provider client for OpenAI.
pub struct OpenAiProvider {
    transport: Arc<dyn HttpTransport>,
    auth: Box<dyn AuthManager>,
    base_url: Url,
}

impl OpenAiProvider {
    /// Creates a client that sends requests through `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: SecretString, base_url: Url) -> Self {
        Self {
            transport,
            auth: Box::new(ApiKeyAuthManager::new(api_key, ApiKeyScheme::Bearer)),
            base_url,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.as_str().trim_end_matches('/'))
    }

    async fn complete(&self, body: &ChatCompletionRequest<'_>) -> Result<String, ProviderFailure> {
        let provider = ProviderChoice::OpenAi;
        let mut request = HttpRequest::post_json(self.endpoint(), body)
            .map_err(|e| ProviderFailure::from_transport(provider, &e))?;
        if let Some((name, value)) = self.auth.get_auth_header() {
            request = request.header(name, value);
        }

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ProviderFailure::from_transport(provider, &e))?;

        if !response.is_success() {
            return Err(failure_from_response(provider, response.status, &response.body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&response.body).map_err(|e| {
            tracing::debug!(error = %e, "Unexpected chat completion body");
            ProviderFailure::new(provider, "unexpected chat completion response format")
                .with_status(response.status)
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderFailure::new(provider, "chat completion contained no message content"))
    }
}

#[async_trait]
impl ProviderClient for OpenAiProvider {
    fn choice(&self) -> ProviderChoice {
        ProviderChoice::OpenAi
    }

    fn phrase_rules(&self) -> Vec<PhraseRule> {
        vec![
            PhraseRule::new(ErrorKind::RateLimited).phrase("overloaded"),
            PhraseRule::new(ErrorKind::QuotaExceeded).phrase("insufficient_quota"),
            // Must precede the base "insufficient" quota phrase.
            PhraseRule::new(ErrorKind::InvalidCredential)
                .any_of(&["invalid_api_key", "insufficient permissions"]),
            PhraseRule::new(ErrorKind::ModelUnavailable)
                .all_of(&["model", "does not exist"])
                .phrase("model_not_found"),
            PhraseRule::new(ErrorKind::NetworkFailure)
                .any_of(&["server had an error", "service unavailable"]),
        ]
    }

    async fn generate(&self, request: &QueryRequest) -> Result<StructuredQuery, ProviderFailure> {
        let body = ChatCompletionRequest {
            model: request.model_name(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: request.natural_language_text(),
                },
            ],
            temperature: Some(QUERY_TEMPERATURE),
            max_tokens: None,
        };

        tracing::debug!(model = request.model_name(), "Requesting chat completion");
        let completion = self.complete(&body).await?;
        parse_structured_query(ProviderChoice::OpenAi, &completion)
    }

    async fn ping(&self, model: &str) -> Result<(), ProviderFailure> {
        let body = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: "Hello",
            }],
            temperature: None,
            max_tokens: Some(5),
        };
        self.complete(&body).await.map(|_| ())
    }
}
