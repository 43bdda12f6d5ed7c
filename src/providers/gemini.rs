//! Google Gemini `generateContent` provider.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use super::prompt::{parse_structured_query, single_turn_prompt, QUERY_TEMPERATURE};
use super::{failure_from_response, ProviderClient};
use crate::auth::{ApiKeyAuthManager, ApiKeyScheme, AuthManager};
use crate::error::{ErrorKind, PhraseRule, ProviderFailure};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{ProviderChoice, QueryRequest, StructuredQuery};

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default API version.
pub const DEFAULT_GEMINI_API_VERSION: &str = "v1beta";

const QUERY_MAX_OUTPUT_TOKENS: u32 = 1000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Provider client for Google Gemini.
pub struct GeminiProvider {
    transport: Arc<dyn HttpTransport>,
    auth: Box<dyn AuthManager>,
    base_url: Url,
    api_version: String,
}

impl GeminiProvider {
    /// Creates a client that sends requests through `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: SecretString, base_url: Url) -> Self {
        Self {
            transport,
            auth: Box::new(ApiKeyAuthManager::new(api_key, ApiKeyScheme::GoogleApiKey)),
            base_url,
            api_version: DEFAULT_GEMINI_API_VERSION.to_string(),
        }
    }

    /// Overrides the API version path segment.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            self.api_version,
            model
        )
    }

    async fn generate_text(
        &self,
        model: &str,
        prompt: &str,
        config: GenerationConfig,
    ) -> Result<String, ProviderFailure> {
        let provider = ProviderChoice::Gemini;
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: config,
        };

        let mut request = HttpRequest::post_json(self.endpoint(model), &body)
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

        let parsed: GenerateContentResponse = serde_json::from_slice(&response.body).map_err(|e| {
            tracing::debug!(error = %e, "Unexpected generateContent body");
            ProviderFailure::new(provider, "unexpected generateContent response format")
                .with_status(response.status)
        })?;

        let candidate = match parsed.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                let reason = parsed
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .unwrap_or_else(|| "none given".to_string());
                return Err(ProviderFailure::new(
                    provider,
                    format!("response contained no candidates (block reason: {})", reason),
                ));
            }
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(ProviderFailure::new(
                provider,
                format!("response candidate had no text (finish reason: {})", reason),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl ProviderClient for GeminiProvider {
    fn choice(&self) -> ProviderChoice {
        ProviderChoice::Gemini
    }

    fn phrase_rules(&self) -> Vec<PhraseRule> {
        vec![
            PhraseRule::new(ErrorKind::RateLimited).phrase("overloaded"),
            // Status codes of transient server errors; checked after "overloaded".
            PhraseRule::new(ErrorKind::NetworkFailure).any_of(&[
                "[unavailable]",
                "[internal]",
                "service unavailable",
            ]),
            PhraseRule::new(ErrorKind::QuotaExceeded)
                .any_of(&["resource_exhausted", "resource has been exhausted"]),
            PhraseRule::new(ErrorKind::InvalidCredential).any_of(&[
                "api key not valid",
                "api_key_invalid",
                "unauthenticated",
                "permission_denied",
            ]),
            PhraseRule::new(ErrorKind::ModelUnavailable).phrase("is not found for api version"),
        ]
    }

    async fn generate(&self, request: &QueryRequest) -> Result<StructuredQuery, ProviderFailure> {
        let prompt = single_turn_prompt(request.natural_language_text());
        let config = GenerationConfig {
            temperature: Some(QUERY_TEMPERATURE),
            max_output_tokens: QUERY_MAX_OUTPUT_TOKENS,
        };

        tracing::debug!(model = request.model_name(), "Requesting generateContent");
        let text = self.generate_text(request.model_name(), &prompt, config).await?;
        parse_structured_query(ProviderChoice::Gemini, &text)
    }

    async fn ping(&self, model: &str) -> Result<(), ProviderFailure> {
        let config = GenerationConfig {
            temperature: None,
            max_output_tokens: 5,
        };
        self.generate_text(model, "Hello", config).await.map(|_| ())
    }
}
