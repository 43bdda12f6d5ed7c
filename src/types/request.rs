//! Per-turn request types.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which AI provider translates the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
    /// OpenAI chat completions.
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini generative language API.
    Gemini,
}

impl ProviderChoice {
    /// Model used when the caller leaves the model name blank.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderChoice::OpenAi => "gpt-3.5-turbo",
            ProviderChoice::Gemini => "gemini-1.5-flash",
        }
    }

    /// Stable lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderChoice::OpenAi => "openai",
            ProviderChoice::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderChoice {
    type Err = ConfigurationError;

    /// Accepts the identifiers `openai` and `gemini` in any case, plus the
    /// display labels `OpenAI` and `Google Gemini`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open-ai" => Ok(ProviderChoice::OpenAi),
            "gemini" | "google gemini" | "google-gemini" => Ok(ProviderChoice::Gemini),
            _ => Err(ConfigurationError::UnsupportedProvider {
                name: s.to_string(),
            }),
        }
    }
}

/// One user turn to translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    natural_language_text: String,
    provider_choice: ProviderChoice,
    model_name: String,
}

impl QueryRequest {
    /// Creates a request. A blank model name resolves to the provider's
    /// default model.
    pub fn new(
        natural_language_text: impl Into<String>,
        provider_choice: ProviderChoice,
        model_name: impl Into<String>,
    ) -> Self {
        let model_name = model_name.into();
        let model_name = if model_name.trim().is_empty() {
            provider_choice.default_model().to_string()
        } else {
            model_name.trim().to_string()
        };
        Self {
            natural_language_text: natural_language_text.into(),
            provider_choice,
            model_name,
        }
    }

    /// The user's question.
    pub fn natural_language_text(&self) -> &str {
        &self.natural_language_text
    }

    /// Selected provider.
    pub fn provider_choice(&self) -> ProviderChoice {
        self.provider_choice
    }

    /// Selected model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}
