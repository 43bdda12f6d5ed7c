//! Raw failures surfaced by provider clients, prior to classification.

use super::categories::TransportError;
use crate::types::ProviderChoice;
use std::fmt;

/// A failure as reported by a provider, with its native error text intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Provider that produced the failure.
    pub provider: ProviderChoice,
    /// HTTP status, when the failure came from an HTTP response.
    pub status: Option<u16>,
    /// Native error message.
    pub message: String,
    /// Provider error code or status string (e.g. `insufficient_quota`,
    /// `RESOURCE_EXHAUSTED`).
    pub code: Option<String>,
}

impl ProviderFailure {
    /// Creates a failure carrying only a message.
    pub fn new(provider: ProviderChoice, message: impl Into<String>) -> Self {
        Self {
            provider,
            status: None,
            message: message.into(),
            code: None,
        }
    }

    /// Attaches the HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches the provider error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Wraps a transport error. The transport's own wording is kept so
    /// timeouts and connection errors classify as network failures.
    pub fn from_transport(provider: ProviderChoice, err: &TransportError) -> Self {
        Self::new(provider, err.to_string())
    }

    /// Text the classifier matches against: the message, followed by the
    /// provider code in brackets when one is present.
    pub fn raw_text(&self) -> String {
        match &self.code {
            Some(code) if !code.is_empty() => format!("{} [{}]", self.message, code),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} HTTP {}: {}", self.provider, status, self.raw_text()),
            None => write!(f, "{}: {}", self.provider, self.raw_text()),
        }
    }
}

impl std::error::Error for ProviderFailure {}
