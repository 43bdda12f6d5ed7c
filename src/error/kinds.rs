//! Failure taxonomy shared by providers, the retry controller and callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a provider-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider throttled the request.
    RateLimited,
    /// Account credits or quota are exhausted.
    QuotaExceeded,
    /// The API key is missing, wrong or lacks permission.
    InvalidCredential,
    /// The requested model does not exist or is not served.
    ModelUnavailable,
    /// Timeout, refused connection or other network trouble.
    NetworkFailure,
    /// Nothing in the rule table matched.
    Unknown,
}

impl ErrorKind {
    /// All kinds, in rule-table order.
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::RateLimited,
        ErrorKind::QuotaExceeded,
        ErrorKind::InvalidCredential,
        ErrorKind::ModelUnavailable,
        ErrorKind::NetworkFailure,
        ErrorKind::Unknown,
    ];

    /// Returns true if failures of this kind are likely transient.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited | ErrorKind::QuotaExceeded | ErrorKind::NetworkFailure
        )
    }

    /// Returns true if this kind points at a configuration problem rather
    /// than a transient condition.
    pub fn is_configuration_problem(self) -> bool {
        matches!(self, ErrorKind::InvalidCredential | ErrorKind::ModelUnavailable)
    }

    /// User-facing remediation text for this kind.
    pub fn remediation(self) -> &'static str {
        match self {
            ErrorKind::RateLimited => {
                "Rate limit reached: wait a few moments and retry, check the provider \
                 dashboard for your usage limits, or switch to another API key."
            }
            ErrorKind::QuotaExceeded => {
                "Quota exceeded: add credits to your provider account or wait for \
                 the quota to reset, then retry."
            }
            ErrorKind::InvalidCredential => {
                "Invalid API key: verify the key in your settings or regenerate it \
                 in the provider console."
            }
            ErrorKind::ModelUnavailable => {
                "Model unavailable: pick a different model that your account can \
                 access."
            }
            ErrorKind::NetworkFailure => {
                "Network error: check your internet connection and retry."
            }
            ErrorKind::Unknown => {
                "Unexpected provider error: review the error details and retry; \
                 if it persists, contact the provider's support."
            }
        }
    }

    /// Short stable label, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::InvalidCredential => "invalid_credential",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::NetworkFailure => "network_failure",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider failure after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    /// Failure category.
    pub kind: ErrorKind,
    /// Remediation message intended for direct display.
    pub remediation: String,
    /// Whether the retry controller may try again.
    pub retryable: bool,
    /// The provider's native error text.
    pub raw_message: String,
}

impl ClassifiedError {
    /// Builds a classified error whose remediation and retryability derive
    /// from `kind`.
    pub fn new(kind: ErrorKind, raw_message: impl Into<String>) -> Self {
        Self {
            kind,
            remediation: kind.remediation().to_string(),
            retryable: kind.is_retryable(),
            raw_message: raw_message.into(),
        }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.remediation, self.raw_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_partition() {
        let retryable: Vec<_> = ErrorKind::ALL
            .iter()
            .copied()
            .filter(|k| k.is_retryable())
            .collect();
        assert_eq!(
            retryable,
            vec![
                ErrorKind::RateLimited,
                ErrorKind::QuotaExceeded,
                ErrorKind::NetworkFailure
            ]
        );
    }

    #[test]
    fn test_configuration_problems() {
        assert!(ErrorKind::InvalidCredential.is_configuration_problem());
        assert!(ErrorKind::ModelUnavailable.is_configuration_problem());
        assert!(!ErrorKind::RateLimited.is_configuration_problem());
        assert!(!ErrorKind::Unknown.is_configuration_problem());
    }

    #[test]
    fn test_remediation_names_category_and_action() {
        for kind in ErrorKind::ALL {
            let text = kind.remediation();
            assert!(text.contains(':'), "{kind} remediation lacks a category");
            assert!(text.len() > 40, "{kind} remediation too short");
        }
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::QuotaExceeded).unwrap();
        assert_eq!(json, "\"quota_exceeded\"");
    }
}
