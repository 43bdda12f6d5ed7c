//! Ordered phrase-rule table mapping raw provider error text to an [`ErrorKind`].
//!
//! Matching is case-insensitive substring search. Rules are evaluated in
//! order and the first match wins; text matching no rule is
//! [`ErrorKind::Unknown`].
//!
//! Provider-specific rules are layered in front of the base table with
//! [`ErrorClassifier::with_provider_rules`], so a provider can refine how its
//! own vocabulary is read without touching the shared rules.

use super::failure::ProviderFailure;
use super::kinds::{ClassifiedError, ErrorKind};

/// One row of the rule table.
///
/// A rule is a disjunction of clauses; a clause is a conjunction of phrases.
/// `PhraseRule::new(kind).all_of(&["invalid", "key"]).phrase("unauthorized")`
/// reads as `("invalid" AND "key") OR "unauthorized"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseRule {
    kind: ErrorKind,
    clauses: Vec<Vec<String>>,
}

impl PhraseRule {
    /// Creates an empty rule for `kind`. An empty rule matches nothing.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            clauses: Vec::new(),
        }
    }

    /// Adds a clause matching a single phrase.
    pub fn phrase(self, phrase: &str) -> Self {
        self.all_of(&[phrase])
    }

    /// Adds one single-phrase clause per entry.
    pub fn any_of(mut self, phrases: &[&str]) -> Self {
        for phrase in phrases {
            self = self.phrase(phrase);
        }
        self
    }

    /// Adds a clause matching only when every phrase is present.
    pub fn all_of(mut self, phrases: &[&str]) -> Self {
        let clause: Vec<String> = phrases
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        if !clause.is_empty() {
            self.clauses.push(clause);
        }
        self
    }

    /// Kind assigned when this rule matches.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Tests an already lower-cased message.
    fn matches_lowercase(&self, message: &str) -> bool {
        self.clauses
            .iter()
            .any(|clause| clause.iter().all(|phrase| message.contains(phrase.as_str())))
    }

    /// Tests a message, ignoring case.
    pub fn matches(&self, message: &str) -> bool {
        self.matches_lowercase(&message.to_lowercase())
    }
}

/// The shared rule table, in evaluation order.
pub fn base_rules() -> Vec<PhraseRule> {
    vec![
        PhraseRule::new(ErrorKind::RateLimited).phrase("rate limit"),
        PhraseRule::new(ErrorKind::QuotaExceeded).any_of(&["quota", "insufficient"]),
        PhraseRule::new(ErrorKind::InvalidCredential)
            .all_of(&["invalid", "key"])
            .any_of(&["incorrect api key", "unauthorized", "authentication"]),
        PhraseRule::new(ErrorKind::ModelUnavailable)
            .all_of(&["model", "not found"])
            .all_of(&["model", "unavailable"]),
        PhraseRule::new(ErrorKind::NetworkFailure)
            .any_of(&["timeout", "timed out", "connection", "network"]),
    ]
}

/// Classifies raw provider failures.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<PhraseRule>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier {
    /// Creates a classifier holding only the base table.
    pub fn new() -> Self {
        Self {
            rules: base_rules(),
        }
    }

    /// Returns a classifier that evaluates `rules` before the current table.
    pub fn with_provider_rules(mut self, rules: impl IntoIterator<Item = PhraseRule>) -> Self {
        let mut layered: Vec<PhraseRule> = rules.into_iter().collect();
        layered.append(&mut self.rules);
        self.rules = layered;
        self
    }

    /// The rule table in evaluation order.
    pub fn rules(&self) -> &[PhraseRule] {
        &self.rules
    }

    /// Returns the kind of the first matching rule.
    pub fn kind_of(&self, raw_message: &str) -> ErrorKind {
        let lowered = raw_message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches_lowercase(&lowered))
            .map(PhraseRule::kind)
            .unwrap_or(ErrorKind::Unknown)
    }

    /// Classifies raw error text.
    pub fn classify(&self, raw_message: &str) -> ClassifiedError {
        ClassifiedError::new(self.kind_of(raw_message), raw_message)
    }

    /// Classifies a provider failure using its message and code.
    pub fn classify_failure(&self, failure: &ProviderFailure) -> ClassifiedError {
        self.classify(&failure.raw_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_scenario() {
        let err = ErrorClassifier::new().classify("Rate limit exceeded, please retry");
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert!(err.retryable);
    }

    #[test]
    fn test_incorrect_key_scenario() {
        let err = ErrorClassifier::new().classify("Incorrect API key provided");
        assert_eq!(err.kind, ErrorKind::InvalidCredential);
        assert!(!err.retryable);
    }

    #[test]
    fn test_first_match_wins() {
        // Mentions both a rate limit and a quota; rate limit is earlier.
        let kind = ErrorClassifier::new().kind_of("Rate limit reached: quota of 3 RPM");
        assert_eq!(kind, ErrorKind::RateLimited);
    }

    #[test]
    fn test_conjunction_requires_all_phrases() {
        let classifier = ErrorClassifier::new();
        assert_eq!(classifier.kind_of("invalid request body"), ErrorKind::Unknown);
        assert_eq!(classifier.kind_of("Invalid key supplied"), ErrorKind::InvalidCredential);
        assert_eq!(classifier.kind_of("resource not found"), ErrorKind::Unknown);
        assert_eq!(classifier.kind_of("Model not found"), ErrorKind::ModelUnavailable);
    }

    #[test]
    fn test_provider_rules_take_precedence() {
        let classifier = ErrorClassifier::new()
            .with_provider_rules([PhraseRule::new(ErrorKind::RateLimited).phrase("overloaded")]);
        assert_eq!(
            classifier.kind_of("The model is overloaded. [UNAVAILABLE]"),
            ErrorKind::RateLimited
        );
        assert_eq!(
            ErrorClassifier::new().kind_of("The model is overloaded. [UNAVAILABLE]"),
            ErrorKind::ModelUnavailable
        );
    }

    #[test]
    fn test_empty_rule_matches_nothing() {
        let rule = PhraseRule::new(ErrorKind::NetworkFailure).all_of(&["", "  "]);
        assert!(!rule.matches(""));
        assert!(!rule.matches("anything"));
    }

    #[test]
    fn test_empty_message_is_unknown() {
        let err = ErrorClassifier::new().classify("");
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert!(!err.retryable);
    }
}
