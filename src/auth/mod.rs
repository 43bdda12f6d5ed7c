//! Credential handling for provider and data-store requests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};

/// Produces the authentication header for a request.
pub trait AuthManager: Send + Sync {
    /// Header name and value to attach, or `None` when no credential is set.
    fn get_auth_header(&self) -> Option<(String, String)>;
}

/// How an API key is presented to the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiKeyScheme {
    /// `Authorization: Bearer <key>` (OpenAI).
    Bearer,
    /// `x-goog-api-key: <key>` (Gemini).
    GoogleApiKey,
}

/// API key authentication manager.
pub struct ApiKeyAuthManager {
    api_key: SecretString,
    scheme: ApiKeyScheme,
}

impl ApiKeyAuthManager {
    /// Create a new API key auth manager.
    pub fn new(api_key: SecretString, scheme: ApiKeyScheme) -> Self {
        Self { api_key, scheme }
    }
}

impl AuthManager for ApiKeyAuthManager {
    fn get_auth_header(&self) -> Option<(String, String)> {
        let key = self.api_key.expose_secret();
        if key.is_empty() {
            return None;
        }
        Some(match self.scheme {
            ApiKeyScheme::Bearer => ("authorization".to_string(), format!("Bearer {}", key)),
            ApiKeyScheme::GoogleApiKey => ("x-goog-api-key".to_string(), key.to_string()),
        })
    }
}

/// HTTP basic authentication, used for the graph database.
pub struct BasicAuthManager {
    username: String,
    password: SecretString,
}

impl BasicAuthManager {
    /// Create a basic auth manager.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl AuthManager for BasicAuthManager {
    fn get_auth_header(&self) -> Option<(String, String)> {
        let token = STANDARD.encode(format!(
            "{}:{}",
            self.username,
            self.password.expose_secret()
        ));
        Some(("authorization".to_string(), format!("Basic {}", token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let manager = ApiKeyAuthManager::new(SecretString::new("sk-test".into()), ApiKeyScheme::Bearer);
        let (name, value) = manager.get_auth_header().unwrap();
        assert_eq!(name, "authorization");
        assert_eq!(value, "Bearer sk-test");
    }

    #[test]
    fn test_google_header() {
        let manager =
            ApiKeyAuthManager::new(SecretString::new("g-key".into()), ApiKeyScheme::GoogleApiKey);
        let (name, value) = manager.get_auth_header().unwrap();
        assert_eq!(name, "x-goog-api-key");
        assert_eq!(value, "g-key");
    }

    #[test]
    fn test_empty_key_yields_no_header() {
        let manager = ApiKeyAuthManager::new(SecretString::new(String::new()), ApiKeyScheme::Bearer);
        assert!(manager.get_auth_header().is_none());
    }

    #[test]
    fn test_basic_header() {
        let manager = BasicAuthManager::new("neo4j", SecretString::new("secret".into()));
        let (name, value) = manager.get_auth_header().unwrap();
        assert_eq!(name, "authorization");
        assert_eq!(value, "Basic bmVvNGo6c2VjcmV0");
    }
}
