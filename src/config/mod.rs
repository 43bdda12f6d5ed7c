//! Configuration for the query orchestrator and health monitor.

use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use crate::error::{ConfigurationError, GraphQueryError, GraphQueryResult};
use crate::providers::{DEFAULT_GEMINI_BASE_URL, DEFAULT_OPENAI_BASE_URL};
use crate::resilience::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::types::ProviderChoice;

/// Default per-request transport timeout (60 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default bound on a single orchestrated provider call (90 seconds).
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 90;

/// Default bound on each readiness probe (10 seconds).
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Default Neo4j database name.
pub const DEFAULT_NEO4J_DATABASE: &str = "neo4j";

/// Credentials and endpoint for one AI provider.
#[derive(Clone)]
pub struct ProviderSettings {
    /// API key.
    pub api_key: SecretString,
    /// API base URL.
    pub base_url: Url,
}

impl ProviderSettings {
    /// Creates settings, validating the base URL.
    pub fn new(api_key: SecretString, base_url: &str) -> GraphQueryResult<Self> {
        Ok(Self {
            api_key,
            base_url: parse_http_url(base_url)?,
        })
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// Connection details for the graph database's HTTP endpoint.
#[derive(Clone)]
pub struct DataStoreConfig {
    /// HTTP endpoint, e.g. `http://localhost:7474`.
    pub http_uri: Url,
    /// User name.
    pub username: String,
    /// Password.
    pub password: SecretString,
    /// Database name.
    pub database: String,
}

impl DataStoreConfig {
    /// Creates a data store configuration for the default database.
    pub fn new(
        http_uri: &str,
        username: impl Into<String>,
        password: SecretString,
    ) -> GraphQueryResult<Self> {
        Ok(Self {
            http_uri: parse_http_url(http_uri)?,
            username: username.into(),
            password,
            database: DEFAULT_NEO4J_DATABASE.to_string(),
        })
    }

    /// Selects a database other than the default.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }
}

impl std::fmt::Debug for DataStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStoreConfig")
            .field("http_uri", &self.http_uri.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

/// Configuration for [`QueryOrchestrator`](crate::orchestrator::QueryOrchestrator)
/// and [`HealthMonitor`](crate::health::HealthMonitor).
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// OpenAI settings; `None` leaves the provider unregistered.
    pub openai: Option<ProviderSettings>,
    /// Gemini settings; `None` leaves the provider unregistered.
    pub gemini: Option<ProviderSettings>,
    /// Provider probed by the health monitor.
    pub default_provider: ProviderChoice,
    /// Model probed by the health monitor. Blank means the provider default.
    pub default_model: String,
    /// Retry budget for each translation.
    pub retry_policy: RetryPolicy,
    /// Transport timeout per HTTP request.
    pub request_timeout: Duration,
    /// Transport connect timeout.
    pub connect_timeout: Duration,
    /// Bound on one provider call, including response parsing.
    pub call_timeout: Duration,
    /// Bound on each readiness probe.
    pub probe_timeout: Duration,
    /// Graph database; `None` reports the data store as not ready.
    pub data_store: Option<DataStoreConfig>,
}

impl OrchestratorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Providers without an API key are left unconfigured. The data store is
    /// configured only when `NEO4J_HTTP_URI` is set.
    pub fn from_env() -> GraphQueryResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> GraphQueryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(key) = var("OPENAI_API_KEY") {
            builder = builder.openai_api_key(SecretString::new(key));
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            builder = builder.openai_base_url(&url)?;
        }
        if let Some(key) = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY")) {
            builder = builder.gemini_api_key(SecretString::new(key));
        }
        if let Some(url) = var("GEMINI_BASE_URL") {
            builder = builder.gemini_base_url(&url)?;
        }
        if let Some(provider) = var("LLM_PROVIDER") {
            builder = builder.default_provider(provider.parse()?);
        }
        if let Some(model) = var("LLM_MODEL") {
            builder = builder.default_model(model);
        }
        if let Some(attempts) = var("QUERY_MAX_ATTEMPTS") {
            builder = builder.max_attempts(parse_number("QUERY_MAX_ATTEMPTS", &attempts)?);
        }
        if let Some(secs) = var("QUERY_RETRY_DELAY_SECS") {
            builder = builder.retry_delay(Duration::from_secs(parse_number(
                "QUERY_RETRY_DELAY_SECS",
                &secs,
            )?));
        }
        if let Some(secs) = var("QUERY_TIMEOUT_SECS") {
            builder = builder.call_timeout(Duration::from_secs(parse_number(
                "QUERY_TIMEOUT_SECS",
                &secs,
            )?));
        }
        if let Some(uri) = var("NEO4J_HTTP_URI") {
            let username = var("NEO4J_USERNAME").unwrap_or_else(|| "neo4j".to_string());
            let password = var("NEO4J_PASSWORD").unwrap_or_default();
            let mut data_store = DataStoreConfig::new(&uri, username, SecretString::new(password))?;
            if let Some(database) = var("NEO4J_DATABASE") {
                data_store = data_store.with_database(database);
            }
            builder = builder.data_store(data_store);
        }

        builder.build()
    }

    /// Settings for `choice`, if that provider is configured.
    pub fn provider_settings(&self, choice: ProviderChoice) -> Option<&ProviderSettings> {
        match choice {
            ProviderChoice::OpenAi => self.openai.as_ref(),
            ProviderChoice::Gemini => self.gemini.as_ref(),
        }
    }

    /// The model the health monitor probes.
    pub fn probe_model(&self) -> &str {
        if self.default_model.trim().is_empty() {
            self.default_provider.default_model()
        } else {
            self.default_model.trim()
        }
    }
}

/// Builder for [`OrchestratorConfig`].
#[derive(Default)]
pub struct OrchestratorConfigBuilder {
    openai_api_key: Option<SecretString>,
    openai_base_url: Option<Url>,
    gemini_api_key: Option<SecretString>,
    gemini_base_url: Option<Url>,
    default_provider: Option<ProviderChoice>,
    default_model: Option<String>,
    retry_policy: Option<RetryPolicy>,
    max_attempts: Option<u32>,
    retry_delay: Option<Duration>,
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    call_timeout: Option<Duration>,
    probe_timeout: Option<Duration>,
    data_store: Option<DataStoreConfig>,
}

impl OrchestratorConfigBuilder {
    /// Set the OpenAI API key.
    pub fn openai_api_key(mut self, api_key: SecretString) -> Self {
        self.openai_api_key = Some(api_key);
        self
    }

    /// Set the OpenAI base URL.
    pub fn openai_base_url(mut self, base_url: &str) -> GraphQueryResult<Self> {
        self.openai_base_url = Some(parse_http_url(base_url)?);
        Ok(self)
    }

    /// Set the Gemini API key.
    pub fn gemini_api_key(mut self, api_key: SecretString) -> Self {
        self.gemini_api_key = Some(api_key);
        self
    }

    /// Set the Gemini base URL.
    pub fn gemini_base_url(mut self, base_url: &str) -> GraphQueryResult<Self> {
        self.gemini_base_url = Some(parse_http_url(base_url)?);
        Ok(self)
    }

    /// Set the provider probed for readiness.
    pub fn default_provider(mut self, provider: ProviderChoice) -> Self {
        self.default_provider = Some(provider);
        self
    }

    /// Set the model probed for readiness.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the whole retry policy. Takes precedence over
    /// [`max_attempts`](Self::max_attempts) and [`retry_delay`](Self::retry_delay).
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Set the maximum number of attempts per translation.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the fixed wait between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Set the transport request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the transport connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the bound on one provider call.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Set the bound on each readiness probe.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Set the graph database connection.
    pub fn data_store(mut self, data_store: DataStoreConfig) -> Self {
        self.data_store = Some(data_store);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GraphQueryResult<OrchestratorConfig> {
        let retry_policy = match self.retry_policy {
            Some(policy) => policy,
            None => RetryPolicy::new(
                self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
                self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
            )?,
        };

        let call_timeout = self
            .call_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS));
        if call_timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "call timeout must be greater than zero".to_string(),
            }
            .into());
        }

        let openai = match self.openai_api_key {
            Some(api_key) => Some(ProviderSettings {
                api_key,
                base_url: match self.openai_base_url {
                    Some(url) => url,
                    None => Url::parse(DEFAULT_OPENAI_BASE_URL)?,
                },
            }),
            None => None,
        };

        let gemini = match self.gemini_api_key {
            Some(api_key) => Some(ProviderSettings {
                api_key,
                base_url: match self.gemini_base_url {
                    Some(url) => url,
                    None => Url::parse(DEFAULT_GEMINI_BASE_URL)?,
                },
            }),
            None => None,
        };

        Ok(OrchestratorConfig {
            openai,
            gemini,
            default_provider: self.default_provider.unwrap_or(ProviderChoice::OpenAi),
            default_model: self.default_model.unwrap_or_default(),
            retry_policy,
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            connect_timeout: self
                .connect_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            call_timeout,
            probe_timeout: self
                .probe_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS)),
            data_store: self.data_store,
        })
    }
}

fn parse_http_url(raw: &str) -> GraphQueryResult<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigurationError::InvalidBaseUrl {
            url: raw.to_string(),
        }
        .into()),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, GraphQueryError> {
    raw.trim().parse().map_err(|_| {
        ConfigurationError::InvalidConfiguration {
            message: format!("{} must be a non-negative integer, got `{}`", name, raw),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::builder().build().unwrap();

        assert!(config.openai.is_none());
        assert!(config.gemini.is_none());
        assert_eq!(config.default_provider, ProviderChoice::OpenAi);
        assert_eq!(config.retry_policy, RetryPolicy::default());
        assert_eq!(config.call_timeout, Duration::from_secs(90));
        assert_eq!(config.probe_model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_provider_gets_default_base_url() {
        let config = OrchestratorConfig::builder()
            .gemini_api_key(SecretString::new("g-key".into()))
            .build()
            .unwrap();

        let gemini = config.provider_settings(ProviderChoice::Gemini).unwrap();
        assert_eq!(
            gemini.base_url.as_str(),
            "https://generativelanguage.googleapis.com/"
        );
        assert_eq!(gemini.api_key.expose_secret(), "g-key");
        assert!(config.provider_settings(ProviderChoice::OpenAi).is_none());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = OrchestratorConfig::builder().max_attempts(0).build();
        assert!(matches!(
            result,
            Err(GraphQueryError::Configuration(
                ConfigurationError::InvalidRetryPolicy { .. }
            ))
        ));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let result = OrchestratorConfig::builder().openai_base_url("ftp://example.com");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = OrchestratorConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "Google Gemini"),
            ("LLM_MODEL", "gemini-1.5-pro"),
            ("GOOGLE_API_KEY", "g-key"),
            ("QUERY_MAX_ATTEMPTS", "5"),
            ("QUERY_RETRY_DELAY_SECS", "1"),
            ("QUERY_TIMEOUT_SECS", "30"),
            ("NEO4J_HTTP_URI", "http://localhost:7474"),
            ("NEO4J_PASSWORD", "secret"),
            ("NEO4J_DATABASE", "employees"),
        ]))
        .unwrap();

        assert_eq!(config.default_provider, ProviderChoice::Gemini);
        assert_eq!(config.probe_model(), "gemini-1.5-pro");
        assert!(config.gemini.is_some());
        assert!(config.openai.is_none());
        assert_eq!(config.retry_policy.max_attempts(), 5);
        assert_eq!(config.retry_policy.delay_between_attempts(), Duration::from_secs(1));
        assert_eq!(config.call_timeout, Duration::from_secs(30));

        let data_store = config.data_store.unwrap();
        assert_eq!(data_store.username, "neo4j");
        assert_eq!(data_store.database, "employees");
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers_and_providers() {
        assert!(OrchestratorConfig::from_lookup(lookup(&[("QUERY_MAX_ATTEMPTS", "many")])).is_err());
        assert!(OrchestratorConfig::from_lookup(lookup(&[("LLM_PROVIDER", "anthropic")])).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = ProviderSettings::new(
            SecretString::new("sk-live".into()),
            "https://api.openai.com/v1",
        )
        .unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("sk-live"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
