//! Entry point for translating questions into structured graph queries.
//!
//! [`QueryOrchestrator::translate`] builds a [`QueryRequest`], hands the
//! selected provider's `generate` call to the [`RetryController`] and returns
//! the [`QueryResult`]. Provider errors never escape raw: every failure is
//! classified. Each call also updates the [`HealthMonitor`]'s AI readiness.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{OrchestratorConfig, DEFAULT_CALL_TIMEOUT_SECS};
use crate::error::{
    ClassifiedError, ErrorClassifier, ErrorKind, GraphQueryResult, ProviderFailure, TransportError,
};
use crate::health::HealthMonitor;
use crate::providers::{create_provider, ProviderClient};
use crate::resilience::{LoggingHooks, QueryResult, RetryController};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{ProviderChoice, QueryRequest};

struct RegisteredProvider {
    client: Arc<dyn ProviderClient>,
    classifier: ErrorClassifier,
}

/// Coordinates providers, retries and health reporting.
pub struct QueryOrchestrator {
    providers: HashMap<ProviderChoice, RegisteredProvider>,
    retry: RetryController,
    health: Arc<HealthMonitor>,
    call_timeout: Duration,
}

impl QueryOrchestrator {
    /// Creates an orchestrator with no providers registered.
    pub fn new(retry: RetryController, health: Arc<HealthMonitor>) -> Self {
        Self {
            providers: HashMap::new(),
            retry,
            health,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    /// Bounds each provider call, separately from the transport timeout.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Registers a provider, builder style.
    pub fn with_provider(mut self, client: Arc<dyn ProviderClient>) -> Self {
        self.register_provider(client);
        self
    }

    /// Registers a provider, replacing any earlier client for the same choice.
    ///
    /// The provider's phrase rules are compiled into its classifier once, here.
    pub fn register_provider(&mut self, client: Arc<dyn ProviderClient>) {
        let choice = client.choice();
        let classifier = client.classifier();
        tracing::debug!(provider = %choice, rules = classifier.rules().len(), "Registered provider");
        self.providers
            .insert(choice, RegisteredProvider { client, classifier });
    }

    /// Builds an orchestrator and its health monitor from configuration.
    ///
    /// Providers without an API key stay unregistered.
    pub fn from_config(config: &OrchestratorConfig) -> GraphQueryResult<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(
            config.request_timeout,
            config.connect_timeout,
        )?);
        let health = Arc::new(HealthMonitor::from_config(config)?);
        Ok(Self::from_config_with_transport(config, transport, health))
    }

    /// Like [`from_config`](Self::from_config) with caller-supplied transport
    /// and monitor.
    pub fn from_config_with_transport(
        config: &OrchestratorConfig,
        transport: Arc<dyn HttpTransport>,
        health: Arc<HealthMonitor>,
    ) -> Self {
        let retry =
            RetryController::new(config.retry_policy).with_hooks(Arc::new(LoggingHooks::default()));
        let mut orchestrator = Self::new(retry, health).with_call_timeout(config.call_timeout);

        for choice in [ProviderChoice::OpenAi, ProviderChoice::Gemini] {
            if let Some(settings) = config.provider_settings(choice) {
                orchestrator.register_provider(create_provider(choice, settings, transport.clone()));
            }
        }
        orchestrator
    }

    /// The shared health monitor.
    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    /// The retry controller in force.
    pub fn retry_controller(&self) -> &RetryController {
        &self.retry
    }

    /// Returns true if `choice` has a registered client.
    pub fn has_provider(&self, choice: ProviderChoice) -> bool {
        self.providers.contains_key(&choice)
    }

    /// Translates `question` into a structured query with the chosen
    /// provider and model.
    ///
    /// Never returns a raw provider error. A blank `model_name` selects the
    /// provider's default model.
    #[tracing::instrument(
        skip(self, question),
        fields(provider = %provider_choice, model = model_name)
    )]
    pub async fn translate(
        &self,
        question: &str,
        provider_choice: ProviderChoice,
        model_name: &str,
    ) -> QueryResult {
        let request = QueryRequest::new(question, provider_choice, model_name);

        let result = match self.providers.get(&provider_choice) {
            Some(registered) => self.run_with_retry(registered, &request).await,
            None => {
                tracing::warn!("Provider has no API key configured");
                QueryResult::Failure {
                    final_error: ClassifiedError::new(
                        ErrorKind::InvalidCredential,
                        format!("no API key configured for provider {}", provider_choice),
                    ),
                    attempts: Vec::new(),
                }
            }
        };

        self.record_health(&result);
        match &result {
            QueryResult::Success { attempts, .. } => {
                tracing::info!(attempts = attempts.len(), "Translation succeeded");
            }
            QueryResult::Failure {
                final_error,
                attempts,
            } => {
                tracing::warn!(
                    attempts = attempts.len(),
                    kind = %final_error.kind,
                    "Translation failed"
                );
            }
        }
        result
    }

    async fn run_with_retry(&self, registered: &RegisteredProvider, request: &QueryRequest) -> QueryResult {
        let client = &registered.client;
        let call_timeout = self.call_timeout;
        let provider = request.provider_choice();

        self.retry
            .run(&registered.classifier, || async move {
                match tokio::time::timeout(call_timeout, client.generate(request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ProviderFailure::from_transport(
                        provider,
                        &TransportError::Timeout(call_timeout),
                    )),
                }
            })
            .await
    }

    fn record_health(&self, result: &QueryResult) {
        match result {
            QueryResult::Success { .. } => self.health.set_ai_ready(true),
            QueryResult::Failure { final_error, .. }
                if final_error.kind.is_configuration_problem() =>
            {
                self.health.set_ai_ready(false)
            }
            QueryResult::Failure { .. } => {}
        }
    }
}
