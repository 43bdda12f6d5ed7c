//! Readiness reporting for the data store and the AI provider.
//!
//! [`HealthMonitor::refresh`] runs both probes concurrently, each bounded by
//! the probe timeout, and stores the outcome. [`HealthMonitor::current`]
//! returns the stored value without waiting on anything. The orchestrator
//! also updates `ai_ready` as a side effect of each translation.

mod neo4j;

pub use neo4j::Neo4jProbe;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{OrchestratorConfig, DEFAULT_PROBE_TIMEOUT_SECS};
use crate::error::{GraphQueryResult, TransportError};
use crate::providers::{create_provider, ProviderClient};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Snapshot of system readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// The graph database answered its probe.
    pub data_store_ready: bool,
    /// The AI provider answered its probe or the last translation.
    pub ai_ready: bool,
    /// When either field was last observed; `None` until the first check.
    pub last_checked_at: Option<SystemTime>,
}

/// A single readiness check.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// `Ok` when the dependency is usable; the error text is only logged.
    async fn probe(&self) -> Result<(), String>;
}

/// Probes an AI provider with a minimal request.
pub struct ProviderProbe {
    client: Arc<dyn ProviderClient>,
    model: String,
}

impl ProviderProbe {
    /// Creates a probe pinging `model` through `client`.
    pub fn new(client: Arc<dyn ProviderClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ReadinessProbe for ProviderProbe {
    async fn probe(&self) -> Result<(), String> {
        self.client
            .ping(&self.model)
            .await
            .map_err(|failure| failure.to_string())
    }
}

fn lock(status: &Mutex<HealthStatus>) -> MutexGuard<'_, HealthStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the latest [`HealthStatus`] and the probes that refresh it.
pub struct HealthMonitor {
    status: Mutex<HealthStatus>,
    data_store_probe: Option<Arc<dyn ReadinessProbe>>,
    ai_probe: Option<Arc<dyn ReadinessProbe>>,
    probe_timeout: Duration,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS))
    }
}

impl HealthMonitor {
    /// Creates a monitor with no probes. Unprobed fields report `false`.
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            status: Mutex::new(HealthStatus::default()),
            data_store_probe: None,
            ai_probe: None,
            probe_timeout,
        }
    }

    /// Sets the data store probe.
    pub fn with_data_store_probe(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.data_store_probe = Some(probe);
        self
    }

    /// Sets the AI provider probe.
    pub fn with_ai_probe(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.ai_probe = Some(probe);
        self
    }

    /// Wires probes from configuration using a reqwest transport bounded by
    /// the probe timeout.
    pub fn from_config(config: &OrchestratorConfig) -> GraphQueryResult<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(
            config.probe_timeout,
            config.connect_timeout,
        )?);
        Ok(Self::from_config_with_transport(config, transport))
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied transport.
    pub fn from_config_with_transport(
        config: &OrchestratorConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let mut monitor = Self::new(config.probe_timeout);

        if let Some(settings) = config.provider_settings(config.default_provider) {
            let client = create_provider(config.default_provider, settings, transport.clone());
            monitor = monitor.with_ai_probe(Arc::new(ProviderProbe::new(
                client,
                config.probe_model(),
            )));
        }
        if let Some(data_store) = &config.data_store {
            monitor =
                monitor.with_data_store_probe(Arc::new(Neo4jProbe::new(transport, data_store.clone())));
        }
        monitor
    }

    /// The last stored status. Never waits on I/O.
    pub fn current(&self) -> HealthStatus {
        *lock(&self.status)
    }

    /// Probes both dependencies concurrently and stores the result.
    ///
    /// Probe errors and timeouts become `false`; this never fails.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> HealthStatus {
        let (data_store_ready, ai_ready) = futures::join!(
            run_probe("data_store", self.data_store_probe.as_deref(), self.probe_timeout),
            run_probe("ai", self.ai_probe.as_deref(), self.probe_timeout),
        );

        let status = HealthStatus {
            data_store_ready,
            ai_ready,
            last_checked_at: Some(SystemTime::now()),
        };
        *lock(&self.status) = status;
        tracing::info!(data_store_ready, ai_ready, "Health refreshed");
        status
    }

    /// Records an AI readiness observation made outside [`refresh`](Self::refresh).
    pub fn set_ai_ready(&self, ready: bool) {
        let mut status = lock(&self.status);
        if status.ai_ready != ready {
            tracing::info!(ai_ready = ready, "AI readiness changed");
        }
        status.ai_ready = ready;
        status.last_checked_at = Some(SystemTime::now());
    }
}

async fn run_probe(name: &str, probe: Option<&dyn ReadinessProbe>, timeout: Duration) -> bool {
    let Some(probe) = probe else {
        return false;
    };
    match tokio::time::timeout(timeout, probe.probe()).await {
        Ok(Ok(())) => true,
        Ok(Err(reason)) => {
            tracing::warn!(probe = name, %reason, "Readiness probe failed");
            false
        }
        Err(_) => {
            let err = TransportError::Timeout(timeout);
            tracing::warn!(probe = name, error = %err, "Readiness probe timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockProbe, MockProviderClient};
    use crate::types::ProviderChoice;

    #[test]
    fn test_initial_status_is_unchecked() {
        let monitor = HealthMonitor::default();
        assert_eq!(monitor.current(), HealthStatus::default());
        assert!(monitor.current().last_checked_at.is_none());
    }

    #[tokio::test]
    async fn test_refresh_records_both_probes() {
        let monitor = HealthMonitor::new(Duration::from_secs(1))
            .with_data_store_probe(Arc::new(MockProbe::ready()))
            .with_ai_probe(Arc::new(MockProbe::unready()));

        let status = monitor.refresh().await;

        assert!(status.data_store_ready);
        assert!(!status.ai_ready);
        assert!(status.last_checked_at.is_some());
        assert_eq!(monitor.current(), status);
    }

    #[tokio::test]
    async fn test_missing_probe_reports_not_ready() {
        let monitor =
            HealthMonitor::new(Duration::from_secs(1)).with_ai_probe(Arc::new(MockProbe::ready()));

        let status = monitor.refresh().await;

        assert!(!status.data_store_ready);
        assert!(status.ai_ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_times_out_as_not_ready() {
        let monitor = HealthMonitor::new(Duration::from_secs(2))
            .with_data_store_probe(Arc::new(MockProbe::ready().with_latency(Duration::from_secs(30))))
            .with_ai_probe(Arc::new(MockProbe::ready()));

        let status = monitor.refresh().await;

        assert!(!status.data_store_ready);
        assert!(status.ai_ready);
    }

    #[tokio::test]
    async fn test_provider_probe_uses_ping() {
        let ok = ProviderProbe::new(Arc::new(MockProviderClient::new(ProviderChoice::OpenAi)), "gpt-4");
        assert!(ok.probe().await.is_ok());

        let failing = ProviderProbe::new(
            Arc::new(MockProviderClient::new(ProviderChoice::Gemini).failing_ping("API key not valid")),
            "gemini-1.5-flash",
        );
        let reason = failing.probe().await.unwrap_err();
        assert!(reason.contains("API key not valid"));
    }

    #[test]
    fn test_set_ai_ready_stamps_time() {
        let monitor = HealthMonitor::default();
        monitor.set_ai_ready(true);
        let status = monitor.current();
        assert!(status.ai_ready);
        assert!(!status.data_store_ready);
        assert!(status.last_checked_at.is_some());
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let json = serde_json::to_value(HealthStatus::default()).unwrap();
        assert_eq!(json["dataStoreReady"], false);
        assert_eq!(json["aiReady"], false);
        assert!(json["lastCheckedAt"].is_null());
    }
}
