//! # Graph Query Orchestration
//!
//! Turns natural-language questions about organizational data into Cypher
//! using interchangeable AI providers, with classified failures and bounded
//! retry.
//!
//! ## Features
//!
//! - OpenAI and Google Gemini providers behind one [`ProviderClient`] trait
//! - Ordered phrase-rule classification of provider errors into [`ErrorKind`]s
//!   with user-facing remediation text
//! - Fixed-delay retry that stops early on non-retryable failures
//! - Readiness reporting for the AI provider and the Neo4j data store
//! - Secure credential handling with `SecretString`
//! - Mock implementations for testing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_graph_query::{OrchestratorConfig, ProviderChoice, QueryOrchestrator, QueryResult};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OrchestratorConfig::from_env()?;
//!     let orchestrator = QueryOrchestrator::from_config(&config)?;
//!
//!     match orchestrator
//!         .translate("How many employees are in Engineering?", ProviderChoice::OpenAi, "gpt-4")
//!         .await
//!     {
//!         QueryResult::Success { structured_query, .. } => {
//!             println!("{}", structured_query.text());
//!         }
//!         QueryResult::Failure { final_error, .. } => {
//!             eprintln!("{}", final_error.remediation);
//!         }
//!     }
//!
//!     let health = orchestrator.health().refresh().await;
//!     println!("data store ready: {}", health.data_store_ready);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `orchestrator` - `translate` entry point
//! - `providers` - provider clients and prompt handling
//! - `resilience` - retry policy, controller and hooks
//! - `error` - error types, failure taxonomy and classifier
//! - `health` - readiness probes and status
//! - `config` - configuration types and builder
//! - `auth` - request credentials
//! - `transport` - HTTP transport layer
//! - `types` - request and structured query types

pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod orchestrator;
pub mod providers;
pub mod resilience;
pub mod transport;
pub mod types;

// Development/testing module - always available for integration tests
pub mod mocks;

pub use auth::{ApiKeyAuthManager, ApiKeyScheme, AuthManager, BasicAuthManager};
pub use config::{DataStoreConfig, OrchestratorConfig, OrchestratorConfigBuilder, ProviderSettings};
pub use error::{
    base_rules, ClassifiedError, ConfigurationError, ErrorClassifier, ErrorKind, GraphQueryError,
    GraphQueryResult, PhraseRule, ProviderFailure, TransportError,
};
pub use health::{HealthMonitor, HealthStatus, Neo4jProbe, ProviderProbe, ReadinessProbe};
pub use orchestrator::QueryOrchestrator;
pub use providers::{create_provider, GeminiProvider, OpenAiProvider, ProviderClient};
pub use resilience::{
    AttemptOutcome, AttemptRecord, LoggingHooks, NoOpHooks, QueryResult, RetryController,
    RetryHooks, RetryPolicy, Sleeper, TokioSleeper,
};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{CypherQuery, ProviderChoice, QueryRequest, StructuredQuery};
