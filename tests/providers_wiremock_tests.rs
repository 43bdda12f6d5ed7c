//! HTTP-level tests for the provider clients against a local mock server.

use integrations_graph_query::{
    AttemptOutcome, ErrorKind, GeminiProvider, HealthMonitor, HttpTransport, OpenAiProvider, OrchestratorConfig,
    ProviderChoice, ProviderClient, QueryOrchestrator, QueryRequest, ReqwestTransport,
    RetryPolicy,
};
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> Arc<dyn HttpTransport> {
    Arc::new(ReqwestTransport::new(Duration::from_secs(5), Duration::from_secs(2)).unwrap())
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-4",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_openai_generate_against_server() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            r#"{"response_type": "cypher", "cypher_query": "MATCH (p:Project) RETURN p.name", "query_type": "list"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(
        transport(),
        SecretString::new("sk-test".into()),
        Url::parse(&server.uri()).unwrap(),
    );
    let request = QueryRequest::new("List all projects", ProviderChoice::OpenAi, "gpt-4");

    // Act
    let query = provider.generate(&request).await.unwrap();

    // Assert
    assert_eq!(query.cypher(), Some("MATCH (p:Project) RETURN p.name"));
}

#[tokio::test]
async fn test_openai_quota_error_classifies_as_quota() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "message": "You exceeded your current quota, please check your plan and billing details.",
                "type": "insufficient_quota",
                "code": "insufficient_quota"
            }
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(
        transport(),
        SecretString::new("sk-test".into()),
        Url::parse(&server.uri()).unwrap(),
    );
    let request = QueryRequest::new("q", ProviderChoice::OpenAi, "gpt-4");

    // Act
    let failure = provider.generate(&request).await.unwrap_err();
    let classified = provider.classifier().classify_failure(&failure);

    // Assert
    assert_eq!(failure.status, Some(429));
    assert_eq!(classified.kind, ErrorKind::QuotaExceeded);
    assert!(classified.retryable);
}

#[tokio::test]
async fn test_gemini_generate_against_server() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "g-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "{\"response_type\": \"error\", \"message\": \"I can only answer questions about the organization.\"}"}]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(
        transport(),
        SecretString::new("g-test".into()),
        Url::parse(&server.uri()).unwrap(),
    );
    let request = QueryRequest::new("What is the weather?", ProviderChoice::Gemini, "");

    // Act
    let query = provider.generate(&request).await.unwrap();

    // Assert
    assert_eq!(query.cypher(), None);
    assert_eq!(
        query.text(),
        "I can only answer questions about the organization."
    );
}

#[tokio::test]
async fn test_gemini_invalid_key_is_not_retried() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = OrchestratorConfig::builder()
        .gemini_api_key(SecretString::new("bad-key".into()))
        .gemini_base_url(&server.uri())
        .unwrap()
        .retry_policy(RetryPolicy::new(3, Duration::ZERO).unwrap())
        .build()
        .unwrap();
    let orchestrator = QueryOrchestrator::from_config_with_transport(
        &config,
        transport(),
        Arc::new(HealthMonitor::default()),
    );

    // Act
    let result = orchestrator
        .translate("Who works on Apollo?", ProviderChoice::Gemini, "gemini-1.5-flash")
        .await;

    // Assert
    let error = result.final_error().unwrap();
    assert_eq!(error.kind, ErrorKind::InvalidCredential);
    assert_eq!(result.attempts().len(), 1);
    assert!(!orchestrator.has_provider(ProviderChoice::OpenAi));
}

#[tokio::test]
async fn test_orchestrator_retries_rate_limit_over_http() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "message": "Rate limit reached for gpt-4 on requests per min. Please try again in 1s.",
                "type": "requests",
                "code": "rate_limit_exceeded"
            }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "```json\n{\"response_type\": \"cypher\", \"cypher_query\": \"MATCH (e:Employee) RETURN count(e)\"}\n```",
        )))
        .mount(&server)
        .await;

    let config = OrchestratorConfig::builder()
        .openai_api_key(SecretString::new("sk-test".into()))
        .openai_base_url(&server.uri())
        .unwrap()
        .max_attempts(3)
        .retry_delay(Duration::from_millis(10))
        .build()
        .unwrap();
    let orchestrator = QueryOrchestrator::from_config_with_transport(
        &config,
        transport(),
        Arc::new(HealthMonitor::default()),
    );

    // Act
    let result = orchestrator
        .translate("How many employees?", ProviderChoice::OpenAi, "gpt-4")
        .await;

    // Assert
    assert!(result.is_success());
    assert_eq!(result.attempts().len(), 2);
    assert_eq!(
        result.structured_query().unwrap().cypher(),
        Some("MATCH (e:Employee) RETURN count(e)")
    );
    assert!(orchestrator.health().current().ai_ready);
}

#[tokio::test]
async fn test_openai_transient_server_errors_are_retried() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {
                "message": "The engine is currently overloaded, please try again later",
                "type": "server_error"
            }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            r#"{"response_type": "cypher", "cypher_query": "RETURN 1"}"#,
        )))
        .mount(&server)
        .await;

    let config = OrchestratorConfig::builder()
        .openai_api_key(SecretString::new("sk-test".into()))
        .openai_base_url(&server.uri())
        .unwrap()
        .max_attempts(3)
        .retry_delay(Duration::from_millis(10))
        .build()
        .unwrap();
    let orchestrator = QueryOrchestrator::from_config_with_transport(
        &config,
        transport(),
        Arc::new(HealthMonitor::default()),
    );

    // Act
    let result = orchestrator
        .translate("q", ProviderChoice::OpenAi, "gpt-4")
        .await;

    // Assert
    assert!(result.is_success());
    let kinds: Vec<ErrorKind> = result
        .attempts()
        .iter()
        .filter_map(|a| match &a.outcome {
            AttemptOutcome::Failed(error) => Some(error.kind),
            AttemptOutcome::Succeeded => None,
        })
        .collect();
    assert_eq!(kinds, vec![ErrorKind::NetworkFailure, ErrorKind::RateLimited]);
}
