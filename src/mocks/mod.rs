//! Mock implementations for testing.
//!
//! These stand in for the network-facing pieces (HTTP transport, providers,
//! readiness probes) and for the retry timer, so orchestration logic can be
//! exercised deterministically.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{ClassifiedError, PhraseRule, ProviderFailure, TransportError};
use crate::health::ReadinessProbe;
use crate::providers::ProviderClient;
use crate::resilience::{AttemptContext, RetryHooks, Sleeper};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::{ProviderChoice, QueryRequest, StructuredQuery};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock HTTP transport that replays enqueued responses and records requests.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpTransport {
    /// Create a new mock HTTP transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a response to be returned by the next request.
    pub fn enqueue_response(&self, response: Result<HttpResponse, TransportError>) {
        lock(&self.responses).push_back(response);
    }

    /// Enqueue a JSON response with the given status code and body.
    pub fn enqueue_json_response(&self, status: u16, body: &str) {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        self.enqueue_response(Ok(HttpResponse {
            status,
            headers,
            body: Bytes::from(body.to_string()),
        }));
    }

    /// Enqueue a transport error.
    pub fn enqueue_error(&self, error: TransportError) {
        self.enqueue_response(Err(error));
    }

    /// All requests made so far.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Verify that exactly `expected` requests were made.
    pub fn verify_request_count(&self, expected: usize) {
        let actual = self.request_count();
        assert_eq!(actual, expected, "Expected {} requests, but got {}", expected, actual);
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request);
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("No mock response enqueued".to_string())))
    }
}

/// Scripted provider client.
///
/// Each `generate` call pops the next scripted outcome. When the script runs
/// out, the fallback outcome (if set) is repeated; otherwise the call fails
/// with an unclassifiable message.
pub struct MockProviderClient {
    choice: ProviderChoice,
    script: Mutex<VecDeque<Result<StructuredQuery, ProviderFailure>>>,
    fallback: Mutex<Option<Result<StructuredQuery, ProviderFailure>>>,
    ping_result: Mutex<Result<(), ProviderFailure>>,
    rules: Vec<PhraseRule>,
    latency: Option<Duration>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl MockProviderClient {
    /// Creates a mock for `choice` with an empty script and a passing ping.
    pub fn new(choice: ProviderChoice) -> Self {
        Self {
            choice,
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            ping_result: Mutex::new(Ok(())),
            rules: Vec::new(),
            latency: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Scripts a successful reply.
    pub fn then_succeed(self, query: StructuredQuery) -> Self {
        lock(&self.script).push_back(Ok(query));
        self
    }

    /// Scripts a failure with the given native error text.
    pub fn then_fail(self, message: &str) -> Self {
        let failure = ProviderFailure::new(self.choice, message);
        lock(&self.script).push_back(Err(failure));
        self
    }

    /// Repeats this failure once the script is exhausted.
    pub fn always_fail(self, message: &str) -> Self {
        let failure = ProviderFailure::new(self.choice, message);
        *lock(&self.fallback) = Some(Err(failure));
        self
    }

    /// Makes `ping` fail with the given text.
    pub fn failing_ping(self, message: &str) -> Self {
        let failure = ProviderFailure::new(self.choice, message);
        *lock(&self.ping_result) = Err(failure);
        self
    }

    /// Sets the provider phrase rules.
    pub fn with_phrase_rules(mut self, rules: Vec<PhraseRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `generate` calls made.
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Requests received by `generate`.
    pub fn requests(&self) -> Vec<QueryRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ProviderClient for MockProviderClient {
    fn choice(&self) -> ProviderChoice {
        self.choice
    }

    fn phrase_rules(&self) -> Vec<PhraseRule> {
        self.rules.clone()
    }

    async fn generate(&self, request: &QueryRequest) -> Result<StructuredQuery, ProviderFailure> {
        lock(&self.requests).push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = lock(&self.script).pop_front();
        match next {
            Some(outcome) => outcome,
            None => lock(&self.fallback).clone().unwrap_or_else(|| {
                Err(ProviderFailure::new(self.choice, "mock provider script exhausted"))
            }),
        }
    }

    async fn ping(&self, _model: &str) -> Result<(), ProviderFailure> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        lock(&self.ping_result).clone()
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Create a new recording sleeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.delays).clone()
    }

    /// Number of times `sleep` was called.
    pub fn call_count(&self) -> usize {
        lock(&self.delays).len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.delays).push(duration);
    }
}

/// Readiness probe with a fixed answer.
pub struct MockProbe {
    ready: bool,
    latency: Option<Duration>,
    calls: Mutex<usize>,
}

impl MockProbe {
    /// A probe reporting ready.
    pub fn ready() -> Self {
        Self::with_answer(true)
    }

    /// A probe reporting not ready.
    pub fn unready() -> Self {
        Self::with_answer(false)
    }

    fn with_answer(ready: bool) -> Self {
        Self {
            ready,
            latency: None,
            calls: Mutex::new(0),
        }
    }

    /// Delays every probe by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of probes run.
    pub fn call_count(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl ReadinessProbe for MockProbe {
    async fn probe(&self) -> Result<(), String> {
        *lock(&self.calls) += 1;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.ready {
            Ok(())
        } else {
            Err("mock probe reports not ready".to_string())
        }
    }
}

/// Event captured by [`RecordingHooks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    /// `on_attempt_failed` was called.
    AttemptFailed {
        /// Attempt that failed.
        attempt: u32,
        /// Its classification.
        error: ClassifiedError,
    },
    /// `on_retry` was called.
    Retry {
        /// Attempt that just failed.
        attempt: u32,
        /// Wait before the next attempt.
        delay: Duration,
    },
    /// `on_give_up` was called.
    GaveUp {
        /// Final attempt.
        attempt: u32,
        /// Final classification.
        error: ClassifiedError,
    },
}

/// Retry hooks that record every callback.
#[derive(Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
}

impl RecordingHooks {
    /// Create a new recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    pub fn events(&self) -> Vec<HookEvent> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl RetryHooks for RecordingHooks {
    async fn on_attempt_failed(&self, ctx: &AttemptContext, error: &ClassifiedError) {
        lock(&self.events).push(HookEvent::AttemptFailed {
            attempt: ctx.attempt,
            error: error.clone(),
        });
    }

    async fn on_retry(&self, ctx: &AttemptContext, delay: Duration) {
        lock(&self.events).push(HookEvent::Retry {
            attempt: ctx.attempt,
            delay,
        });
    }

    async fn on_give_up(&self, ctx: &AttemptContext, error: &ClassifiedError) {
        lock(&self.events).push(HookEvent::GaveUp {
            attempt: ctx.attempt,
            error: error.clone(),
        });
    }
}
