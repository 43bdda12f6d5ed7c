//! Bounded fixed-delay retry for provider calls.
//!
//! The controller makes up to `max_attempts` calls. A failure classified as
//! non-retryable ends the loop at once, whatever budget is left. Between
//! attempts it waits `delay_between_attempts`; there is no exponential growth
//! because provider rate-limit windows are short and fixed.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use super::hooks::{AttemptContext, NoOpHooks, RetryHooks};
use super::sleeper::{Sleeper, TokioSleeper};
use crate::error::{ClassifiedError, ConfigurationError, ErrorClassifier, ProviderFailure};
use crate::types::StructuredQuery;

/// Default number of attempts (first try plus two retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default wait between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Retry budget for one orchestrated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay_between_attempts: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_between_attempts: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` must be at least 1.
    pub fn new(max_attempts: u32, delay_between_attempts: Duration) -> Result<Self, ConfigurationError> {
        if max_attempts == 0 {
            return Err(ConfigurationError::InvalidRetryPolicy {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        Ok(Self {
            max_attempts,
            delay_between_attempts,
        })
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fixed wait between attempts.
    pub fn delay_between_attempts(&self) -> Duration {
        self.delay_between_attempts
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The provider returned a structured query.
    Succeeded,
    /// The attempt failed with this classified error.
    Failed(ClassifiedError),
}

/// Diagnostic record of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt_number: u32,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
    /// When the attempt finished.
    pub timestamp: SystemTime,
}

impl AttemptRecord {
    fn new(attempt_number: u32, outcome: AttemptOutcome) -> Self {
        Self {
            attempt_number,
            outcome,
            timestamp: SystemTime::now(),
        }
    }

    /// Returns true if this attempt succeeded.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Succeeded)
    }
}

/// Terminal value of an orchestrated call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QueryResult<T = StructuredQuery> {
    /// The provider produced a structured query.
    Success {
        structured_query: T,
        attempts: Vec<AttemptRecord>,
    },
    /// The call gave up.
    Failure {
        final_error: ClassifiedError,
        attempts: Vec<AttemptRecord>,
    },
}

impl<T> QueryResult<T> {
    /// Returns true for [`QueryResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success { .. })
    }

    /// Attempts made, in order.
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            QueryResult::Success { attempts, .. } | QueryResult::Failure { attempts, .. } => {
                attempts
            }
        }
    }

    /// The structured query, on success.
    pub fn structured_query(&self) -> Option<&T> {
        match self {
            QueryResult::Success {
                structured_query, ..
            } => Some(structured_query),
            QueryResult::Failure { .. } => None,
        }
    }

    /// The final classified error, on failure.
    pub fn final_error(&self) -> Option<&ClassifiedError> {
        match self {
            QueryResult::Success { .. } => None,
            QueryResult::Failure { final_error, .. } => Some(final_error),
        }
    }

    /// Returns true if this is a failure that used the whole retry budget,
    /// as opposed to one cut short by a non-retryable error.
    pub fn exhausted(&self, policy: &RetryPolicy) -> bool {
        match self {
            QueryResult::Failure { attempts, .. } => attempts.len() >= policy.max_attempts() as usize,
            QueryResult::Success { .. } => false,
        }
    }

    /// Converts into a plain `Result`, dropping the attempt log.
    pub fn into_result(self) -> Result<T, ClassifiedError> {
        match self {
            QueryResult::Success {
                structured_query, ..
            } => Ok(structured_query),
            QueryResult::Failure { final_error, .. } => Err(final_error),
        }
    }
}

/// Runs operations under a [`RetryPolicy`].
pub struct RetryController {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    hooks: Arc<dyn RetryHooks>,
}

impl RetryController {
    /// Creates a controller using the tokio timer and no hooks.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
            hooks: Arc::new(NoOpHooks),
        }
    }

    /// Creates a controller with the default policy.
    pub fn with_defaults() -> Self {
        Self::new(RetryPolicy::default())
    }

    /// Replaces the sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replaces the hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn RetryHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// The policy in force.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// Failures are classified with `classifier`. The returned
    /// [`QueryResult`] never holds more than `max_attempts` records.
    pub async fn run<F, Fut, T>(&self, classifier: &ErrorClassifier, mut operation: F) -> QueryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderFailure>>,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempts = Vec::with_capacity(max_attempts as usize);
        let mut attempt = 1;

        loop {
            let ctx = AttemptContext {
                attempt,
                max_attempts,
            };

            let failure = match operation().await {
                Ok(structured_query) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Provider call succeeded after retry");
                    }
                    attempts.push(AttemptRecord::new(attempt, AttemptOutcome::Succeeded));
                    return QueryResult::Success {
                        structured_query,
                        attempts,
                    };
                }
                Err(failure) => failure,
            };

            let error = classifier.classify_failure(&failure);
            attempts.push(AttemptRecord::new(
                attempt,
                AttemptOutcome::Failed(error.clone()),
            ));
            self.hooks.on_attempt_failed(&ctx, &error).await;

            if !error.retryable || attempt >= max_attempts {
                tracing::debug!(
                    attempt,
                    kind = %error.kind,
                    retryable = error.retryable,
                    "Stopping retry loop"
                );
                self.hooks.on_give_up(&ctx, &error).await;
                return QueryResult::Failure {
                    final_error: error,
                    attempts,
                };
            }

            let delay = self.policy.delay_between_attempts;
            self.hooks.on_retry(&ctx, delay).await;
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
