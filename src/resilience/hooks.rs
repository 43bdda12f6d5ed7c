//! Observers for retry progress.

use crate::error::ClassifiedError;
use async_trait::async_trait;
use std::time::Duration;

/// Position of an attempt within the retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptContext {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Attempt budget of the policy.
    pub max_attempts: u32,
}

impl AttemptContext {
    /// Attempts still available after this one.
    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }
}

/// Observer for retry progress.
///
/// `on_retry` means "still retrying"; `on_give_up` means the call is terminal.
#[async_trait]
pub trait RetryHooks: Send + Sync {
    /// Called after every failed attempt, before the retry decision.
    async fn on_attempt_failed(&self, _ctx: &AttemptContext, _error: &ClassifiedError) {}
    /// Called before waiting `delay` for the next attempt.
    async fn on_retry(&self, _ctx: &AttemptContext, _delay: Duration) {}
    /// Called once when the call ends in failure.
    async fn on_give_up(&self, _ctx: &AttemptContext, _error: &ClassifiedError) {}
}

/// Hooks that do nothing.
pub struct NoOpHooks;

#[async_trait]
impl RetryHooks for NoOpHooks {}

/// Hooks that report progress through `tracing`.
pub struct LoggingHooks {
    /// Log each failed attempt at warn level.
    pub log_failures: bool,
    /// Log each scheduled retry at info level.
    pub log_retries: bool,
}

impl Default for LoggingHooks {
    fn default() -> Self {
        Self {
            log_failures: true,
            log_retries: true,
        }
    }
}

#[async_trait]
impl RetryHooks for LoggingHooks {
    async fn on_attempt_failed(&self, ctx: &AttemptContext, error: &ClassifiedError) {
        if self.log_failures {
            tracing::warn!(
                attempt = ctx.attempt,
                max_attempts = ctx.max_attempts,
                kind = %error.kind,
                retryable = error.retryable,
                "Provider attempt failed: {}",
                error.raw_message
            );
        }
    }

    async fn on_retry(&self, ctx: &AttemptContext, delay: Duration) {
        if self.log_retries {
            tracing::info!(
                attempt = ctx.attempt + 1,
                max_attempts = ctx.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Retrying provider call"
            );
        }
    }

    async fn on_give_up(&self, ctx: &AttemptContext, error: &ClassifiedError) {
        tracing::error!(
            attempts = ctx.attempt,
            kind = %error.kind,
            "Giving up on provider call: {}",
            error.remediation
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_remaining_attempts() {
        let ctx = AttemptContext {
            attempt: 1,
            max_attempts: 3,
        };
        assert_eq!(ctx.remaining(), 2);

        let last = AttemptContext {
            attempt: 3,
            max_attempts: 3,
        };
        assert_eq!(last.remaining(), 0);
    }

    #[tokio::test]
    async fn test_noop_hooks() {
        let hooks = NoOpHooks;
        let ctx = AttemptContext {
            attempt: 1,
            max_attempts: 3,
        };
        let error = ClassifiedError::new(ErrorKind::RateLimited, "Rate limit exceeded");
        hooks.on_attempt_failed(&ctx, &error).await;
        hooks.on_retry(&ctx, Duration::from_secs(3)).await;
        hooks.on_give_up(&ctx, &error).await;
    }

    #[tokio::test]
    async fn test_logging_hooks() {
        let hooks = LoggingHooks::default();
        let ctx = AttemptContext {
            attempt: 2,
            max_attempts: 3,
        };
        let error = ClassifiedError::new(ErrorKind::NetworkFailure, "connection reset");
        hooks.on_attempt_failed(&ctx, &error).await;
        hooks.on_retry(&ctx, Duration::from_millis(10)).await;
        hooks.on_give_up(&ctx, &error).await;
    }
}
