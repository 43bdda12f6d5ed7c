//! Resilience layer: bounded fixed-delay retry over classified failures.
//!
//! The [`RetryController`] runs an operation, classifies each failure with an
//! [`ErrorClassifier`](crate::error::ErrorClassifier) and decides whether to
//! wait and try again. Waits go through a [`Sleeper`] so they are async,
//! cancellable by dropping the future, and replaceable in tests.
//! [`RetryHooks`] observe each step so callers can show progress.

mod hooks;
mod retry;
mod sleeper;

pub use hooks::{AttemptContext, LoggingHooks, NoOpHooks, RetryHooks};
pub use retry::{
    AttemptOutcome, AttemptRecord, QueryResult, RetryController, RetryPolicy,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
pub use sleeper::{Sleeper, TokioSleeper};
