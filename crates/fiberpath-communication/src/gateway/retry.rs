//! Bounded retry with exponential backoff.
//!
//! Attempts run strictly one after another: attempt N+1 starts only after
//! attempt N failed, the failure was classified as retryable and the
//! backoff delay elapsed.

use super::classify::{classify, ErrorClass};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Decides from a failure message whether another attempt may help
pub type Classifier = fn(&str) -> ErrorClass;

/// Retry settings for one kind of call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Factor applied to the delay after every retry
    pub backoff_multiplier: f64,
    /// Failure classifier, [`classify`] unless replaced
    pub classifier: Classifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            classifier: classify,
        }
    }
}

impl PartialEq for RetryPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.max_attempts == other.max_attempts
            && self.base_delay == other.base_delay
            && self.backoff_multiplier == other.backoff_multiplier
            && std::ptr::fn_addr_eq(self.classifier, other.classifier)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_multiplier,
            classifier: classify,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Same backoff with a different attempt ceiling
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Same backoff with a different failure classifier
    pub fn with_classifier(self, classifier: Classifier) -> Self {
        Self { classifier, ..self }
    }

    /// Delays slept between consecutive attempts when every attempt fails
    ///
    /// For `max_attempts = 3` this is `[d, d*m]`.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut delay = self.base_delay;
        for _ in 1..self.attempts() {
            delays.push(delay);
            delay = self.next_delay(delay);
        }
        delays
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier)
            .unwrap_or(delay)
    }
}

/// Run `call` under `policy`
///
/// Failures are classified by the policy's classifier from their rendered
/// message. A non-retryable failure, or the failure of the last allowed
/// attempt, is returned as is.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut delay = policy.base_delay;
    let mut attempt = 1;

    loop {
        let err = match call().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let class = (policy.classifier)(&err.to_string());
        if !class.is_retryable() {
            tracing::debug!(operation, attempt, ?class, "Not retrying: {}", err);
            return Err(err);
        }
        if attempt >= max_attempts {
            tracing::warn!(operation, attempt, "Giving up: {}", err);
            return Err(err);
        }

        tracing::warn!(
            operation,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Attempt failed, retrying: {}",
            err
        );
        tokio::time::sleep(delay).await;
        delay = policy.next_delay(delay);
        attempt += 1;
    }
}

/// Boxed future returned by [`with_retry`]
pub type RetryFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Wrap a one-argument async call so every invocation goes through [`retry`]
///
/// The wrapper takes the same argument and yields the same result as
/// `call`.
pub fn with_retry<A, T, E, F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    call: F,
) -> impl Fn(A) -> RetryFuture<T, E>
where
    A: Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(A) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    move |args: A| {
        let call = call.clone();
        Box::pin(async move { retry(&policy, operation, || call(args.clone())).await })
    }
}
