use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::store::{Document, DocumentStore, FieldMap, StoreError};

/// Retry behavior for remote calls.
///
/// Every attempt is independently bounded by `timeout`; the wait after a
/// failed attempt `k` (0-based) is `backoff_base * 2^k` plus a random
/// jitter in `[0, backoff_base)`. Worst-case latency of one logical call is
/// therefore `max_attempts * timeout` plus the backoff sum.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Policy with the given attempt budget and default knobs.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            timeout: Duration::from_secs(30),
            backoff_base: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Single attempt, no waiting. Used by tests and one-shot probes.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let base = self.backoff_base.as_secs_f64();
        let exponential = base * f64::from(2_u32.saturating_pow(attempt));
        let jitter = rand::rng().random::<f64>() * base;
        Duration::from_secs_f64(exponential + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Decorator that applies timeout, classification, and bounded retry to
/// every operation of an inner [`DocumentStore`].
///
/// Only transient failures (unavailable, deadline exceeded) are retried;
/// authorization and not-found failures pass through on the first attempt.
/// After the budget is spent the last transient failure is wrapped in
/// [`StoreError::RetryExhausted`]; a default value is never substituted.
#[derive(Clone)]
pub struct RetryingStore {
    inner: Arc<dyn DocumentStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    #[must_use]
    pub fn new(inner: Arc<dyn DocumentStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0_u32;
        loop {
            let outcome = match tokio::time::timeout(self.policy.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::DeadlineExceeded),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    if attempt >= self.policy.max_attempts {
                        return Err(StoreError::RetryExhausted {
                            attempts: attempt,
                            source: Box::new(err),
                        });
                    }
                    let delay = self.policy.delay_after_attempt(attempt - 1);
                    warn!(op, attempt, delay_ms = delay.as_millis() as u64, error = %err,
                        "transient store failure, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl DocumentStore for RetryingStore {
    async fn get_document(&self, path: &str) -> Result<Option<FieldMap>, StoreError> {
        self.run("get_document", || self.inner.get_document(path))
            .await
    }

    async fn set_document(
        &self,
        path: &str,
        fields: FieldMap,
        merge: bool,
    ) -> Result<(), StoreError> {
        self.run("set_document", || {
            self.inner.set_document(path, fields.clone(), merge)
        })
        .await
    }

    async fn stream_collection(&self, path: &str) -> Result<Vec<Document>, StoreError> {
        self.run("stream_collection", || self.inner.stream_collection(path))
            .await
    }

    async fn atomic_increment(
        &self,
        path: &str,
        field: &str,
        by: i64,
    ) -> Result<i64, StoreError> {
        self.run("atomic_increment", || {
            self.inner.atomic_increment(path, field, by)
        })
        .await
    }
}
