//! Retry policy: exponential backoff with jitter for transient failures,
//! honoring 429/503 and the idempotency of the request being retried.

use crate::error::Error;
use rand::Rng;
use std::time::Duration;

/// Whether a given HTTP method is safe to retry without caller
/// confirmation. `POST` is retried too, but only for the idempotent
/// collection operations this client issues as POST (upsert/query by id
/// set, never a blind "create"); callers that need stricter semantics can
/// build a policy with `retry_post: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// This request is always safe to retry (GET, idempotent PUT/DELETE).
    Safe,
    /// This request is only safe to retry because the operation is
    /// idempotent by construction (e.g. upsert-by-id).
    IdempotentByConstruction,
    /// This request must not be retried automatically (e.g. a bare create
    /// that would otherwise conflict on retry).
    Unsafe,
}

/// An exponential backoff policy with jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(200), max_delay: Duration::from_secs(10) }
    }
}

impl RetryPolicy {
    /// A policy that never retries — useful for callers who want to
    /// implement their own retry loop.
    pub fn none() -> Self {
        RetryPolicy { max_attempts: 1, base_delay: Duration::ZERO, max_delay: Duration::ZERO }
    }

    /// Build a policy with explicit bounds.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        RetryPolicy { max_attempts: max_attempts.max(1), base_delay, max_delay }
    }

    /// Maximum number of attempts (including the first), at least 1.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether `error`, observed on `attempt` (1-indexed), should trigger
    /// another attempt given `idempotency`.
    ///
    /// `Unsafe` (e.g. `Add`) still retries `Error::Transport` — the request
    /// never reached the server, so there is no risk of a duplicate side
    /// effect — but never retries an HTTP-response-derived error like
    /// `Unavailable` or `RateLimited`, where the server may already have
    /// applied the write.
    pub fn should_retry(&self, error: &Error, attempt: u32, idempotency: Idempotency) -> bool {
        if idempotency == Idempotency::Unsafe && !matches!(error, Error::Transport(_)) {
            return false;
        }
        if attempt >= self.max_attempts {
            return false;
        }
        error.is_retryable()
    }

    /// The delay to sleep before `attempt` (1-indexed, the attempt about
    /// to be made), honoring a server-supplied `Retry-After` when present.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(retry_after) = retry_after {
            return retry_after.min(self.max_delay);
        }
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32.wrapping_shl(exponent).max(1));
        let capped = backoff.min(self.max_delay);
        let jitter_fraction: f64 = rand::rng().random_range(0.5..1.0);
        Duration::from_secs_f64(capped.as_secs_f64() * jitter_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_idempotency_blocks_http_derived_errors() {
        let policy = RetryPolicy::default();
        let err = Error::Unavailable("down".to_string());
        assert!(!policy.should_retry(&err, 1, Idempotency::Unsafe));
    }

    #[test]
    fn unsafe_idempotency_still_retries_transport_level_errors() {
        let policy = RetryPolicy::default();
        let builder_err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err = Error::Transport(builder_err);
        assert!(policy.should_retry(&err, 1, Idempotency::Unsafe));
    }

    #[test]
    fn exhausted_attempts_stop_retrying() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10), Duration::from_secs(1));
        let err = Error::Unavailable("down".to_string());
        assert!(policy.should_retry(&err, 1, Idempotency::Safe));
        assert!(!policy.should_retry(&err, 2, Idempotency::Safe));
    }

    #[test]
    fn non_retryable_errors_are_never_retried() {
        let policy = RetryPolicy::default();
        let err = Error::NotFound("x".to_string());
        assert!(!policy.should_retry(&err, 1, Idempotency::Safe));
    }

    #[test]
    fn retry_after_is_honored_and_capped() {
        let policy = RetryPolicy::new(3, Duration::from_millis(200), Duration::from_secs(1));
        let delay = policy.delay_for(1, Some(Duration::from_secs(30)));
        assert_eq!(delay, Duration::from_secs(1));
    }
}
