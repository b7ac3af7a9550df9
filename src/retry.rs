//! Retry with exponential backoff for backend and Bot API calls
//!
//! A [`RetryPolicy`] is applied explicitly at each call site; the business
//! logic it wraps stays unaware of retries.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::Result;

/// Retry policy for outbound HTTP calls
///
/// Controls how many attempts a failing call gets and how long to wait
/// between them using exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Growth factor applied per attempt
    pub multiplier: f64,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Run `call` until it succeeds, fails with a non-transient error, or
    /// the attempts are used up
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `call`
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = delay_for_attempt(self, attempt, None);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Determine whether an HTTP status and response body indicate a recoverable error.
///
/// Recoverable errors are worth retrying: rate limits (429), server errors (5xx),
/// and certain transient network-level failures surfaced in the body text.
#[must_use]
pub fn is_recoverable(status: u16, body: &str) -> bool {
    if status == 429 || (500..600).contains(&status) {
        return true;
    }

    let lower = body.to_lowercase();
    lower.contains("connection reset")
        || lower.contains("timed out")
        || lower.contains("dns error")
}

/// Extract a `retry_after` duration from a Telegram Bot API error body.
///
/// Telegram encodes the value in seconds at `parameters.retry_after`.
#[must_use]
pub fn parse_retry_after(body: &str) -> Option<Duration> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    let secs = v.get("parameters")?.get("retry_after")?.as_u64()?;

    Some(Duration::from_secs(secs))
}

/// Compute the delay before the next retry attempt.
///
/// A server-provided `retry_after` wins but is capped at `policy.max_delay`.
/// Otherwise: `min(base_delay * multiplier^attempt + jitter, max_delay)`
/// with jitter of 0-25% of the computed delay.
#[must_use]
pub fn delay_for_attempt(
    policy: &RetryPolicy,
    attempt: u32,
    retry_after: Option<Duration>,
) -> Duration {
    if let Some(ra) = retry_after {
        return ra.min(policy.max_delay);
    }

    let cap = policy.max_delay.as_secs_f64();
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let scaled = policy.base_delay.as_secs_f64() * policy.multiplier.powi(exponent);
    let base = if scaled.is_finite() { scaled.min(cap) } else { cap };

    let jitter = base * rand::thread_rng().gen_range(0.0..0.25);

    Duration::from_secs_f64((base + jitter).clamp(0.0, cap))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::{BackendKind, Error};

    // -- is_recoverable -------------------------------------------------------

    #[test]
    fn recoverable_on_rate_limit_and_server_errors() {
        assert!(is_recoverable(429, ""));
        assert!(is_recoverable(500, ""));
        assert!(is_recoverable(503, ""));
    }

    #[test]
    fn not_recoverable_on_client_errors() {
        assert!(!is_recoverable(400, ""));
        assert!(!is_recoverable(401, ""));
        assert!(!is_recoverable(404, ""));
    }

    #[test]
    fn recoverable_on_network_bodies() {
        assert!(is_recoverable(0, "Connection Reset by peer"));
        assert!(is_recoverable(0, "request Timed Out"));
        assert!(!is_recoverable(200, "bad request format"));
    }

    // -- parse_retry_after ----------------------------------------------------

    #[test]
    fn parses_valid_retry_after() {
        let body = r#"{"ok":false,"parameters":{"retry_after":30}}"#;
        assert_eq!(parse_retry_after(body), Some(Duration::from_secs(30)));
    }

    #[test]
    fn retry_after_absent_or_invalid() {
        assert_eq!(parse_retry_after(r#"{"ok":false}"#), None);
        assert_eq!(parse_retry_after("not json"), None);
    }

    // -- delay_for_attempt ----------------------------------------------------

    #[test]
    fn caps_retry_after_at_max_delay() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        let delay = delay_for_attempt(&policy, 0, Some(Duration::from_secs(60)));
        assert_eq!(delay, policy.max_delay);
    }

    #[test]
    fn exponential_growth_follows_multiplier() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            multiplier: 3.0,
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        assert!(delay_for_attempt(&policy, 0, None) >= Duration::from_millis(100));
        assert!(delay_for_attempt(&policy, 1, None) >= Duration::from_millis(300));
        assert!(delay_for_attempt(&policy, 2, None) >= Duration::from_millis(900));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        for _ in 0..50 {
            let d = delay_for_attempt(&policy, 0, None);
            assert!(d >= Duration::from_millis(1000), "below base: {d:?}");
            assert!(d <= Duration::from_millis(1250), "above 125%: {d:?}");
        }
    }

    #[test]
    fn huge_attempt_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(delay_for_attempt(&policy, u32::MAX, None), policy.max_delay);
    }

    // -- run ------------------------------------------------------------------

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            multiplier: 1.0,
            max_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = fast_policy(5)
            .run("test", || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::backend(BackendKind::Generation, Some(503), "busy"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<()> = fast_policy(3)
            .run("test", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::backend(BackendKind::Synthesis, Some(500), "down")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<()> = fast_policy(5)
            .run("test", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::backend(BackendKind::Generation, Some(401), "bad key")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(policy.max_delay, Duration::from_secs(10));
    }
}
