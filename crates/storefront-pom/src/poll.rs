//! Poll-based assertions for eventually-consistent UI state.
//!
//! An action can return before the UI reflects it (the cart badge updates a
//! frame or two after the click). [`Poll`] re-invokes a read until its value
//! satisfies the expectation or the deadline elapses. It retries the read,
//! never the action that triggered the change.

use crate::assertions::TextPattern;
use crate::config::Timeouts;
use crate::result::{PomError, PomResult};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Deadline and interval for a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Total time allowed
    pub timeout: Duration,
    /// Pause between attempts
    pub poll_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from_timeouts(&Timeouts::default())
    }
}

impl PollConfig {
    /// Create a config with the default interval
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Assertion-level deadline from the harness timeouts
    #[must_use]
    pub const fn from_timeouts(timeouts: &Timeouts) -> Self {
        Self {
            timeout: timeouts.assertion(),
            poll_interval: timeouts.poll_interval(),
        }
    }

    /// Action-level deadline from the harness timeouts
    #[must_use]
    pub const fn action(timeouts: &Timeouts) -> Self {
        Self {
            timeout: timeouts.action(),
            poll_interval: timeouts.poll_interval(),
        }
    }
}

/// Value that satisfied a poll, with timing
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome<T> {
    /// Accepted value
    pub value: T,
    /// Reads performed, including the accepted one
    pub attempts: usize,
    /// Time from first read to acceptance
    pub duration: Duration,
}

/// A read that is repeated until it yields an acceptable value
///
/// ```ignore
/// let count = Poll::new("cart badge count", move || inventory.cart_count())
///     .with_config(PollConfig::from_timeouts(&config.timeouts))
///     .to_equal(2)
///     .await?;
/// ```
pub struct Poll<F> {
    read: F,
    config: PollConfig,
    description: String,
}

impl<F> Debug for Poll<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poll")
            .field("config", &self.config)
            .field("description", &self.description)
            .finish()
    }
}

impl<F, Fut, T> Poll<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PomResult<T>>,
    T: Debug,
{
    /// Create a poll over `read`
    #[must_use]
    pub fn new(description: impl Into<String>, read: F) -> Self {
        Self {
            read,
            config: PollConfig::default(),
            description: description.into(),
        }
    }

    /// Set the full config
    #[must_use]
    pub const fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Current config
    #[must_use]
    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Read until `accept` holds.
    ///
    /// Transient read errors (see [`PomError::is_transient`]) count as a
    /// failed attempt and are reported as the last observation; any other read
    /// error is returned at once.
    ///
    /// # Errors
    ///
    /// [`PomError::AssertionTimeout`] carrying the last observed value when the
    /// deadline elapses.
    pub async fn until(
        mut self,
        expected: impl Into<String>,
        accept: impl Fn(&T) -> bool,
    ) -> PomResult<PollOutcome<T>> {
        let expected = expected.into();
        let start = Instant::now();
        let mut attempts = 0;
        let mut last_observed = String::from("<nothing read>");

        loop {
            attempts += 1;
            let remaining = self.config.timeout.saturating_sub(start.elapsed());

            match tokio::time::timeout(remaining, (self.read)()).await {
                Ok(Ok(value)) => {
                    if accept(&value) {
                        debug!(
                            description = %self.description,
                            attempts,
                            "poll satisfied"
                        );
                        return Ok(PollOutcome {
                            value,
                            attempts,
                            duration: start.elapsed(),
                        });
                    }
                    last_observed = format!("{value:?}");
                }
                Ok(Err(e)) if e.is_transient() => last_observed = e.to_string(),
                Ok(Err(e)) => return Err(e),
                Err(_) => last_observed = format!("{last_observed} (read still pending)"),
            }

            if start.elapsed() >= self.config.timeout {
                warn!(
                    description = %self.description,
                    %expected,
                    %last_observed,
                    attempts,
                    "poll timed out"
                );
                return Err(PomError::AssertionTimeout {
                    description: self.description,
                    expected,
                    last_observed,
                    timeout_ms: self.config.timeout.as_millis() as u64,
                });
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Read until the value equals `expected`
    pub async fn to_equal(self, expected: T) -> PomResult<T>
    where
        T: PartialEq,
    {
        let label = format!("{expected:?}");
        self.until(label, move |v| *v == expected)
            .await
            .map(|o| o.value)
    }
}

impl<F, Fut> Poll<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PomResult<String>>,
{
    /// Read text until it matches `pattern`
    pub async fn to_match(self, pattern: &TextPattern) -> PomResult<String> {
        self.until(pattern.to_string(), |text| pattern.is_match(text))
            .await
            .map(|o| o.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> PollConfig {
        PollConfig::new(Duration::from_millis(200)).with_poll_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_immediate_success() {
        let outcome = Poll::new("constant", || async { Ok::<_, PomError>(7) })
            .with_config(fast())
            .until("7", |v| *v == 7)
            .await
            .unwrap();
        assert_eq!(outcome.value, 7);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_eventual_success() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let value = Poll::new("counter", move || {
            let c = Arc::clone(&c);
            async move { Ok(c.fetch_add(1, Ordering::SeqCst) + 1) }
        })
        .with_config(fast())
        .to_equal(3)
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_carries_last_value() {
        let err = Poll::new("cart badge count", || async { Ok::<u32, PomError>(1) })
            .with_config(fast())
            .to_equal(2)
            .await
            .unwrap_err();

        match err {
            PomError::AssertionTimeout {
                description,
                expected,
                last_observed,
                timeout_ms,
            } => {
                assert_eq!(description, "cart badge count");
                assert_eq!(expected, "2");
                assert_eq!(last_observed, "1");
                assert_eq!(timeout_ms, 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let value = Poll::new("flaky read", move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(PomError::StaleElement { id: "r1".into() })
                } else {
                    Ok(n)
                }
            }
        })
        .with_config(fast())
        .until("read", |_| true)
        .await
        .unwrap();
        assert_eq!(value.value, 2);
        assert_eq!(value.attempts, 3);
    }

    #[tokio::test]
    async fn test_fatal_error_propagates_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let err = Poll::new("broken read", move || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(PomError::driver("target closed")) }
        })
        .with_config(fast())
        .to_equal(1)
        .await
        .unwrap_err();

        assert!(matches!(err, PomError::Driver { .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_error_reported_on_timeout() {
        let err = Poll::new("title", || async {
            Err::<String, _>(PomError::ParseFailure {
                target: "cart count",
                text: "x".into(),
            })
        })
        .with_config(fast())
        .until("anything", |_| true)
        .await
        .unwrap_err();

        match err {
            PomError::AssertionTimeout { last_observed, .. } => {
                assert!(last_observed.contains("cart count"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_to_match_pattern() {
        let pattern = TextPattern::case_insensitive("products").unwrap();
        let text = Poll::new("title", || async { Ok("PRODUCTS".to_string()) })
            .with_config(fast())
            .to_match(&pattern)
            .await
            .unwrap();
        assert_eq!(text, "PRODUCTS");
    }

    #[tokio::test]
    async fn test_hung_read_bounded_by_deadline() {
        let err = Poll::new("hung", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<u32, PomError>(0)
        })
        .with_config(fast())
        .to_equal(1)
        .await
        .unwrap_err();
        assert!(matches!(err, PomError::AssertionTimeout { .. }));
    }

    #[test]
    fn test_config_from_timeouts() {
        let t = Timeouts::default();
        let c = PollConfig::from_timeouts(&t);
        assert_eq!(c.timeout, Duration::from_secs(10));
        assert_eq!(c.poll_interval, Duration::from_millis(100));
        assert_eq!(PollConfig::action(&t).timeout, Duration::from_secs(10));
    }
}
