//! Retry controller
//!
//! Wraps a trial with bounded retries and exponential backoff. Only
//! rate-limited failures are retried; any other outcome is final.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use toolbench_core::{RetrySettings, RunOutcome};

use crate::classify::is_rate_limited;
use crate::pacing;

const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Backoff policy for rate-limited trials
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    /// Jitter factor in [0, 1]; zero disables jitter
    jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// Build from configuration. A multiplier below 1.0 or NaN falls back to
    /// the default.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        let multiplier = if settings.multiplier >= 1.0 && settings.multiplier.is_finite() {
            settings.multiplier
        } else {
            warn!(
                multiplier = settings.multiplier,
                "Ignoring retry multiplier below 1.0, using {}",
                DEFAULT_MULTIPLIER
            );
            DEFAULT_MULTIPLIER
        };

        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: settings.initial_backoff(),
            max_backoff: settings.max_backoff(),
            multiplier,
            jitter_factor: 0.0,
        }
    }

    /// Never retry
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before retry `retry` (1-indexed)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        // Capped in f64 first; large exponents overflow Duration.
        let exponent = (retry - 1).min(i32::MAX as u32) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff);

        if self.jitter_factor > 0.0 {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let range = delay.mul_f64(self.jitter_factor);
        if range.is_zero() {
            return delay;
        }

        let mut rng = rand::thread_rng();
        let jitter = rng.gen_range(Duration::ZERO..range);
        if rng.gen_bool(0.5) {
            delay + jitter
        } else {
            delay.saturating_sub(jitter)
        }
    }

    /// Whether another attempt is allowed after `attempts` have run
    pub fn allows_another(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

/// What happened across the attempts of one iteration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryReport {
    /// Outcome of the last attempt
    pub outcome: RunOutcome,
    pub attempts: u32,
    /// Backoffs actually waited, in order
    pub backoffs: Vec<Duration>,
    /// A backoff was cut short by cancellation
    pub interrupted: bool,
}

#[derive(Debug, Clone)]
pub struct RetryController {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RetryController {
    pub fn new(policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `attempt` until it produces an outcome that is not rate-limited,
    /// the attempt budget is spent, or a backoff is interrupted.
    ///
    /// `attempt` receives the 1-indexed attempt number. An `Err` from it is
    /// returned immediately without retrying.
    pub async fn run<F, Fut, E>(&self, mut attempt: F) -> Result<RetryReport, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<RunOutcome, E>>,
    {
        let mut backoffs = Vec::new();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = attempt(attempts).await?;

            if !is_rate_limited(&outcome) || !self.policy.allows_another(attempts) {
                return Ok(RetryReport {
                    outcome,
                    attempts,
                    backoffs,
                    interrupted: false,
                });
            }

            let delay = self.policy.delay_for_retry(attempts);
            warn!(
                "Rate limit hit, waiting {:.1} seconds before retry {}/{}",
                delay.as_secs_f64(),
                attempts,
                self.policy.max_attempts - 1
            );

            if pacing::pause(&self.cancel, delay).await.is_err() {
                warn!(attempts, "Backoff interrupted, giving up on retries");
                return Ok(RetryReport {
                    outcome,
                    attempts,
                    backoffs,
                    interrupted: true,
                });
            }
            backoffs.push(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn rate_limited() -> RunOutcome {
        RunOutcome::failure("429 Too Many Requests: rate_limit_exceeded")
    }

    fn passed() -> RunOutcome {
        RunOutcome {
            success: true,
            accuracy_score: 1.0,
            ..Default::default()
        }
    }

    fn controller() -> RetryController {
        RetryController::new(RetryPolicy::default(), CancellationToken::new())
    }

    #[test]
    fn test_default_backoff_doubles() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for_retry(0), Duration::ZERO);
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_capped() {
        let policy = RetryPolicy::from_settings(&RetrySettings {
            max_attempts: 10,
            initial_backoff_ms: 1000,
            multiplier: 10.0,
            max_backoff_ms: 5000,
        });

        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(5));
        assert_eq!(policy.delay_for_retry(5), Duration::from_secs(5));
    }

    #[test]
    fn test_large_retry_index_is_capped() {
        let policy = RetryPolicy::from_settings(&RetrySettings {
            max_attempts: 100,
            ..Default::default()
        });

        assert_eq!(policy.delay_for_retry(70), Duration::from_secs(60));
        assert_eq!(policy.delay_for_retry(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_shrinking_multiplier_is_replaced() {
        for multiplier in [-2.0, 0.5, f64::NAN] {
            let policy = RetryPolicy::from_settings(&RetrySettings {
                multiplier,
                ..Default::default()
            });

            assert_eq!(policy.delay_for_retry(1), Duration::from_millis(1000));
            assert_eq!(policy.delay_for_retry(2), Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::default().with_jitter_factor(0.5);

        for _ in 0..100 {
            let delay = policy.delay_for_retry(1);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_rate_limits_until_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let start = Instant::now();

        let report = controller()
            .run(|_| {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok::<_, Infallible>(if n < 3 { rate_limited() } else { passed() })
                }
            })
            .await
            .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(report.attempts, 3);
        assert!(report.outcome.success);
        assert_eq!(
            report.backoffs,
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_rate_limit_error_is_not_retried() {
        let report = controller()
            .run(|_| async { Ok::<_, Infallible>(RunOutcome::failure("Request failed: bad gateway")) })
            .await
            .unwrap();

        assert_eq!(report.attempts, 1);
        assert!(report.backoffs.is_empty());
        assert_eq!(report.outcome.error.as_deref(), Some("Request failed: bad gateway"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_not_retried() {
        let report = controller()
            .run(|_| async { Ok::<_, Infallible>(RunOutcome::timeout(429)) })
            .await
            .unwrap();

        assert_eq!(report.attempts, 1);
        assert!(report.backoffs.is_empty());
        assert_eq!(report.outcome.error.as_deref(), Some("Timeout after 429 seconds"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_score_is_not_retried() {
        let report = controller()
            .run(|_| async { Ok::<_, Infallible>(RunOutcome::default()) })
            .await
            .unwrap();

        assert_eq!(report.attempts, 1);
        assert!(!report.outcome.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_last_failure() {
        let start = Instant::now();
        let report = controller()
            .run(|n| async move {
                Ok::<_, Infallible>(RunOutcome::failure(format!("rate_limit_exceeded #{}", n)))
            })
            .await
            .unwrap();

        assert_eq!(report.attempts, 3);
        assert_eq!(report.outcome.error.as_deref(), Some("rate_limit_exceeded #3"));
        // No backoff after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_from_attempt_stops_immediately() {
        let result = controller()
            .run(|_| async { Err::<RunOutcome, _>("misconfigured") })
            .await;

        assert_eq!(result, Err("misconfigured"));
    }

    #[tokio::test]
    async fn test_cancelled_backoff_aborts_retries() {
        let token = CancellationToken::new();
        token.cancel();
        let controller = RetryController::new(RetryPolicy::default(), token);

        let report = controller
            .run(|_| async { Ok::<_, Infallible>(rate_limited()) })
            .await
            .unwrap();

        assert_eq!(report.attempts, 1);
        assert!(report.interrupted);
        assert!(report.backoffs.is_empty());
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let controller = RetryController::new(RetryPolicy::no_retry(), CancellationToken::new());
        let report = controller
            .run(|_| async { Ok::<_, Infallible>(rate_limited()) })
            .await
            .unwrap();

        assert_eq!(report.attempts, 1);
        assert!(!report.interrupted);
    }
}
