//! Failure classification

use toolbench_core::RunOutcome;

/// Substrings providers use to signal rate limiting
const RATE_LIMIT_MARKERS: [&str; 3] = ["rate_limit_exceeded", "429", "Too Many Requests"];

/// Whether an error message signals a rate limit
pub fn is_rate_limit_error(message: &str) -> bool {
    RATE_LIMIT_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Whether a run failed because of a rate limit. Timeouts never are, even
/// when the deadline's digits contain a status code.
pub fn is_rate_limited(outcome: &RunOutcome) -> bool {
    !outcome.success
        && !outcome.timed_out
        && outcome.error.as_deref().is_some_and(is_rate_limit_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_markers() {
        assert!(is_rate_limit_error("Error code: rate_limit_exceeded"));
        assert!(is_rate_limit_error("HTTP 429"));
        assert!(is_rate_limit_error("429 Too Many Requests: slow down"));
        assert!(is_rate_limit_error("Too Many Requests"));
    }

    #[test]
    fn test_other_errors_are_not_rate_limits() {
        assert!(!is_rate_limit_error("Timeout after 180 seconds"));
        assert!(!is_rate_limit_error("Request failed: connection reset"));
        assert!(!is_rate_limit_error("too many requests"));
        assert!(!is_rate_limit_error(""));
    }

    #[test]
    fn test_outcome_classification() {
        assert!(is_rate_limited(&RunOutcome::failure("rate_limit_exceeded")));
        assert!(!is_rate_limited(&RunOutcome::failure("bad gateway")));
        assert!(!is_rate_limited(&RunOutcome::default()));
    }

    #[test]
    fn test_timeout_is_never_a_rate_limit() {
        let run = RunOutcome::timeout(429);
        assert!(is_rate_limit_error(run.error.as_deref().unwrap()));
        assert!(!is_rate_limited(&run));
    }
}
