//! Interruptible pauses
//!
//! Backoff and inter-iteration delays wait on a [`CancellationToken`] so a
//! shutdown request ends them early instead of being swallowed.

use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The pause was cut short by cancellation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("interrupted")]
pub struct Interrupted;

/// Sleep for `duration` unless `token` is cancelled first
pub async fn pause(token: &CancellationToken, duration: Duration) -> Result<(), Interrupted> {
    if token.is_cancelled() {
        return Err(Interrupted);
    }
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = token.cancelled() => Err(Interrupted),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_pause_runs_to_completion() {
        let token = CancellationToken::new();
        let start = Instant::now();

        assert_eq!(pause(&token, Duration::from_secs(10)).await, Ok(()));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancelled_token_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(pause(&token, Duration::from_secs(3600)).await, Err(Interrupted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_pause() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        assert_eq!(pause(&token, Duration::from_secs(10)).await, Err(Interrupted));
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
