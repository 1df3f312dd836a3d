//! Capped exponential backoff.
//!
//! An operation is tried up to `limit` times. The first retry follows the
//! failure immediately; after that the wait starts at `initial_backoff` and
//! doubles: `0, w, 2w, 4w, ...`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub limit: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(limit: u32, initial_backoff: Duration) -> Self {
        Self {
            limit,
            initial_backoff,
        }
    }

    /// Wait after the `failures`-th consecutive failure.
    pub fn delay_after(&self, failures: u32) -> Duration {
        match failures {
            0 | 1 => Duration::ZERO,
            n => {
                let factor = 1u32.checked_shl(n - 2).unwrap_or(u32::MAX);
                self.initial_backoff.saturating_mul(factor)
            }
        }
    }
}

/// Outcome of [`retry`].
#[derive(Debug)]
pub enum Retry<T, E> {
    Done(T),
    /// Every attempt failed; `last` is the final error.
    Exhausted { attempts: u32, last: E },
    Cancelled,
}

/// Runs `op` until it succeeds, the policy runs out, or `cancel` fires.
///
/// `op` receives the 1-based attempt number. Cancellation interrupts both a
/// pending attempt and a backoff wait.
pub async fn retry<T, E, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Retry<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut failures = 0;

    loop {
        let attempt = failures + 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Retry::Cancelled,
            result = op(attempt) => result,
        };

        let err = match result {
            Ok(value) => return Retry::Done(value),
            Err(err) => err,
        };

        failures += 1;
        if failures >= policy.limit {
            return Retry::Exhausted {
                attempts: failures,
                last: err,
            };
        }

        let delay = policy.delay_after(failures);
        warn!(attempt, error = %err, ?delay, "Attempt failed, retrying");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Retry::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tokio::time::Instant;

    use super::*;

    const W: Duration = Duration::from_secs(2);

    #[test]
    fn test_delays() {
        let policy = RetryPolicy::new(10, W);
        let delays: Vec<_> = (1..=5).map(|n| policy.delay_after(n)).collect();

        assert_eq!(delays, [Duration::ZERO, W, W * 2, W * 4, W * 8]);
        assert_eq!(policy.delay_after(200), W * u32::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let start = Instant::now();
        let cancel = CancellationToken::new();

        let outcome = retry(RetryPolicy::new(10, W), &cancel, |attempt| async move {
            if attempt < 4 { Err("refused") } else { Ok(attempt) }
        })
        .await;

        assert!(matches!(outcome, Retry::Done(4)));
        // 0 + w + 2w
        assert_eq!(start.elapsed(), W * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted() {
        let start = Instant::now();
        let cancel = CancellationToken::new();
        let calls = Cell::new(0);

        let outcome = retry(RetryPolicy::new(4, W), &cancel, |_| {
            calls.set(calls.get() + 1);
            async { Err::<(), _>("refused") }
        })
        .await;

        assert!(matches!(
            outcome,
            Retry::Exhausted { attempts: 4, last: "refused" }
        ));
        assert_eq!(calls.get(), 4);
        // No wait after the final failure.
        assert_eq!(start.elapsed(), W * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let outcome = retry(RetryPolicy::new(10, W), &cancel, |attempt| {
            if attempt == 3 {
                trigger.cancel();
            }
            async { Err::<(), _>("refused") }
        })
        .await;

        assert!(matches!(outcome, Retry::Cancelled));
    }
}
