use std::time::Duration;

use tokio::time::Instant;

/// Exponential backoff without jitter. Each failure doubles the window up
/// to `max`; a success resets it. Once half of a window has passed, a single
/// trial attempt is let through before the window ends.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Option<Duration>,
    retry_at: Option<Instant>,
    trial_taken: bool,
    failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            current: None,
            retry_at: None,
            trial_taken: false,
            failures: 0,
        }
    }

    /// Time left before another attempt is allowed, `None` when ready
    pub fn remaining(&self) -> Option<Duration> {
        let retry_at = self.retry_at?;
        let now = Instant::now();
        (retry_at > now).then(|| retry_at - now)
    }

    /// Claims the right to attempt now, or returns the time left in the
    /// window when the attempt must be skipped
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        let Some(remaining) = self.remaining()
        else {
            return Ok(());
        };

        let half = self.current.unwrap_or_default() / 2;
        if !self.trial_taken && remaining <= half {
            self.trial_taken = true;
            return Ok(());
        }
        Err(remaining)
    }

    pub fn failures(&self) -> u32 { self.failures }

    /// Registers a failure and returns the new window
    pub fn record_failure(&mut self) -> Duration {
        let next = match self.current {
            None => self.initial,
            Some(current) => current.saturating_mul(2).min(self.max),
        };

        self.current = Some(next);
        self.retry_at = Some(Instant::now() + next);
        self.trial_taken = false;
        self.failures += 1;
        next
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.retry_at = None;
        self.trial_taken = false;
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_doubles_up_to_max() {
        let mut backoff =
            Backoff::new(Duration::from_millis(100), Duration::from_millis(350));

        assert_eq!(backoff.remaining(), None);
        assert_eq!(backoff.record_failure(), Duration::from_millis(100));
        assert_eq!(backoff.record_failure(), Duration::from_millis(200));
        assert_eq!(backoff.record_failure(), Duration::from_millis(350));
        assert_eq!(backoff.record_failure(), Duration::from_millis(350));
        assert_eq!(backoff.failures(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_window_elapses() {
        let mut backoff =
            Backoff::new(Duration::from_millis(100), Duration::from_secs(1));

        backoff.record_failure();
        assert!(backoff.remaining().is_some());

        tokio::time::advance(Duration::from_millis(60)).await;
        assert_eq!(backoff.remaining(), Some(Duration::from_millis(40)));

        tokio::time::advance(Duration::from_millis(40)).await;
        assert_eq!(backoff.remaining(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_trial_in_second_half_of_window() {
        let mut backoff =
            Backoff::new(Duration::from_millis(100), Duration::from_secs(1));

        assert_eq!(backoff.try_acquire(), Ok(()));
        backoff.record_failure();
        assert_eq!(backoff.try_acquire(), Err(Duration::from_millis(100)));

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(backoff.try_acquire(), Ok(()));
        assert_eq!(backoff.try_acquire(), Err(Duration::from_millis(50)));

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(backoff.try_acquire(), Ok(()));
        assert_eq!(backoff.try_acquire(), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trial_opens_a_longer_window() {
        let mut backoff =
            Backoff::new(Duration::from_millis(100), Duration::from_secs(1));

        backoff.record_failure();
        tokio::time::advance(Duration::from_millis(60)).await;
        assert_eq!(backoff.try_acquire(), Ok(()));
        assert_eq!(backoff.record_failure(), Duration::from_millis(200));

        assert_eq!(backoff.try_acquire(), Err(Duration::from_millis(200)));
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(backoff.try_acquire(), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset() {
        let mut backoff =
            Backoff::new(Duration::from_millis(100), Duration::from_secs(1));

        backoff.record_failure();
        backoff.record_failure();
        backoff.reset();

        assert_eq!(backoff.remaining(), None);
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.record_failure(), Duration::from_millis(100));
    }
}
