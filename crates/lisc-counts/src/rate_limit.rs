//! Request spacing for remote lookups.
//!
//! Literature databases enforce a per-key request ceiling, so every lookup
//! in a sweep passes through one [`RateLimiter`]. The limiter keeps a
//! minimum spacing between consecutive calls and, optionally, a longer
//! cooldown after every `burst_size` calls.
//!
//! The limiter is an explicit instance rather than global state, so
//! independent sweeps never share a clock unless they share the instance.
//! Sharing goes through [`SharedLimiter`], whose mutex serializes callers.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// A rate limiter shared between requesters that use the same API key.
pub type SharedLimiter = Arc<Mutex<RateLimiter>>;

/// Periodic cooldown applied on top of the per-call spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    /// Number of calls between cooldowns.
    pub size: u32,
    /// Length of each cooldown.
    pub pause: Duration,
}

/// Enforces minimum spacing between remote calls.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    burst: Option<Burst>,
    /// When the previous call was permitted.
    last_call: Option<Instant>,
    /// Calls permitted so far.
    calls: u64,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum spacing and no cooldown.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            burst: None,
            last_call: None,
            calls: 0,
        }
    }

    /// Adds a cooldown of `pause` after every `size` calls.
    ///
    /// A `size` of zero disables the cooldown.
    pub fn with_burst(mut self, size: u32, pause: Duration) -> Self {
        self.burst = (size > 0).then_some(Burst { size, pause });
        self
    }

    /// Wraps the limiter for sharing across requesters.
    pub fn shared(self) -> SharedLimiter {
        Arc::new(Mutex::new(self))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn burst(&self) -> Option<Burst> {
        self.burst
    }

    /// Number of calls permitted so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Returns true if a call could proceed right now without waiting.
    pub fn is_ready(&self) -> bool {
        self.remaining_interval().is_zero() && self.cooldown_due().is_none()
    }

    /// Waits until the next call is allowed, then records it.
    ///
    /// Sleeps for whatever is left of `min_interval` since the previous
    /// call; then, if a positive multiple of `burst_size` calls has already
    /// been made, sleeps for `burst_pause` as well. Never fails.
    pub async fn wait_if_needed(&mut self) {
        let deficit = self.remaining_interval();
        if !deficit.is_zero() {
            debug!("Rate limiter waiting {:?} before call {}", deficit, self.calls + 1);
            tokio::time::sleep(deficit).await;
        }

        if let Some(pause) = self.cooldown_due() {
            debug!("Rate limiter cooling down for {:?} after {} calls", pause, self.calls);
            tokio::time::sleep(pause).await;
        }

        self.last_call = Some(Instant::now());
        self.calls += 1;
    }

    fn remaining_interval(&self) -> Duration {
        match self.last_call {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    fn cooldown_due(&self) -> Option<Duration> {
        let burst = self.burst?;
        let due = self.calls > 0 && self.calls % u64::from(burst.size) == 0;
        due.then_some(burst.pause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_call_does_not_wait() {
        let mut limiter = RateLimiter::new(Duration::from_secs(1));
        assert!(limiter.is_ready());

        let start = Instant::now();
        limiter.wait_if_needed().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_calls_are_spaced() {
        let mut limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.wait_if_needed().await;
        }

        // Two gaps of 500ms between three calls
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
        assert!(!limiter.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn only_remaining_deficit_is_waited() {
        let mut limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.wait_if_needed().await;

        tokio::time::sleep(Duration::from_millis(300)).await;
        let before = Instant::now();
        limiter.wait_if_needed().await;

        let waited = before.elapsed();
        assert!(waited >= Duration::from_millis(200));
        assert!(waited < Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_once_interval_has_passed() {
        let mut limiter = RateLimiter::new(Duration::from_millis(100));
        limiter.wait_if_needed().await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(limiter.is_ready());

        let before = Instant::now();
        limiter.wait_if_needed().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_pause_after_every_burst() {
        let mut limiter =
            RateLimiter::new(Duration::ZERO).with_burst(2, Duration::from_secs(10));
        let start = Instant::now();

        limiter.wait_if_needed().await;
        limiter.wait_if_needed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        // Third call follows a completed burst of two
        limiter.wait_if_needed().await;
        assert!(start.elapsed() >= Duration::from_secs(10));

        limiter.wait_if_needed().await;
        assert!(start.elapsed() < Duration::from_secs(20));

        limiter.wait_if_needed().await;
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert_eq!(limiter.calls(), 5);
    }

    #[test]
    fn zero_burst_size_disables_cooldown() {
        let limiter = RateLimiter::new(Duration::ZERO).with_burst(0, Duration::from_secs(1));
        assert!(limiter.burst().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shared_limiter_spaces_calls_from_two_holders() {
        let limiter = RateLimiter::new(Duration::from_millis(200)).shared();
        let other = limiter.clone();
        let start = Instant::now();

        limiter.lock().await.wait_if_needed().await;
        other.lock().await.wait_if_needed().await;

        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(limiter.lock().await.calls(), 2);
    }
}
