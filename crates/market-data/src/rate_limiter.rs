//! Sliding window rate limiter for the market data provider.
//!
//! Keeps the timestamps of recent calls and admits a new call only while fewer
//! than `max_calls` of them fall inside the trailing window. Entries that have
//! aged out are purged on every inspection, so the window is always evaluated
//! against "now" rather than on a timer.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

/// Default budget: 5 calls (Alpha Vantage free tier).
pub const DEFAULT_MAX_CALLS: usize = 5;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Rate limiter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum admitted calls inside one window.
    pub max_calls: usize,
    /// Length of the trailing window.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: DEFAULT_MAX_CALLS,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Call timestamps inside the trailing window, oldest first.
#[derive(Debug)]
struct CallWindow {
    calls: VecDeque<Instant>,
    max_calls: usize,
    window: Duration,
}

impl CallWindow {
    fn new(config: &RateLimitConfig) -> Self {
        Self {
            calls: VecDeque::with_capacity(config.max_calls),
            max_calls: config.max_calls,
            window: config.window,
        }
    }

    /// Drop every timestamp older than `now - window`.
    fn purge(&mut self, now: Instant) {
        while let Some(&oldest) = self.calls.front() {
            if now.saturating_duration_since(oldest) > self.window {
                self.calls.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&mut self, now: Instant) -> bool {
        self.purge(now);
        self.calls.len() >= self.max_calls
    }

    fn try_admit(&mut self, now: Instant) -> bool {
        if self.is_full(now) {
            return false;
        }
        self.calls.push_back(now);
        true
    }

    fn retry_after(&mut self, now: Instant) -> Duration {
        if !self.is_full(now) {
            return Duration::ZERO;
        }
        // Full implies at least one entry; the oldest frees the next slot.
        let oldest = self.calls.front().copied().unwrap_or(now);
        let age = now.saturating_duration_since(oldest);
        // Purge drops entries strictly older than the window, so the slot frees
        // just past the boundary.
        (self.window - age) + Duration::from_millis(1)
    }
}

/// Sliding window rate limiter, one instance per process.
///
/// Thread-safe: admission is a single critical section, so two callers can
/// never both observe "4 of 5 used" and both proceed. Share it behind an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<CallWindow>,
}

impl RateLimiter {
    /// Create a limiter with the default 5 calls per 60 seconds.
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            window: Mutex::new(CallWindow::new(&config)),
        }
    }

    /// Lock the window, recovering from poison if necessary.
    ///
    /// The window holds only timestamps, so the state left by a panicking
    /// holder is still usable.
    fn lock_window(&self) -> MutexGuard<'_, CallWindow> {
        self.window.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter window mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Admit a call and record it, or reject without consuming a slot.
    pub fn admit(&self) -> bool {
        self.admit_at(Instant::now())
    }

    pub(crate) fn admit_at(&self, now: Instant) -> bool {
        let admitted = self.lock_window().try_admit(now);
        if admitted {
            debug!("Rate limiter: call admitted");
        } else {
            debug!("Rate limiter: call rejected, window is full");
        }
        admitted
    }

    /// Whether the next call would be rejected. Records nothing.
    pub fn is_limited(&self) -> bool {
        self.is_limited_at(Instant::now())
    }

    pub(crate) fn is_limited_at(&self, now: Instant) -> bool {
        self.lock_window().is_full(now)
    }

    /// Free slots in the current window.
    pub fn remaining(&self) -> usize {
        let now = Instant::now();
        let mut window = self.lock_window();
        window.purge(now);
        window.max_calls.saturating_sub(window.calls.len())
    }

    /// Time until the next slot frees up, zero when a call would be admitted.
    pub fn retry_after(&self) -> Duration {
        self.lock_window().retry_after(Instant::now())
    }

    /// Saturate the window after a provider-side throttle.
    ///
    /// Every slot is stamped "now", so the limiter stays closed for a full
    /// window afterwards regardless of how many local calls it had counted.
    pub fn record_upstream_throttle(&self) {
        self.record_upstream_throttle_at(Instant::now());
    }

    pub(crate) fn record_upstream_throttle_at(&self, now: Instant) {
        let mut window = self.lock_window();
        let max_calls = window.max_calls;
        window.calls.clear();
        window.calls.extend(std::iter::repeat(now).take(max_calls));
        warn!(
            "Rate limiter: provider throttled, {} calls now counted in window",
            window.calls.len()
        );
    }

    /// Forget all recorded calls.
    pub fn reset(&self) {
        self.lock_window().calls.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_sixth_call_in_window_is_rejected() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for i in 0..5 {
            assert!(limiter.admit_at(start + Duration::from_secs(i)));
        }
        assert!(!limiter.admit_at(start + Duration::from_secs(5)));
        assert!(limiter.is_limited_at(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_rejected_call_consumes_no_slot() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.admit_at(start));
        }
        for i in 1..10 {
            assert!(!limiter.admit_at(start + Duration::from_secs(i)));
        }

        // Only the five admitted calls age out; one minute later all slots are free.
        let later = start + DEFAULT_WINDOW + Duration::from_millis(1);
        for _ in 0..5 {
            assert!(limiter.admit_at(later));
        }
    }

    #[test]
    fn test_aged_out_call_frees_one_slot() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for i in 0..5 {
            assert!(limiter.admit_at(start + Duration::from_secs(i * 10)));
        }

        // The first call is still inside the window at exactly 60s.
        assert!(!limiter.admit_at(start + DEFAULT_WINDOW));

        let first_aged_out = start + DEFAULT_WINDOW + Duration::from_millis(1);
        assert!(limiter.admit_at(first_aged_out));
        assert!(!limiter.admit_at(first_aged_out));
    }

    #[test]
    fn test_is_limited_does_not_record() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for _ in 0..20 {
            assert!(!limiter.is_limited_at(start));
        }
        for _ in 0..5 {
            assert!(limiter.admit_at(start));
        }
        assert!(limiter.is_limited_at(start));
    }

    #[test]
    fn test_custom_config() {
        let limiter = RateLimiter::with_config(RateLimitConfig {
            max_calls: 2,
            window: Duration::from_secs(1),
        });
        let start = Instant::now();

        assert!(limiter.admit_at(start));
        assert!(limiter.admit_at(start));
        assert!(!limiter.admit_at(start));
        assert!(limiter.admit_at(start + Duration::from_millis(1001)));
    }

    #[test]
    fn test_upstream_throttle_closes_window() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        assert!(limiter.admit_at(start));
        let throttled_at = start + Duration::from_secs(10);
        limiter.record_upstream_throttle_at(throttled_at);
        assert!(limiter.is_limited_at(throttled_at));
        assert_eq!(limiter.lock_window().calls.len(), DEFAULT_MAX_CALLS);

        // The call admitted at `start` no longer frees a slot early.
        assert!(limiter.is_limited_at(start + DEFAULT_WINDOW + Duration::from_secs(1)));

        // Repeated throttles keep the window bounded.
        limiter.record_upstream_throttle_at(throttled_at);
        assert_eq!(limiter.lock_window().calls.len(), DEFAULT_MAX_CALLS);
        assert!(limiter.admit_at(throttled_at + DEFAULT_WINDOW + Duration::from_millis(1)));
    }

    #[test]
    fn test_upstream_throttle_fills_every_slot() {
        let limiter = RateLimiter::with_config(RateLimitConfig {
            max_calls: 5,
            window: Duration::from_secs(60),
        });
        let start = Instant::now();

        assert!(limiter.admit_at(start));
        limiter.record_upstream_throttle_at(start);

        assert_eq!(limiter.lock_window().calls.len(), 5);
        assert!(limiter.is_limited_at(start));
        assert!(!limiter.admit_at(start + Duration::from_secs(30)));
        assert_eq!(
            limiter.lock_window().retry_after(start),
            DEFAULT_WINDOW + Duration::from_millis(1)
        );
    }

    #[test]
    fn test_remaining_and_reset() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.remaining(), 5);
        assert_eq!(limiter.retry_after(), Duration::ZERO);

        assert!(limiter.admit());
        assert!(limiter.admit());
        assert_eq!(limiter.remaining(), 3);

        limiter.reset();
        assert_eq!(limiter.remaining(), 5);
    }

    #[test]
    fn test_retry_after_when_full() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.admit());
        }
        let wait = limiter.retry_after();
        assert!(wait > Duration::from_secs(59));
        assert!(wait <= DEFAULT_WINDOW + Duration::from_millis(1));
    }

    #[test]
    fn test_concurrent_admission_never_exceeds_budget() {
        let limiter = Arc::new(RateLimiter::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..10).filter(|_| limiter.admit()).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, DEFAULT_MAX_CALLS);
    }

    proptest! {
        #[test]
        fn prop_at_most_five_per_window(mut offsets in prop::collection::vec(0u64..300_000, 1..80)) {
            offsets.sort_unstable();
            let limiter = RateLimiter::new();
            let start = Instant::now();

            let admitted: Vec<u64> = offsets
                .iter()
                .copied()
                .filter(|ms| limiter.admit_at(start + Duration::from_millis(*ms)))
                .collect();

            for (i, &t) in admitted.iter().enumerate() {
                let in_window = admitted[..=i]
                    .iter()
                    .filter(|&&earlier| t - earlier <= 60_000)
                    .count();
                prop_assert!(in_window <= DEFAULT_MAX_CALLS);
            }
        }
    }
}
