//! Per-identity sliding window rate limiter.
//!
//! Every identity owns a queue of the instants at which its requests were
//! admitted. On each check, entries that fell out of the window are trimmed
//! from the front, then the request is admitted only if fewer than `limit`
//! entries remain. Rejected attempts are not recorded, so a caller that keeps
//! hammering a full window does not push its own recovery further away.
//!
//! Identities are never evicted; the map grows with the number of distinct
//! callers seen since startup.

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// In-memory sliding window limiter shared by all workers.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter admitting `limit` requests per `window` using the system clock.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self::with_clock(limit, window, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            window,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit or reject a request for `identity` at the current time.
    pub fn admit(&self, identity: &str) -> bool {
        self.admit_at(identity, self.clock.now())
    }

    /// Admit or reject a request for `identity` at `now`.
    ///
    /// The whole purge, count and append sequence runs under one lock, so
    /// concurrent calls for the same identity never lose or double-count.
    pub fn admit_at(&self, identity: &str, now: Instant) -> bool {
        let mut windows = self.lock();
        let entries = windows.entry(identity.to_string()).or_default();

        // Early after boot `now - window` may predate the clock's origin;
        // nothing can be stale then.
        if let Some(window_start) = now.checked_sub(self.window) {
            while entries.front().is_some_and(|t| *t < window_start) {
                entries.pop_front();
            }
        }

        if entries.len() >= self.limit {
            return false;
        }

        entries.push_back(now);
        true
    }

    /// Number of admits currently recorded for `identity`, without purging.
    pub fn recorded(&self, identity: &str) -> usize {
        self.lock().get(identity).map_or(0, VecDeque::len)
    }

    /// Number of identities with state, stale ones included.
    pub fn tracked_identities(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        // Every mutation leaves the map consistent, so a panic elsewhere
        // while holding the lock cannot corrupt it.
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hand-driven clock for tests.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const WINDOW: Duration = Duration::from_secs(60);

    fn limiter(limit: usize) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (RateLimiter::with_clock(limit, WINDOW, clock.clone()), clock)
    }

    #[test]
    fn test_admits_up_to_limit() {
        let (limiter, _clock) = limiter(60);
        for i in 0..60 {
            assert!(limiter.admit("a"), "request {} rejected", i + 1);
        }
        assert!(!limiter.admit("a"));
        assert_eq!(limiter.recorded("a"), 60);
    }

    #[test]
    fn test_identities_are_independent() {
        let (limiter, _clock) = limiter(2);
        assert!(limiter.admit("a"));
        assert!(limiter.admit("a"));
        assert!(!limiter.admit("a"));
        assert!(limiter.admit("b"));
        assert_eq!(limiter.tracked_identities(), 2);
    }

    #[test]
    fn test_rejections_are_not_recorded() {
        let (limiter, clock) = limiter(3);
        for _ in 0..3 {
            assert!(limiter.admit("a"));
        }
        for _ in 0..50 {
            assert!(!limiter.admit("a"));
        }
        assert_eq!(limiter.recorded("a"), 3);

        // Once the first admits age out the caller is fully restored.
        clock.advance(WINDOW + Duration::from_millis(1));
        for _ in 0..3 {
            assert!(limiter.admit("a"));
        }
    }

    #[test]
    fn test_window_slides() {
        let (limiter, clock) = limiter(2);
        let start = clock.now();

        assert!(limiter.admit_at("a", start));
        assert!(limiter.admit_at("a", start + Duration::from_secs(30)));
        assert!(!limiter.admit_at("a", start + Duration::from_secs(45)));

        // Exactly one window later the first entry is not strictly older yet.
        assert!(!limiter.admit_at("a", start + WINDOW));

        // Just after, only the first entry has expired.
        assert!(limiter.admit_at("a", start + WINDOW + Duration::from_millis(1)));
        assert!(!limiter.admit_at("a", start + WINDOW + Duration::from_secs(1)));
        assert_eq!(limiter.recorded("a"), 2);
    }

    #[test]
    fn test_never_exceeds_limit_in_any_window() {
        let (limiter, clock) = limiter(5);
        let start = clock.now();
        let mut admitted = Vec::new();

        // One attempt every 3 seconds for 10 minutes.
        for step in 0..200u64 {
            let at = start + Duration::from_secs(step * 3);
            if limiter.admit_at("a", at) {
                admitted.push(at);
            }
            assert!(limiter.recorded("a") <= 5);
        }

        for (i, t) in admitted.iter().enumerate() {
            let in_window = admitted[i..].iter().filter(|u| **u - *t < WINDOW).count();
            assert!(in_window <= 5);
        }
    }

    #[test]
    fn test_concurrent_admits_are_exact() {
        let limiter = Arc::new(RateLimiter::new(100, WINDOW));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || (0..50).filter(|_| limiter.admit("shared")).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
        assert_eq!(limiter.recorded("shared"), 100);
    }
}
