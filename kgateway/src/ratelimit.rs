//! Per-client fixed-window admission control.
//!
//! A fixed window, not a true sliding window: a burst straddling the reset
//! boundary can briefly exceed the cap. Counters live in process memory and
//! reset on restart; this throttles abuse, it is not a security boundary.
//!
//! ```rust
//! use kgateway::{FixedWindowRateLimiter, RateLimiter};
//!
//! let limiter = FixedWindowRateLimiter::new();
//! let decision = limiter.admit("203.0.113.7");
//! assert!(decision.allowed);
//! assert_eq!(decision.remaining, 49);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_RATE_LIMIT: u32 = 50;
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

/// Narrow injected admission interface so the in-memory store can be swapped
/// for a shared one without touching the gateway logic.
pub trait RateLimiter: Send + Sync {
    fn admit(&self, client_key: &str) -> RateLimitDecision;
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

pub struct FixedWindowRateLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
    window: Duration,
    cap: u32,
    clock: Box<dyn Fn() -> Instant + Send + Sync>,
}

impl FixedWindowRateLimiter {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW)
    }

    pub fn with_limits(cap: u32, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            window,
            cap,
            clock: Box::new(Instant::now),
        }
    }

    /// Injects the time source, so window expiry is testable without
    /// sleeping.
    pub fn with_clock(mut self, clock: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }
}

impl Default for FixedWindowRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn admit(&self, client_key: &str) -> RateLimitDecision {
        let now = (self.clock)();

        // Admission control must never take a request down with it; a
        // poisoned map degrades to allowing the request through.
        let Ok(mut entries) = self.entries.lock() else {
            tracing::warn!(
                phase = "ratelimit",
                event = "lock_poisoned",
                "rate-limit table lock poisoned; allowing request"
            );
            return RateLimitDecision {
                allowed: true,
                remaining: self.cap.saturating_sub(1),
            };
        };

        match entries.get_mut(client_key) {
            Some(entry) if now <= entry.reset_at => {
                if entry.count >= self.cap {
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                    };
                }

                entry.count += 1;
                RateLimitDecision {
                    allowed: true,
                    remaining: self.cap - entry.count,
                }
            }
            _ => {
                entries.insert(
                    client_key.to_string(),
                    WindowEntry {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: self.cap.saturating_sub(1),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn limiter_at(cap: u32, window: Duration, now: Arc<Mutex<Instant>>) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::with_limits(cap, window)
            .with_clock(move || *now.lock().expect("test clock"))
    }

    #[test]
    fn counts_down_to_the_cap_then_denies() {
        let now = Arc::new(Mutex::new(Instant::now()));
        let limiter = limiter_at(3, Duration::from_secs(3600), now);

        assert_eq!(
            limiter.admit("ip-1"),
            RateLimitDecision {
                allowed: true,
                remaining: 2
            }
        );
        assert_eq!(
            limiter.admit("ip-1"),
            RateLimitDecision {
                allowed: true,
                remaining: 1
            }
        );
        assert_eq!(
            limiter.admit("ip-1"),
            RateLimitDecision {
                allowed: true,
                remaining: 0
            }
        );
        assert_eq!(
            limiter.admit("ip-1"),
            RateLimitDecision {
                allowed: false,
                remaining: 0
            }
        );
    }

    #[test]
    fn window_expiry_resets_the_counter_to_one() {
        let now = Arc::new(Mutex::new(Instant::now()));
        let limiter = limiter_at(2, Duration::from_secs(60), now.clone());

        limiter.admit("ip-1");
        limiter.admit("ip-1");
        assert!(!limiter.admit("ip-1").allowed);

        *now.lock().expect("test clock") += Duration::from_secs(61);
        let decision = limiter.admit("ip-1");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[test]
    fn keys_are_counted_independently() {
        let now = Arc::new(Mutex::new(Instant::now()));
        let limiter = limiter_at(1, Duration::from_secs(60), now);

        assert!(limiter.admit("ip-1").allowed);
        assert!(!limiter.admit("ip-1").allowed);
        assert!(limiter.admit("ip-2").allowed);
    }
}
