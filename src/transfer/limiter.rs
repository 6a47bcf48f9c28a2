// src/transfer/limiter.rs

//! Token-bucket bandwidth limiter on top of `governor`.

use std::num::NonZeroU32;
use std::thread;
use std::time::{Duration, Instant};

use governor::clock::MonotonicClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tracing::trace;

/// Upper bound on tokens replenished per second. Below this cap one token
/// is one byte; above it a token stands for several bytes.
const MAX_TOKENS_PER_SECOND: u64 = 1_000_000;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, MonotonicClock, NoOpMiddleware<Instant>>;

/// Bounds sustained throughput to roughly `max_bytes_per_second`, allowing a
/// burst of one `burst_bytes` chunk.
pub struct BandwidthLimiter {
    inner: Option<Limited>,
}

struct Limited {
    limiter: DirectLimiter,
    bytes_per_token: u64,
    burst: NonZeroU32,
}

impl std::fmt::Debug for BandwidthLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BandwidthLimiter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl BandwidthLimiter {
    /// `max_bytes_per_second == 0` disables limiting.
    pub fn new(max_bytes_per_second: u64, burst_bytes: usize) -> Self {
        if max_bytes_per_second == 0 {
            return Self { inner: None };
        }

        // Replenish period is derived from the exact cap, so no remainder of
        // `max_bytes_per_second / bytes_per_token` is lost to rounding.
        let bytes_per_token = (max_bytes_per_second / MAX_TOKENS_PER_SECOND).max(1);
        let period_nanos = u128::from(bytes_per_token) * NANOS_PER_SECOND
            / u128::from(max_bytes_per_second);
        let period = Duration::from_nanos(u64::try_from(period_nanos).unwrap_or(u64::MAX).max(1));

        let burst_tokens = (burst_bytes as u64).div_ceil(bytes_per_token).max(1);
        let burst = NonZeroU32::new(u32::try_from(burst_tokens).unwrap_or(u32::MAX))
            .unwrap_or(NonZeroU32::MIN);

        let Some(quota) = Quota::with_period(period) else {
            return Self { inner: None };
        };
        let quota = quota.allow_burst(burst);

        Self {
            inner: Some(Limited {
                limiter: RateLimiter::direct_with_clock(quota, MonotonicClock),
                bytes_per_token,
                burst,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Block the current thread until `bytes` may be transferred.
    pub fn wait_for_capacity(&self, bytes: usize) {
        let Some(inner) = &self.inner else {
            return;
        };

        let mut needed = (bytes as u64).div_ceil(inner.bytes_per_token).max(1);
        while needed > 0 {
            let take = needed.min(u64::from(inner.burst.get()));
            let Some(tokens) = NonZeroU32::new(take as u32) else {
                break;
            };
            loop {
                match inner.limiter.check_n(tokens) {
                    Ok(Ok(())) => break,
                    Ok(Err(not_until)) => {
                        let wait = not_until.wait_time_from(Instant::now());
                        trace!(?wait, "throttling transfer");
                        thread::sleep(wait);
                    }
                    // Unreachable: `take` never exceeds the burst size.
                    Err(_) => break,
                }
            }
            needed -= take;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_cap_disables_limiting() {
        let limiter = BandwidthLimiter::new(0, 4096);
        assert!(!limiter.is_enabled());

        let start = Instant::now();
        limiter.wait_for_capacity(100 * 1024 * 1024);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn first_chunk_passes_as_burst() {
        let limiter = BandwidthLimiter::new(1024 * 1024, 64 * 1024);
        let start = Instant::now();
        limiter.wait_for_capacity(64 * 1024);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn sustained_rate_is_bounded() {
        // 8 KiB/s with 8 KiB chunks: the first chunk is free, the next two
        // need about a second each.
        let limiter = BandwidthLimiter::new(8 * 1024, 8 * 1024);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait_for_capacity(8 * 1024);
        }
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[test]
    fn odd_cap_is_not_rounded_down() {
        // 1999 B/s must not degrade to 1000 B/s: 3900 bytes past the burst
        // take about 1.95 s, not 3.9 s.
        let limiter = BandwidthLimiter::new(1999, 100);
        let start = Instant::now();
        for _ in 0..40 {
            limiter.wait_for_capacity(100);
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1700), "too fast: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(3000), "too slow: {elapsed:?}");
    }

    #[test]
    fn large_caps_group_bytes_per_token() {
        let limiter = BandwidthLimiter::new(20 * 1024 * 1024, 64 * 1024);
        let inner = limiter.inner.as_ref().unwrap();
        assert_eq!(inner.bytes_per_token, 20);
        assert_eq!(inner.burst.get(), 3277);
    }

    #[test]
    fn tiny_caps_still_make_progress() {
        let limiter = BandwidthLimiter::new(10, 10);
        let start = Instant::now();
        limiter.wait_for_capacity(10);
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
