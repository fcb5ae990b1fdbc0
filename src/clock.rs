//! Monotonic time and RFC 3315 §14 randomized jitter.

use std::time::{Duration, Instant};

use rand::Rng;

/// Monotonic clock, abstracted so tests can hold time still.
///
/// Mirrors the real process's `ni_timer_get_time` call in
/// `original_source/dhcp6/device.c`: every scheduling decision reads "now"
/// through this seam instead of calling `Instant::now()` directly.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// `Clock` backed by `std::time::Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A symmetric (or, for the first-Solicit exception, one-sided) jitter
/// window in tenths of a percent of the base timeout, per RFC 3315 §14.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterWindow {
    pub min: f64,
    pub max: f64,
}

impl JitterWindow {
    /// The ordinary `[-0.1, +0.1]` window used by every retransmission
    /// except the first Solicit transmission.
    pub fn symmetric() -> Self {
        JitterWindow {
            min: -0.1,
            max: 0.1,
        }
    }

    /// The `(0, +0.1]` window required for the first Solicit transmission
    /// by RFC 3315 §17.1.2: RAND must be strictly greater than zero so the
    /// first RT is strictly greater than IRT.
    pub fn first_solicit() -> Self {
        JitterWindow { min: 0.0, max: 0.1 }
    }

    /// Sample a RAND factor from this window using `rng`.
    ///
    /// For `first_solicit`, zero is excluded by resampling: `rand`'s
    /// `gen_range` on floats is half-open `[low, high)`, which already
    /// excludes the `min` endpoint when `min == 0.0`... except that still
    /// permits values arbitrarily close to zero, which is correct (RFC 3315
    /// only requires RAND > 0, not bounded away from it). No resampling is
    /// actually needed; `gen_range(0.0..0.1)` already yields `RAND > 0`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min == self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Randomize `base` milliseconds within `window`, rounding to the nearest
/// millisecond and never going below zero.
pub fn randomize_delay<R: Rng + ?Sized>(base_ms: u64, window: JitterWindow, rng: &mut R) -> u64 {
    let rand = window.sample(rng);
    let delta = (base_ms as f64) * rand;
    let result = (base_ms as f64) + delta;
    result.max(0.0).round() as u64
}

/// Compute the first retransmission timeout from IRT, per RFC 3315 §14:
/// `RT = IRT + RAND*IRT`.
pub fn first_rt<R: Rng + ?Sized>(irt_ms: u64, window: JitterWindow, rng: &mut R) -> u64 {
    randomize_delay(irt_ms, window, rng)
}

/// Compute the next retransmission timeout from the previous one, per RFC
/// 3315 §14: `RT = 2*RTprev + RAND*RTprev`.
pub fn next_rt<R: Rng + ?Sized>(rt_prev_ms: u64, window: JitterWindow, rng: &mut R) -> u64 {
    let rand = window.sample(rng);
    let result = (rt_prev_ms as f64) * (2.0 + rand);
    result.max(0.0).round() as u64
}

/// Milliseconds elapsed between `start` and `now`, saturating at zero.
pub fn elapsed_ms(start: Instant, now: Instant) -> u64 {
    now.saturating_duration_since(start).as_millis() as u64
}

/// Hundredths of a second (centiseconds) elapsed between `start` and `now`,
/// clamped to `clamp`. Mirrors `ni_dhcp6_device_uptime`.
pub fn uptime_centiseconds(start: Instant, now: Instant, clamp: u32) -> u32 {
    if now <= start {
        return 0;
    }
    let delta: Duration = now - start;
    let centiseconds = delta.as_secs() * 100 + u64::from(delta.subsec_millis()) / 10;
    centiseconds.min(u64::from(clamp)) as u32
}
