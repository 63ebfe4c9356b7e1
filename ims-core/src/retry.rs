use std::time::Duration;

/// Exponential backoff policy shared by the Event Pipeline's `Retry`
/// outcome and the Distributed Cache's compare-and-swap conflict retry.
///
/// The pipeline uses [`Policy::pipeline_default`] (base 1s, factor 2, cap
/// 60s, max 10 attempts); CAS conflicts use [`Policy::cas_default`] (base
/// 1ms, factor 2, cap 10ms, max 3 attempts), both per spec §7.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Policy {
    pub base: Duration,
    pub factor: u32,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Policy {
    pub fn pipeline_default() -> Self {
        Self {
            base: Duration::from_secs(1),
            factor: 2,
            cap: Duration::from_secs(60),
            max_attempts: 10,
        }
    }

    pub fn cas_default() -> Self {
        Self {
            base: Duration::from_millis(1),
            factor: 2,
            cap: Duration::from_millis(10),
            max_attempts: 3,
        }
    }

    /// Backoff delay before the given attempt (1-indexed). Returns `None`
    /// once `max_attempts` has been exhausted.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let exp = self.factor.saturating_pow(attempt - 1);
        let scaled = self.base.saturating_mul(exp);
        Some(scaled.min(self.cap))
    }

    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

/// Deterministic jitter function used instead of `rand` so retry delay
/// tests don't depend on randomness; real callers should mix in an RNG at
/// the call site (e.g. `jittered(delay, rand::random::<u8>())`).
pub fn jittered(delay: Duration, salt: u8) -> Duration {
    let jitter_ms = (salt as u64) % 10;
    delay + Duration::from_millis(jitter_ms)
}
