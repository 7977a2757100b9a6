//! Send scheduling: exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

const DELAY_MIN_MS: u64 = 250;
const DELAY_MAX_MS: u64 = 32_000;
const DELAY_EXPONENT: f64 = 1.1;
const DELAY_STAGGER_FACTOR: u64 = 10;

/// Wait interval between batch sends.
///
/// Grows on every send, clamped to [250ms, 32s], then staggered by up to a
/// tenth of the interval so a fleet of clients does not retry in lockstep.
/// Resets to zero whenever new work is queued so the next send happens
/// immediately instead of waiting out a stale interval from an idle period.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    next_delay_ms: u64,
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current interval, bounding the loop's wait after a send.
    pub fn current(&self) -> Duration {
        Duration::from_millis(self.next_delay_ms)
    }

    /// Zero the interval so the next send happens immediately.
    pub fn reset(&mut self) {
        self.next_delay_ms = 0;
    }

    /// Replace the interval with a server-supplied hint.
    pub fn override_with(&mut self, delay_ms: u64) {
        self.next_delay_ms = delay_ms;
    }

    /// Grow the interval for the next cycle. Called once per send, before
    /// the batch goes out, on the value accumulated from previous cycles.
    pub fn advance(&mut self) {
        let grown = grow(self.next_delay_ms);
        let stagger = rand::thread_rng().gen_range(0..grown / DELAY_STAGGER_FACTOR);
        self.next_delay_ms = grown + stagger;
    }
}

/// Exponential growth clamped to the schedule's bounds.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn grow(delay_ms: u64) -> u64 {
    let grown = (delay_ms as f64).powf(DELAY_EXPONENT) as u64;
    grown.clamp(DELAY_MIN_MS, DELAY_MAX_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_starts_at_the_floor() {
        assert_eq!(grow(0), DELAY_MIN_MS);
        assert_eq!(grow(1), DELAY_MIN_MS);
    }

    #[test]
    fn grow_stays_within_bounds() {
        for delay in [0, 250, 1_000, 10_000, 32_000, 100_000] {
            let grown = grow(delay);
            assert!((DELAY_MIN_MS..=DELAY_MAX_MS).contains(&grown), "grow({delay}) = {grown}");
        }
    }

    #[test]
    fn grow_is_monotonic_below_the_ceiling() {
        let mut delay = DELAY_MIN_MS;
        while delay < DELAY_MAX_MS {
            let grown = grow(delay);
            assert!(grown > delay, "grow({delay}) = {grown} did not increase");
            delay = grown;
        }
        assert_eq!(grow(DELAY_MAX_MS), DELAY_MAX_MS);
    }

    #[test]
    fn advance_adds_bounded_stagger() {
        let mut backoff = Backoff::new();
        for _ in 0..20 {
            backoff.advance();
            let millis = u64::try_from(backoff.current().as_millis()).unwrap();
            assert!(millis >= DELAY_MIN_MS);
            assert!(millis <= DELAY_MAX_MS + DELAY_MAX_MS / DELAY_STAGGER_FACTOR);
        }
    }

    #[test]
    fn advance_is_non_decreasing_before_the_clamp() {
        let mut backoff = Backoff::new();
        let mut previous = 0u128;
        // Growth outpaces the stagger until the interval nears the ceiling.
        for _ in 0..5 {
            backoff.advance();
            let current = backoff.current().as_millis();
            assert!(current >= previous, "{current} < {previous}");
            previous = current;
        }
    }

    #[test]
    fn reset_and_override() {
        let mut backoff = Backoff::new();
        backoff.advance();
        assert!(backoff.current() > Duration::ZERO);

        backoff.reset();
        assert_eq!(backoff.current(), Duration::ZERO);

        backoff.override_with(7_000);
        assert_eq!(backoff.current(), Duration::from_millis(7_000));
    }
}
