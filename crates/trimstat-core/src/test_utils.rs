//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available to other crates through the `test-utils` feature.

use crate::attempt::{Attempt, Outcome};
use crate::trim::StatValue;

// ===========================================================================
// Sequence builders
// ===========================================================================

/// Completed attempts with the given durations.
pub fn times(values: &[f64]) -> Vec<Attempt> {
    values.iter().copied().map(Attempt::solved).collect()
}

/// Attempts where `None` marks a DNF.
pub fn attempts_from(values: &[Option<f64>]) -> Vec<Attempt> {
    values
        .iter()
        .map(|v| v.map_or_else(Attempt::dnf, Attempt::solved))
        .collect()
}

/// Outcomes where `None` marks a DNF.
pub fn outcomes(values: &[Option<f64>]) -> Vec<Outcome> {
    values
        .iter()
        .map(|v| v.map_or(Outcome::Dnf, Outcome::time))
        .collect()
}

/// `count` completed attempts: `start`, `start + step`, ...
pub fn ramp(count: usize, start: f64, step: f64) -> Vec<Attempt> {
    (0..count)
        .map(|i| Attempt::solved(start + step * i as f64))
        .collect()
}

/// `count` attempts of `duration` where every `every`-th one (1-based) is a DNF.
pub fn dnf_every(count: usize, every: usize, duration: f64) -> Vec<Attempt> {
    assert!(every > 0, "dnf_every needs a positive period");
    (1..=count)
        .map(|i| {
            if i % every == 0 {
                Attempt::dnf()
            } else {
                Attempt::solved(duration)
            }
        })
        .collect()
}

// ===========================================================================
// Synthetic logs
// ===========================================================================

/// SplitMix64: deterministic, 8 bytes of state.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// A plausible practice log: durations around `mean` (in milliseconds,
/// quantized to whole units) with roughly `dnf_rate` of attempts failed.
pub fn synthetic_log(count: usize, seed: u64, mean: f64, dnf_rate: f64) -> Vec<Attempt> {
    let mut rng = SplitMix64::new(seed);
    (0..count)
        .map(|_| {
            if rng.next_f64() < dnf_rate {
                Attempt::dnf()
            } else {
                let spread = (rng.next_f64() - 0.5) * mean * 0.6;
                Attempt::solved((mean + spread).round().max(0.0))
            }
        })
        .collect()
}

// ===========================================================================
// Assertions
// ===========================================================================

/// Assert that a statistic is defined and within `tolerance` of `expected`.
#[track_caller]
pub fn assert_stat_approx(actual: StatValue, expected: f64, tolerance: f64) {
    match actual {
        Some(value) => assert!(
            (value - expected).abs() < tolerance,
            "expected ~{expected}, got {value}"
        ),
        None => panic!("expected ~{expected}, got undefined"),
    }
}
