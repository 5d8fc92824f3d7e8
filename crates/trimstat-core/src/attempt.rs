//! Attempts and their projection to the values statistics consume.
//!
//! A failed attempt is never encoded as an extreme number. Every consumer
//! sees an explicit [`Outcome`], and each trim rule decides for itself how
//! DNFs are counted or removed.

use serde::{Deserialize, Serialize};

use crate::trim::StatValue;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a duration cannot describe a completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum AttemptError {
    #[error("attempt duration must be non-negative, got {0}")]
    Negative(f64),
    #[error("attempt duration must be finite, got {0}")]
    NonFinite(f64),
}

pub(crate) fn validate_duration(duration: f64) -> Result<(), AttemptError> {
    if !duration.is_finite() {
        return Err(AttemptError::NonFinite(duration));
    }
    if duration < 0.0 {
        return Err(AttemptError::Negative(duration));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Attempt
// ---------------------------------------------------------------------------

/// One timed trial.
///
/// Attempts are owned by the caller. The engine only reads them and never
/// keeps them beyond a single computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Duration in caller-defined time units. Meaningless when `failed`.
    pub duration: f64,
    /// The attempt did not produce a valid duration (DNF).
    #[serde(default)]
    pub failed: bool,
}

impl Attempt {
    /// A completed attempt.
    ///
    /// # Panics
    ///
    /// Panics if `duration` is negative or non-finite. Use
    /// [`try_solved`](Self::try_solved) for untrusted input.
    pub fn solved(duration: f64) -> Self {
        match Self::try_solved(duration) {
            Ok(attempt) => attempt,
            Err(err) => panic!("invalid attempt: {err}"),
        }
    }

    /// A completed attempt, rejecting durations no clock could produce.
    pub fn try_solved(duration: f64) -> Result<Self, AttemptError> {
        validate_duration(duration)?;
        Ok(Self {
            duration,
            failed: false,
        })
    }

    /// A failed attempt (DNF).
    pub fn dnf() -> Self {
        Self {
            duration: 0.0,
            failed: true,
        }
    }

    pub fn is_dnf(&self) -> bool {
        self.failed
    }

    /// Project this attempt to the value every statistic works with.
    ///
    /// # Panics
    ///
    /// Panics if the attempt is not failed but carries a negative or
    /// non-finite duration. That is a caller contract violation, not
    /// missing data.
    pub fn outcome(&self) -> Outcome {
        if self.failed {
            return Outcome::Dnf;
        }
        if let Err(err) = validate_duration(self.duration) {
            panic!("invalid attempt: {err}");
        }
        Outcome::Time(self.duration)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// A measured duration or a failure. DNF is worse than any finite time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Time(f64),
    Dnf,
}

impl Outcome {
    /// A measured duration.
    ///
    /// # Panics
    ///
    /// Panics if `duration` is negative or non-finite.
    pub fn time(duration: f64) -> Self {
        if let Err(err) = validate_duration(duration) {
            panic!("invalid outcome: {err}");
        }
        Outcome::Time(duration)
    }

    /// The measured duration, or `None` for a DNF.
    #[inline]
    pub fn as_time(self) -> Option<f64> {
        match self {
            Outcome::Time(t) => Some(t),
            Outcome::Dnf => None,
        }
    }

    #[inline]
    pub fn is_dnf(self) -> bool {
        matches!(self, Outcome::Dnf)
    }
}

impl From<Attempt> for Outcome {
    fn from(attempt: Attempt) -> Self {
        attempt.outcome()
    }
}

/// Project a whole sequence in one pass, preserving order.
pub fn extract_outcomes(attempts: &[Attempt]) -> Vec<Outcome> {
    attempts.iter().map(Attempt::outcome).collect()
}

/// The raw single statistic: the duration, or undefined for a DNF.
pub fn single_value(attempt: &Attempt) -> StatValue {
    attempt.outcome().as_time()
}
