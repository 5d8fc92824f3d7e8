//! Window trimming: the averaging rules applied to one window of outcomes.
//!
//! Three rules exist, chosen per window size:
//!
//! - [`TrimRule::Mean`] -- plain mean, no trimming. Any DNF disqualifies.
//! - [`TrimRule::DropExtremes`] -- drop the single fastest and single slowest
//!   value. One DNF is tolerated and counts as the slowest.
//! - [`TrimRule::Percent`] -- drop a percentage of values from each end.
//!   DNFs are counted against the slow-side budget.
//!
//! Every rejection is an ordinary `None` result. Only malformed calls (empty
//! windows, windows too small for their rule) panic.

use serde::{Deserialize, Serialize};

use crate::attempt::{Outcome, validate_duration};

/// The result of one statistic at one position. `None` means undefined:
/// not enough history, or disqualified by DNFs. Never NaN or infinite.
pub type StatValue = Option<f64>;

// ---------------------------------------------------------------------------
// TrimRule
// ---------------------------------------------------------------------------

/// How a window of outcomes is reduced to a single average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimRule {
    /// Arithmetic mean of the whole window.
    Mean,
    /// Remove one fastest and one slowest value.
    DropExtremes,
    /// Remove `floor(size * p / 100)` values from each end.
    Percent(u8),
}

impl TrimRule {
    /// Percentage trimmed from each end of large windows.
    pub const DEFAULT_PERCENT: u8 = 5;

    /// Smallest window size that switches to percentage trimming.
    pub const PERCENT_THRESHOLD: usize = 100;

    /// The conventional rule for a window of `size` attempts.
    pub fn for_size(size: usize) -> Self {
        match size {
            0..=3 => TrimRule::Mean,
            s if s >= Self::PERCENT_THRESHOLD => TrimRule::Percent(Self::DEFAULT_PERCENT),
            _ => TrimRule::DropExtremes,
        }
    }

    /// Number of values removed from each end of a window of `size`.
    pub fn trim_count(self, size: usize) -> usize {
        match self {
            TrimRule::Mean => 0,
            TrimRule::DropExtremes => 1,
            TrimRule::Percent(p) => size * usize::from(p) / 100,
        }
    }

    /// Evaluate this rule over exactly one window.
    pub fn evaluate(self, window: &[Outcome]) -> StatValue {
        match self {
            TrimRule::Mean => mean_of_all(window),
            TrimRule::DropExtremes => drop_extremes_mean(window),
            TrimRule::Percent(p) => percent_trimmed_mean(window, p),
        }
    }
}

/// Every time in a window must be finite and non-negative, whatever the rule
/// would do with it.
fn assert_valid_times(window: &[Outcome]) {
    for time in window.iter().filter_map(|o| o.as_time()) {
        if let Err(err) = validate_duration(time) {
            panic!("invalid outcome in window: {err}");
        }
    }
}

// ---------------------------------------------------------------------------
// Mean (no trimming)
// ---------------------------------------------------------------------------

/// Mean of every value in the window. A single DNF makes it undefined.
///
/// # Panics
///
/// Panics on an empty window.
pub fn mean_of_all(window: &[Outcome]) -> StatValue {
    assert!(!window.is_empty(), "cannot average an empty window");
    assert_valid_times(window);
    let mut sum = 0.0;
    for outcome in window {
        sum += outcome.as_time()?;
    }
    Some(sum / window.len() as f64)
}

// ---------------------------------------------------------------------------
// Drop extremes (count-based)
// ---------------------------------------------------------------------------

/// Mean after removing the fastest and the slowest value, by index.
///
/// - More than one DNF: undefined.
/// - One DNF: the DNF is the slowest; the first-occurring fastest time is
///   also removed.
/// - No DNF: the first occurrence of the minimum and the first occurrence of
///   the maximum are removed. Other copies of an extreme value stay.
///
/// # Panics
///
/// Panics if the window holds fewer than 3 values.
pub fn drop_extremes_mean(window: &[Outcome]) -> StatValue {
    let size = window.len();
    assert!(size >= 3, "drop-extremes average needs at least 3 values, got {size}");
    assert_valid_times(window);

    let mut dnf_index = None;
    let mut fastest: Option<(usize, f64)> = None;
    let mut slowest: Option<(usize, f64)> = None;

    for (i, outcome) in window.iter().enumerate() {
        match *outcome {
            Outcome::Dnf => {
                if dnf_index.is_some() {
                    return None;
                }
                dnf_index = Some(i);
            }
            Outcome::Time(t) => {
                if fastest.is_none_or(|(_, best)| t < best) {
                    fastest = Some((i, t));
                }
                if slowest.is_none_or(|(_, worst)| t > worst) {
                    slowest = Some((i, t));
                }
            }
        }
    }

    let removed = match (dnf_index, fastest, slowest) {
        (Some(dnf), Some((fast, _)), _) => [fast, dnf],
        // Min and max share an index only when every value ties. Dropping the
        // last copy instead leaves the same multiset behind.
        (None, Some((fast, _)), Some((slow, _))) if fast == slow => [fast, size - 1],
        (None, Some((fast, _)), Some((slow, _))) => [fast, slow],
        _ => unreachable!("a window of {size} with at most one DNF has a fastest time"),
    };

    let sum: f64 = window
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .filter_map(|(_, outcome)| outcome.as_time())
        .sum();
    Some(sum / (size - 2) as f64)
}

/// Sort-based reference for [`drop_extremes_mean`].
///
/// Sorts the valid times and drops the smallest plus, unless a DNF already
/// occupies the slow end, the largest. Agrees with the index-based rule on
/// every input, including duplicated extremes.
///
/// # Panics
///
/// Panics if the window holds fewer than 3 values.
pub fn sorted_drop_extremes_mean(window: &[Outcome]) -> StatValue {
    let size = window.len();
    assert!(size >= 3, "drop-extremes average needs at least 3 values, got {size}");
    assert_valid_times(window);

    let mut times: Vec<f64> = window.iter().filter_map(|o| o.as_time()).collect();
    let dnf_count = size - times.len();
    if dnf_count > 1 {
        return None;
    }
    times.sort_by(f64::total_cmp);

    let slow_trim = 1 - dnf_count;
    let middle = &times[1..times.len() - slow_trim];
    debug_assert_eq!(middle.len(), size - 2);
    Some(middle.iter().sum::<f64>() / middle.len() as f64)
}

// ---------------------------------------------------------------------------
// Percentage trimming
// ---------------------------------------------------------------------------

/// Mean after trimming `percent`% of the window from each end.
///
/// Let `trim = floor(size * percent / 100)`. More than `trim` DNFs makes the
/// result undefined. The `trim` fastest times are always removed; each DNF
/// uses up one slot of the slow-side budget, so only
/// `trim - dnf_count` of the slowest times are removed.
///
/// # Panics
///
/// Panics on an empty window or if `percent >= 50`.
pub fn percent_trimmed_mean(window: &[Outcome], percent: u8) -> StatValue {
    let size = window.len();
    assert!(size > 0, "cannot average an empty window");
    assert!(percent < 50, "trim percentage must be below 50, got {percent}");
    assert_valid_times(window);
    let trim = TrimRule::Percent(percent).trim_count(size);

    let mut times = Vec::with_capacity(size);
    let mut dnf_count = 0usize;
    for outcome in window {
        match outcome.as_time() {
            Some(t) => times.push(t),
            None => dnf_count += 1,
        }
    }

    if dnf_count > trim {
        return None;
    }

    times.sort_by(f64::total_cmp);
    let slow_trim = trim - dnf_count;

    let middle = &times[trim..times.len() - slow_trim];
    Some(middle.iter().sum::<f64>() / middle.len() as f64)
}

// ===========================================================================
// Tests
// ===========================================================================
