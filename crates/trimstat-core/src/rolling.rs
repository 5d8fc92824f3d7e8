//! Rolling series: every statistic at every position, plus running bests.
//!
//! One call slides each configured window across the whole sequence and
//! folds the results into a best-so-far series in the same left-to-right
//! pass. Window sizes are independent of each other; with the `parallel`
//! feature they are computed on the rayon pool. A single statistic's fold
//! is always sequential.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::attempt::{Attempt, Outcome, extract_outcomes};
use crate::config::{ConfigError, RollingConfig, WindowSpec};
use crate::trim::StatValue;

// ---------------------------------------------------------------------------
// StatKind
// ---------------------------------------------------------------------------

/// Identifies one statistic in a [`RollingSeries`].
///
/// Orders the single first, then averages by ascending window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StatKind {
    Single,
    Average(usize),
}

impl StatKind {
    /// Number of attempts that contribute to one value of this statistic.
    pub fn window_size(self) -> usize {
        match self {
            StatKind::Single => 1,
            StatKind::Average(size) => size,
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::Single => f.write_str("single"),
            StatKind::Average(size) => write!(f, "ao{size}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RunningBest
// ---------------------------------------------------------------------------

/// Running minimum over a stream of [`StatValue`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningBest {
    best: Option<f64>,
}

impl RunningBest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value in and return the best so far.
    ///
    /// Only a defined value strictly below the current best replaces it.
    pub fn observe(&mut self, value: StatValue) -> StatValue {
        match value {
            Some(v) if self.best.is_none_or(|best| v < best) => self.best = Some(v),
            _ => {}
        }
        self.best
    }

    pub fn get(&self) -> StatValue {
        self.best
    }
}

// ---------------------------------------------------------------------------
// StatSeries
// ---------------------------------------------------------------------------

/// A value series and its best-so-far series, both aligned with the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatSeries {
    pub values: Vec<StatValue>,
    pub bests: Vec<StatValue>,
}

impl StatSeries {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            bests: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: StatValue, best: &mut RunningBest) {
        self.values.push(value);
        self.bests.push(best.observe(value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at the last position.
    pub fn latest(&self) -> StatValue {
        self.values.last().copied().flatten()
    }

    /// Best over the whole sequence.
    pub fn best(&self) -> StatValue {
        self.bests.last().copied().flatten()
    }

    /// Position of the first value equal to the overall best.
    pub fn best_index(&self) -> Option<usize> {
        let best = self.best()?;
        self.values.iter().position(|v| *v == Some(best))
    }
}

// ---------------------------------------------------------------------------
// RollingSeries
// ---------------------------------------------------------------------------

/// Every statistic of one pass, keyed by window size.
///
/// All series have the same length as the attempt sequence they came from;
/// index `i` is the window ending at attempt `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollingSeries {
    pub single: StatSeries,
    pub averages: BTreeMap<usize, StatSeries>,
}

impl RollingSeries {
    pub fn len(&self) -> usize {
        self.single.len()
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty()
    }

    pub fn average(&self, size: usize) -> Option<&StatSeries> {
        self.averages.get(&size)
    }

    pub fn get(&self, kind: StatKind) -> Option<&StatSeries> {
        match kind {
            StatKind::Single => Some(&self.single),
            StatKind::Average(size) => self.average(size),
        }
    }

    /// The single, then each average in ascending window size.
    pub fn kinds(&self) -> impl Iterator<Item = StatKind> + '_ {
        let averages = self.averages.keys().copied().map(StatKind::Average);
        std::iter::once(StatKind::Single).chain(averages)
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute every configured statistic over `attempts`.
///
/// # Panics
///
/// Panics if `config` does not validate. Use [`try_compute_rolling`] when
/// the configuration comes from outside the program.
pub fn compute_rolling(attempts: &[Attempt], config: &RollingConfig) -> RollingSeries {
    if let Err(err) = config.validate() {
        panic!("invalid rolling configuration: {err}");
    }
    compute_validated(attempts, config)
}

/// Like [`compute_rolling`], returning configuration problems as errors.
pub fn try_compute_rolling(
    attempts: &[Attempt],
    config: &RollingConfig,
) -> Result<RollingSeries, ConfigError> {
    config.validate()?;
    Ok(compute_validated(attempts, config))
}

/// ao5, ao12 and ao100 plus the single.
pub fn compute_default(attempts: &[Attempt]) -> RollingSeries {
    compute_validated(attempts, &RollingConfig::default())
}

fn compute_validated(attempts: &[Attempt], config: &RollingConfig) -> RollingSeries {
    tracing::debug!(
        attempts = attempts.len(),
        windows = ?config.sizes().collect::<Vec<_>>(),
        "computing rolling series"
    );

    let outcomes = extract_outcomes(attempts);
    RollingSeries {
        single: single_series(&outcomes),
        averages: all_window_series(&outcomes, &config.windows),
    }
}

#[cfg(not(feature = "parallel"))]
fn all_window_series(outcomes: &[Outcome], windows: &[WindowSpec]) -> BTreeMap<usize, StatSeries> {
    windows
        .iter()
        .map(|spec| (spec.size, window_series(outcomes, spec)))
        .collect()
}

#[cfg(feature = "parallel")]
fn all_window_series(outcomes: &[Outcome], windows: &[WindowSpec]) -> BTreeMap<usize, StatSeries> {
    use rayon::prelude::*;

    windows
        .par_iter()
        .map(|spec| (spec.size, window_series(outcomes, spec)))
        .collect()
}

fn single_series(outcomes: &[Outcome]) -> StatSeries {
    let mut series = StatSeries::with_capacity(outcomes.len());
    let mut best = RunningBest::new();
    for outcome in outcomes {
        series.push(outcome.as_time(), &mut best);
    }
    series
}

/// Slide one window across `outcomes`, folding bests as it goes.
///
/// Positions with fewer than `spec.size` attempts of history are undefined.
///
/// # Panics
///
/// Panics if `spec.size` is zero or too small for its rule.
pub fn window_series(outcomes: &[Outcome], spec: &WindowSpec) -> StatSeries {
    assert!(spec.size > 0, "window size must be at least 1");

    let mut series = StatSeries::with_capacity(outcomes.len());
    let mut best = RunningBest::new();
    for end in 0..outcomes.len() {
        let value = if end + 1 < spec.size {
            None
        } else {
            spec.rule.evaluate(&outcomes[end + 1 - spec.size..=end])
        };
        series.push(value, &mut best);
    }

    tracing::trace!(
        window = spec.size,
        defined = series.values.iter().filter(|v| v.is_some()).count(),
        best = ?series.best(),
        "window series complete"
    );
    series
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::trim::TrimRule;

    // -----------------------------------------------------------------------
    // RunningBest
    // -----------------------------------------------------------------------

    #[test]
    fn running_best_starts_undefined() {
        let mut best = RunningBest::new();
        assert_eq!(best.get(), None);
        assert_eq!(best.observe(None), None);
    }

    #[test]
    fn running_best_keeps_minimum() {
        let mut best = RunningBest::new();
        assert_eq!(best.observe(Some(5.0)), Some(5.0));
        assert_eq!(best.observe(Some(7.0)), Some(5.0));
        assert_eq!(best.observe(None), Some(5.0));
        assert_eq!(best.observe(Some(4.0)), Some(4.0));
        assert_eq!(best.observe(Some(4.0)), Some(4.0));
    }

    // -----------------------------------------------------------------------
    // Rolling series
    // -----------------------------------------------------------------------

    #[test]
    fn empty_sequence_gives_empty_series() {
        let series = compute_default(&[]);
        assert!(series.is_empty());
        assert_eq!(series.averages.len(), 3);
        assert!(series.average(100).unwrap().is_empty());
    }

    #[test]
    fn ao5_example_without_dnf() {
        let series = compute_default(&times(&[12.0, 9.5, 15.2, 9.5, 11.0]));
        let ao5 = series.average(5).unwrap();
        assert_eq!(&ao5.values[..4], &[None, None, None, None]);
        assert_stat_approx(ao5.values[4], 32.5 / 3.0, 1e-9);
        assert_stat_approx(ao5.bests[4], 32.5 / 3.0, 1e-9);
        assert!(series.average(12).unwrap().values.iter().all(Option::is_none));
    }

    #[test]
    fn ao5_example_with_one_dnf() {
        let attempts = attempts_from(&[Some(12.0), None, Some(15.2), Some(9.5), Some(11.0)]);
        let series = compute_default(&attempts);
        assert_stat_approx(series.average(5).unwrap().values[4], 38.2 / 3.0, 1e-9);
    }

    #[test]
    fn ao5_two_dnfs_undefined() {
        let attempts = attempts_from(&[Some(12.0), None, Some(15.2), None, Some(11.0)]);
        let series = compute_default(&attempts);
        assert_eq!(series.average(5).unwrap().values[4], None);
        assert_eq!(series.average(5).unwrap().bests[4], None);
    }

    #[test]
    fn single_series_skips_dnf() {
        let attempts = attempts_from(&[None, Some(10.0), Some(12.0), None, Some(8.0)]);
        let series = compute_default(&attempts);
        assert_eq!(
            series.single.values,
            vec![None, Some(10.0), Some(12.0), None, Some(8.0)]
        );
        assert_eq!(
            series.single.bests,
            vec![None, Some(10.0), Some(10.0), Some(10.0), Some(8.0)]
        );
        assert_eq!(series.single.best_index(), Some(4));
    }

    #[test]
    fn sliding_window_uses_trailing_attempts() {
        let series = compute_rolling(
            &times(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]),
            &RollingConfig::with_sizes(&[3, 5]),
        );
        let ao3 = series.average(3).unwrap();
        assert_stat_approx(ao3.values[2], 2.0, 1e-12);
        assert_stat_approx(ao3.values[5], 109.0 / 3.0, 1e-12);
        assert_stat_approx(ao3.bests[5], 2.0, 1e-12);

        let ao5 = series.average(5).unwrap();
        assert_stat_approx(ao5.values[4], 3.0, 1e-12);
        assert_stat_approx(ao5.values[5], 4.0, 1e-12);
        assert_stat_approx(ao5.bests[5], 3.0, 1e-12);
    }

    #[test]
    fn best_persists_through_disqualified_windows() {
        let mut values = vec![Some(10.0); 5];
        values.extend([None, None]);
        let series = compute_default(&attempts_from(&values));
        let ao5 = series.average(5).unwrap();
        assert_stat_approx(ao5.values[4], 10.0, 1e-12);
        assert_stat_approx(ao5.values[5], 10.0, 1e-12);
        assert_eq!(ao5.values[6], None);
        assert_stat_approx(ao5.bests[6], 10.0, 1e-12);
    }

    #[test]
    fn ao100_defined_from_index_99() {
        let attempts = ramp(120, 1.0, 1.0);
        let series = compute_default(&attempts);
        let ao100 = series.average(100).unwrap();
        assert!(ao100.values[..99].iter().all(Option::is_none));
        // Window 1..=100 keeps 6..=95.
        assert_stat_approx(ao100.values[99], 50.5, 1e-9);
        assert_stat_approx(ao100.bests[119], 50.5, 1e-9);
    }

    #[test]
    fn custom_rule_is_honored() {
        let config = RollingConfig::new(vec![WindowSpec::with_rule(5, TrimRule::Mean)]);
        let series = compute_rolling(&times(&[1.0, 2.0, 3.0, 4.0, 10.0]), &config);
        assert_stat_approx(series.average(5).unwrap().values[4], 4.0, 1e-12);
    }

    #[test]
    fn kinds_are_ordered() {
        let series = compute_rolling(&times(&[1.0]), &RollingConfig::with_sizes(&[100, 5, 12]));
        let kinds: Vec<StatKind> = series.kinds().collect();
        assert_eq!(
            kinds,
            vec![
                StatKind::Single,
                StatKind::Average(5),
                StatKind::Average(12),
                StatKind::Average(100)
            ]
        );
        assert_eq!(StatKind::Average(12).to_string(), "ao12");
        assert_eq!(StatKind::Single.to_string(), "single");
    }

    #[test]
    fn try_compute_reports_bad_config() {
        let err = try_compute_rolling(&times(&[1.0]), &RollingConfig::with_sizes(&[5, 5]));
        assert_eq!(err, Err(ConfigError::DuplicateSize(5)));
    }

    #[test]
    #[should_panic(expected = "invalid rolling configuration")]
    fn compute_panics_on_bad_config() {
        compute_rolling(&times(&[1.0]), &RollingConfig::with_sizes(&[0]));
    }

    #[test]
    #[should_panic(expected = "invalid outcome in window")]
    fn window_series_rejects_corrupt_times() {
        let outcomes = [
            Outcome::Time(1.0),
            Outcome::Time(f64::NAN),
            Outcome::Time(2.0),
            Outcome::Time(3.0),
            Outcome::Time(4.0),
        ];
        window_series(&outcomes, &WindowSpec::new(5));
    }

    #[test]
    fn input_is_left_untouched() {
        let attempts = attempts_from(&[Some(3.0), None, Some(1.0), Some(2.0), Some(5.0)]);
        let before = attempts.clone();
        let first = compute_default(&attempts);
        let second = compute_default(&attempts);
        assert_eq!(attempts, before);
        assert_eq!(first, second);
    }
}
