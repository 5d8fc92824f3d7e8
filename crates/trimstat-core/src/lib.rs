//! Trimstat Core -- rolling trimmed averages and running records over a
//! chronological log of timed attempts.
//!
//! The crate is a pure function from an ordered attempt sequence to derived
//! numeric series. It owns no state between calls: every pass takes a slice
//! of [`attempt::Attempt`] plus a [`config::RollingConfig`] and returns a
//! fresh [`rolling::RollingSeries`].
//!
//! # Pipeline
//!
//! 1. **Extract** -- each attempt is projected to an [`attempt::Outcome`]
//!    (a measured time or a DNF).
//! 2. **Trim** -- for every position and configured window size, the
//!    trailing window is handed to its [`trim::TrimRule`].
//! 3. **Fold** -- the value series of every statistic (including the raw
//!    single) is folded left to right into a best-so-far series.
//!
//! ```rust,ignore
//! let attempts = vec![Attempt::solved(12.0), Attempt::dnf(), /* ... */];
//! let series = compute_rolling(&attempts, &RollingConfig::default());
//! let ao5 = series.average(5).unwrap();
//! let pbs = record_history(&series);
//! ```
//!
//! # Key Types
//!
//! - [`attempt::Attempt`] -- one timed trial, possibly failed.
//! - [`trim::TrimRule`] -- mean, drop-extremes, and percentage trimming.
//! - [`config::WindowSpec`] -- a window size paired with its trim rule.
//! - [`rolling::RollingSeries`] -- value and best-so-far series per statistic.
//! - [`records::RecordEvent`] -- a position where a best strictly improved.

pub mod attempt;
pub mod config;
pub mod records;
pub mod rolling;
pub mod trim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use attempt::{Attempt, AttemptError, Outcome};
pub use config::{ConfigError, RollingConfig, WindowSpec};
pub use records::{RecordEvent, record_history, records_for};
pub use rolling::{
    RollingSeries, RunningBest, StatKind, StatSeries, compute_default, compute_rolling,
    try_compute_rolling,
};
pub use trim::{StatValue, TrimRule};
