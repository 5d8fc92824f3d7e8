//! Engine configuration: which window sizes to compute and how to trim them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::rolling::StatKind;
use crate::trim::TrimRule;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A configuration the rolling computer cannot run with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("window size must be at least 1")]
    ZeroSize,
    #[error("window size {0} is configured more than once")]
    DuplicateSize(usize),
    #[error("window size {size} is too small to drop both extremes")]
    TooSmallToTrim { size: usize },
    #[error("trim percentage {percent} for window size {size} must be below 50")]
    PercentTooLarge { size: usize, percent: u8 },
}

// ---------------------------------------------------------------------------
// WindowSpec
// ---------------------------------------------------------------------------

/// A window size paired with the rule that averages it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WindowSpecData", into = "WindowSpecData")]
pub struct WindowSpec {
    pub size: usize,
    pub rule: TrimRule,
}

/// Serialized form; a missing `rule` falls back to [`TrimRule::for_size`].
#[derive(Serialize, Deserialize)]
struct WindowSpecData {
    size: usize,
    #[serde(default)]
    rule: Option<TrimRule>,
}

impl From<WindowSpecData> for WindowSpec {
    fn from(data: WindowSpecData) -> Self {
        Self {
            size: data.size,
            rule: data.rule.unwrap_or_else(|| TrimRule::for_size(data.size)),
        }
    }
}

impl From<WindowSpec> for WindowSpecData {
    fn from(spec: WindowSpec) -> Self {
        Self {
            size: spec.size,
            rule: Some(spec.rule),
        }
    }
}

impl WindowSpec {
    /// A window using the conventional rule for its size.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            rule: TrimRule::for_size(size),
        }
    }

    pub fn with_rule(size: usize, rule: TrimRule) -> Self {
        Self { size, rule }
    }

    /// Display name of the statistic this window produces, e.g. `ao5`.
    pub fn label(&self) -> String {
        self.kind().to_string()
    }

    pub fn kind(&self) -> StatKind {
        StatKind::Average(self.size)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        match self.rule {
            TrimRule::Mean => Ok(()),
            TrimRule::DropExtremes if self.size < 3 => {
                Err(ConfigError::TooSmallToTrim { size: self.size })
            }
            TrimRule::DropExtremes => Ok(()),
            TrimRule::Percent(percent) if percent >= 50 => Err(ConfigError::PercentTooLarge {
                size: self.size,
                percent,
            }),
            TrimRule::Percent(_) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// RollingConfig
// ---------------------------------------------------------------------------

/// The set of windowed statistics computed in one pass. The raw single is
/// always computed and needs no entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingConfig {
    #[serde(default = "default_windows")]
    pub windows: Vec<WindowSpec>,
}

/// ao5, ao12 and ao100.
pub const DEFAULT_WINDOW_SIZES: [usize; 3] = [5, 12, 100];

fn default_windows() -> Vec<WindowSpec> {
    DEFAULT_WINDOW_SIZES.iter().copied().map(WindowSpec::new).collect()
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
        }
    }
}

impl RollingConfig {
    pub fn new(windows: Vec<WindowSpec>) -> Self {
        Self { windows }
    }

    /// One window per size, each with its conventional rule.
    pub fn with_sizes(sizes: &[usize]) -> Self {
        Self::new(sizes.iter().copied().map(WindowSpec::new).collect())
    }

    /// Only the raw single statistic.
    pub fn singles_only() -> Self {
        Self::new(Vec::new())
    }

    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.windows.iter().map(|w| w.size)
    }

    pub fn window(&self, size: usize) -> Option<&WindowSpec> {
        self.windows.iter().find(|w| w.size == size)
    }

    /// Check every window and reject repeated sizes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::with_capacity(self.windows.len());
        for window in &self.windows {
            window.validate()?;
            if !seen.insert(window.size) {
                return Err(ConfigError::DuplicateSize(window.size));
            }
        }
        Ok(())
    }
}
