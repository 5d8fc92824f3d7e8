//! Serde data file structs for attempt logs.
//!
//! These define the on-disk shape of an attempt. They are deserialized from
//! RON, JSON, or TOML and then validated into engine
//! [`Attempt`](trimstat_core::Attempt)s by the loader.

use serde::Deserialize;

/// One attempt as written in a data file.
///
/// A DNF row may omit `duration`; a completed row may not.
#[derive(Debug, Clone, Deserialize)]
pub struct AttemptData {
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub dnf: bool,
}
