//! Record history: the positions where a statistic's best strictly improved.

use std::ops::Range;

use serde::Serialize;

use crate::rolling::{RollingSeries, StatKind, StatSeries};

/// A new best for one statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordEvent {
    /// Attempt index at which the record was set.
    pub index: usize,
    pub kind: StatKind,
    pub value: f64,
    /// The best it replaced, `None` for the first defined value.
    pub previous: Option<f64>,
}

impl RecordEvent {
    /// Attempt indices whose results produced this record.
    pub fn window(&self) -> Range<usize> {
        let end = self.index + 1;
        end - self.kind.window_size()..end
    }

    /// How much the record beat the previous best by.
    pub fn improvement(&self) -> Option<f64> {
        self.previous.map(|prev| prev - self.value)
    }
}

/// Records of one statistic, in chronological order.
///
/// Empty if the series does not contain `kind`.
pub fn records_for(series: &RollingSeries, kind: StatKind) -> Vec<RecordEvent> {
    series
        .get(kind)
        .map(|stat| records_in(stat, kind))
        .unwrap_or_default()
}

/// Records of every statistic, ordered by index. Records set on the same
/// attempt list the single first, then averages by window size.
pub fn record_history(series: &RollingSeries) -> Vec<RecordEvent> {
    let mut events: Vec<RecordEvent> = series
        .kinds()
        .flat_map(|kind| records_for(series, kind))
        .collect();
    events.sort_by_key(|event| (event.index, event.kind));
    events
}

fn records_in(stat: &StatSeries, kind: StatKind) -> Vec<RecordEvent> {
    let mut events = Vec::new();
    let mut previous: Option<f64> = None;
    for (index, best) in stat.bests.iter().enumerate() {
        let Some(value) = *best else { continue };
        if previous.is_none_or(|prev| value < prev) {
            events.push(RecordEvent {
                index,
                kind,
                value,
                previous,
            });
            previous = Some(value);
        }
    }
    events
}
