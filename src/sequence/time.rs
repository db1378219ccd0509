//! Time ranges and timestamp sequences
//!
//! Timestamps are `i64` Unix nanoseconds throughout; `chrono` appears only
//! at the edges for parsing and display.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::schema::model::TimePrecision;

/// Half-open time interval `[start, end)` in Unix nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// Creates a time range; panics unless `start < end`
    pub fn new(start: i64, end: i64) -> Self {
        assert!(start < end, "time range start must be before end");
        TimeRange { start, end }
    }

    /// Creates a time range, or None unless `start < end`
    pub fn try_new(start: i64, end: i64) -> Option<Self> {
        (start < end).then_some(TimeRange { start, end })
    }

    /// Converts a datetime pair; None if out of nanosecond range or empty
    pub fn from_datetimes(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        TimeRange::try_new(start.timestamp_nanos_opt()?, end.timestamp_nanos_opt()?)
    }

    /// Whether `ts` falls inside the range
    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Length of the range in nanoseconds
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt3339 = |ns: i64| {
            DateTime::<Utc>::from_timestamp_nanos(ns).to_rfc3339_opts(SecondsFormat::AutoSi, true)
        };
        write!(f, "[{}, {})", fmt3339(self.start), fmt3339(self.end))
    }
}

/// Emits `start + i * delta` for `i = 0, 1, 2, ...` into caller buffers
#[derive(Debug, Clone)]
pub struct TimestampSequence {
    start: i64,
    delta: i64,
    acc: i64,
}

impl TimestampSequence {
    pub fn new(start: i64, delta: i64) -> Self {
        TimestampSequence {
            start,
            delta,
            acc: start,
        }
    }

    /// Rewinds to the first timestamp
    pub fn reset(&mut self) {
        self.acc = self.start;
    }

    /// Writes the next `dest.len()` timestamps
    pub fn fill(&mut self, dest: &mut [i64]) {
        for slot in dest {
            *slot = self.acc;
            self.acc += self.delta;
        }
    }

    pub fn delta(&self) -> i64 {
        self.delta
    }
}

/// Spacing between consecutive points: the range's duration divided evenly
/// by `count`, rounded to the nearest multiple of `precision` (half away
/// from zero)
///
/// The result may round to zero, in which case every point of the series
/// carries the same timestamp. When the division rounds up, the last
/// points of the series land at or past the range's end; the range bounds
/// the raw spacing, not the emitted timestamps.
pub fn point_delta(range: TimeRange, count: u64, precision: TimePrecision) -> i64 {
    debug_assert!(count > 0);
    round_to_multiple(range.duration() / count as i64, precision.as_nanos())
}

fn round_to_multiple(d: i64, m: i64) -> i64 {
    debug_assert!(m > 0);
    debug_assert!(d >= 0);
    let r = d % m;
    if r + r < m {
        d - r
    } else {
        d - r + m
    }
}
