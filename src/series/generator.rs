//! Per-measurement series generation
//!
//! A [`SeriesGenerator`] walks one measurement and field through every tag
//! combination in ascending key order, lazily. Advancing rebuilds the series
//! key and rewinds the value sequence, so each series starts its timestamps
//! and value cycle from the beginning. An optional limit caps how many of
//! the combinations are emitted.

use crate::sequence::{TagsSequence, TimeValues};

/// Cursor over the series of one measurement and field
#[derive(Debug)]
pub struct SeriesGenerator {
    measurement: String,
    field: String,
    tags: TagsSequence,
    values: TimeValues,
    remaining: u64,
    key: Vec<u8>,
}

impl SeriesGenerator {
    /// Generator over every tag combination
    pub fn new(
        measurement: impl Into<String>,
        field: impl Into<String>,
        tags: TagsSequence,
        values: TimeValues,
    ) -> Self {
        SeriesGenerator::with_limit(measurement, field, tags, values, u64::MAX)
    }

    /// Generator over at most `limit` tag combinations
    pub fn with_limit(
        measurement: impl Into<String>,
        field: impl Into<String>,
        tags: TagsSequence,
        values: TimeValues,
        limit: u64,
    ) -> Self {
        let measurement = measurement.into();
        let field = field.into();
        let key = Vec::with_capacity(measurement.len() + field.len() + 64);
        SeriesGenerator {
            measurement,
            field,
            tags,
            values,
            remaining: limit,
            key,
        }
    }

    /// Advances to the next series; false forever once exhausted
    pub fn next(&mut self) -> bool {
        if self.remaining == 0 || !self.tags.next() {
            return false;
        }
        self.remaining -= 1;
        self.rebuild_key();
        self.values.reset();
        true
    }

    fn rebuild_key(&mut self) {
        self.key.clear();
        self.key.extend_from_slice(self.measurement.as_bytes());
        self.tags.write_key(&mut self.key);
        self.key.push(b'#');
        self.key.extend_from_slice(self.field.as_bytes());
    }

    /// Key of the current series; only valid after `next()` returned true
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Tag pairs of the current series
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.pairs()
    }

    /// Value sequence of the current series
    pub fn time_values(&mut self) -> &mut TimeValues {
        &mut self.values
    }
}
