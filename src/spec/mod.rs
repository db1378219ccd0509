//! Compiled generation specs
//!
//! A [`Spec`] is the immutable, compiled form of a schema: a sorted list of
//! per-measurement factories that build fresh sequences on demand. Compiling
//! once and instantiating many generators is the intended pattern; a `Spec`
//! never changes after compilation, so independent generators (including on
//! other threads) can be built from the same one.

mod compile;

use std::path::Path;
use std::sync::Arc;

use crate::schema::{Schema, SchemaResult, TimePrecision};
use crate::sequence::{
    point_delta, CountableSequence, CounterFormatSequence, FieldDataType, StringArraySequence,
    TagsSequence, TimeRange, TimeValues, TimeValuesSequence, TimestampSequence, ValueSequence,
};
use crate::series::{MergedSeriesGenerator, SeriesGenerator};

/// Immutable, compiled form of a schema
#[derive(Debug)]
pub struct Spec {
    /// Cap on the total number of series across all measurements
    pub series_limit: Option<u64>,
    /// One entry per measurement and field, sorted by measurement name
    pub measurements: Vec<MeasurementSpec>,
}

impl Spec {
    /// Validates and compiles a schema
    pub fn from_schema(schema: &Schema) -> SchemaResult<Spec> {
        compile::compile(schema)
    }

    /// Decodes and compiles a schema from TOML text
    pub fn from_toml(text: &str) -> SchemaResult<Spec> {
        Spec::from_schema(&Schema::from_toml(text)?)
    }

    /// Reads, decodes, and compiles a schema file
    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Spec> {
        Spec::from_schema(&Schema::from_path(path)?)
    }

    /// Builds the merged, key-ordered series stream for `range`
    pub fn series_generator(&self, range: TimeRange) -> MergedSeriesGenerator {
        let inputs = self
            .measurements
            .iter()
            .map(|m| m.series_generator(range))
            .collect();
        MergedSeriesGenerator::with_limit(inputs, self.series_limit.unwrap_or(u64::MAX))
    }

    /// Number of series a generator built from this spec will emit
    pub fn series_count(&self) -> u64 {
        let total = self
            .measurements
            .iter()
            .fold(0u64, |acc, m| acc.saturating_add(m.series_count()));
        match self.series_limit {
            Some(limit) => total.min(limit),
            None => total,
        }
    }
}

/// Factory for the series of one measurement and field
#[derive(Debug)]
pub struct MeasurementSpec {
    pub name: String,
    /// Cap on the series this measurement contributes
    pub series_limit: Option<u64>,
    /// Tag value factories, shared by every field of the measurement
    pub tags: Arc<TagsSpec>,
    pub field: FieldValuesSpec,
}

impl MeasurementSpec {
    /// Builds a fresh series generator for `range`
    pub fn series_generator(&self, range: TimeRange) -> SeriesGenerator {
        let tags = self.tags.sequence();
        let values = self.field.sequence(range);
        match self.series_limit {
            Some(limit) => {
                SeriesGenerator::with_limit(&self.name, &self.field.name, tags, values, limit)
            }
            None => SeriesGenerator::new(&self.name, &self.field.name, tags, values),
        }
    }

    /// Number of series this spec will emit
    pub fn series_count(&self) -> u64 {
        let cardinality = self.tags.cardinality();
        match self.series_limit {
            Some(limit) => cardinality.min(limit),
            None => cardinality,
        }
    }

    /// Points per series
    pub fn points_per_series(&self) -> u64 {
        self.field.time.count
    }
}

/// Tag value factories of one measurement, sorted by tag key
#[derive(Debug)]
pub struct TagsSpec {
    pub tags: Vec<TagValuesSpec>,
}

impl TagsSpec {
    /// Builds the cartesian product sequence over all tag values
    pub fn sequence(&self) -> TagsSequence {
        let keys = self.tags.iter().map(|t| t.key.clone()).collect();
        let values = self.tags.iter().map(|t| t.values.build()).collect();
        TagsSequence::new(keys, values)
    }

    /// Product of the per-tag value counts; 1 for an empty tag set
    pub fn cardinality(&self) -> u64 {
        self.tags
            .iter()
            .fold(1u64, |acc, t| acc.saturating_mul(t.values.count()))
    }
}

/// Factory for one tag's value sequence
#[derive(Debug)]
pub struct TagValuesSpec {
    pub key: String,
    pub values: CountableSequenceSpec,
}

/// Factory for a countable string sequence
#[derive(Debug)]
pub enum CountableSequenceSpec {
    /// Fixed values, held sorted and de-duplicated
    Array(Vec<String>),
    /// Zero-padded counter substituted into a template
    Counter {
        template: String,
        start: u64,
        count: u64,
    },
}

impl CountableSequenceSpec {
    /// Builds a fresh sequence positioned at its first value
    pub fn build(&self) -> CountableSequence {
        match self {
            CountableSequenceSpec::Array(values) => {
                CountableSequence::Array(StringArraySequence::new(values.clone()))
            }
            CountableSequenceSpec::Counter {
                template,
                start,
                count,
            } => CountableSequence::Counter(CounterFormatSequence::new(
                template.clone(),
                *start,
                *count,
            )),
        }
    }

    /// Number of values the built sequence will yield
    pub fn count(&self) -> u64 {
        match self {
            CountableSequenceSpec::Array(values) => values.len() as u64,
            CountableSequenceSpec::Counter { count, .. } => *count,
        }
    }
}

/// Per-series timestamp layout: point count and precision
#[derive(Debug, Clone, Copy)]
pub struct TimeSequenceSpec {
    pub count: u64,
    pub precision: TimePrecision,
}

impl TimeSequenceSpec {
    /// Timestamp cursor for one series spanning `range`
    pub fn sequence(&self, range: TimeRange) -> TimestampSequence {
        TimestampSequence::new(range.start, point_delta(range, self.count, self.precision))
    }
}

/// Factory for one field's timestamped values
#[derive(Debug)]
pub struct FieldValuesSpec {
    pub name: String,
    pub time: TimeSequenceSpec,
    pub values: ValuesSpec,
}

impl FieldValuesSpec {
    /// Builds a fresh value sequence for one series of `range`
    pub fn sequence(&self, range: TimeRange) -> TimeValues {
        let timestamps = self.time.sequence(range);
        if timestamps.delta() == 0 {
            tracing::debug!(
                "field {:?}: delta rounded to zero, points will share timestamps",
                self.name
            );
        }
        self.values.build(self.time.count, timestamps)
    }

    pub fn data_type(&self) -> FieldDataType {
        self.values.data_type()
    }
}

/// Typed source of a field's values
#[derive(Debug)]
pub enum ValuesSpec {
    Float(ValueSource<f64>),
    Integer(ValueSource<i64>),
    String(ValueSource<String>),
    Boolean(ValueSource<bool>),
}

/// Constant or cycled-array source for one scalar type
#[derive(Debug)]
pub enum ValueSource<T> {
    Constant(T),
    Array(Vec<T>),
}

impl<T: Clone> ValueSource<T> {
    fn build(&self) -> ValueSequence<T> {
        match self {
            ValueSource::Constant(value) => ValueSequence::constant(value.clone()),
            ValueSource::Array(values) => ValueSequence::array(values.clone()),
        }
    }
}

impl ValuesSpec {
    pub fn data_type(&self) -> FieldDataType {
        match self {
            ValuesSpec::Float(_) => FieldDataType::Float,
            ValuesSpec::Integer(_) => FieldDataType::Integer,
            ValuesSpec::String(_) => FieldDataType::String,
            ValuesSpec::Boolean(_) => FieldDataType::Boolean,
        }
    }

    fn build(&self, count: u64, timestamps: TimestampSequence) -> TimeValues {
        match self {
            ValuesSpec::Float(src) => {
                TimeValues::Float(TimeValuesSequence::new(count, timestamps, src.build()))
            }
            ValuesSpec::Integer(src) => {
                TimeValues::Integer(TimeValuesSequence::new(count, timestamps, src.build()))
            }
            ValuesSpec::String(src) => {
                TimeValues::String(TimeValuesSequence::new(count, timestamps, src.build()))
            }
            ValuesSpec::Boolean(src) => {
                TimeValues::Boolean(TimeValuesSequence::new(count, timestamps, src.build()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Batch;

    const MS: i64 = 1_000_000;

    const ACCEPTANCE_SCHEMA: &str = r#"
title = "acceptance"

[[measurements]]
name = "cpu"
tags = [
    { name = "host", source = ["beta", "alpha"] },
    { name = "core", source = { type = "sequence", format = "c{}", count = 3 } },
]
fields = [
    { name = "usage", count = 10, time-precision = "ms", source = 0.5 },
]
"#;

    #[test]
    fn test_series_stream_matches_schema() {
        let spec = Spec::from_toml(ACCEPTANCE_SCHEMA).unwrap();
        assert_eq!(spec.series_count(), 6);

        let mut gen = spec.series_generator(TimeRange::new(0, 1000 * MS));
        let mut keys = Vec::new();
        while gen.next() {
            keys.push(String::from_utf8(gen.key().to_vec()).unwrap());
            let values = gen.time_values();
            let mut timestamps = Vec::new();
            while values.next_batch() {
                match values.batch() {
                    Batch::Float { timestamps: ts, values: vs } => {
                        timestamps.extend_from_slice(ts);
                        assert!(vs.iter().all(|v| *v == 0.5));
                    }
                    other => panic!("unexpected batch type: {other:?}"),
                }
            }
            let expected: Vec<i64> = (0..10).map(|i| i * 100 * MS).collect();
            assert_eq!(timestamps, expected);
        }

        assert_eq!(keys.len(), 6);
        assert_eq!(keys[0], "cpu,core=c0,host=alpha#usage");
        assert_eq!(keys[5], "cpu,core=c2,host=beta#usage");
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{:?} !< {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_measurement_series_limit() {
        let spec = Spec::from_toml(
            r#"
[[measurements]]
name = "cpu"
series-limit = 4
tags = [
    { name = "host", source = ["a", "b", "c"] },
    { name = "mode", source = ["user", "sys"] },
]
fields = [{ name = "usage", count = 1, source = 0.5 }]
"#,
        )
        .unwrap();
        assert_eq!(spec.series_count(), 4);

        let mut gen = spec.series_generator(TimeRange::new(0, 1000));
        let mut keys = Vec::new();
        while gen.next() {
            keys.push(String::from_utf8(gen.key().to_vec()).unwrap());
        }
        assert_eq!(
            keys,
            vec![
                "cpu,host=a,mode=sys#usage",
                "cpu,host=a,mode=user#usage",
                "cpu,host=b,mode=sys#usage",
                "cpu,host=b,mode=user#usage",
            ]
        );
    }

    #[test]
    fn test_global_series_limit_spans_measurements() {
        let spec = Spec::from_toml(
            r#"
series-limit = 3

[[measurements]]
name = "alpha"
tags = [{ name = "t", source = ["x", "y"] }]
fields = [{ name = "f", count = 1, source = 1 }]

[[measurements]]
name = "beta"
tags = [{ name = "t", source = ["x", "y"] }]
fields = [{ name = "f", count = 1, source = 2 }]
"#,
        )
        .unwrap();
        assert_eq!(spec.series_count(), 3);

        let mut gen = spec.series_generator(TimeRange::new(0, 1000));
        let mut keys = Vec::new();
        while gen.next() {
            keys.push(String::from_utf8(gen.key().to_vec()).unwrap());
        }
        // Global key order puts all of alpha before beta; the cap lands mid-beta.
        assert_eq!(keys, vec!["alpha,t=x#f", "alpha,t=y#f", "beta,t=x#f"]);
    }

    #[test]
    fn test_identical_schemas_generate_identical_streams() {
        let range = TimeRange::new(0, 500 * MS);
        let drain = |spec: &Spec| {
            let mut gen = spec.series_generator(range);
            let mut out: Vec<(Vec<u8>, Vec<i64>, Vec<f64>)> = Vec::new();
            while gen.next() {
                let key = gen.key().to_vec();
                let mut ts = Vec::new();
                let mut vs = Vec::new();
                let values = gen.time_values();
                while values.next_batch() {
                    if let Batch::Float { timestamps, values } = values.batch() {
                        ts.extend_from_slice(timestamps);
                        vs.extend_from_slice(values);
                    }
                }
                out.push((key, ts, vs));
            }
            out
        };

        let a = Spec::from_toml(ACCEPTANCE_SCHEMA).unwrap();
        let b = Spec::from_toml(ACCEPTANCE_SCHEMA).unwrap();
        assert_eq!(drain(&a), drain(&b));
    }

    #[test]
    fn test_spec_reusable_across_ranges() {
        let spec = Spec::from_toml(ACCEPTANCE_SCHEMA).unwrap();
        let mut first = spec.series_generator(TimeRange::new(0, 1000 * MS));
        let mut second = spec.series_generator(TimeRange::new(0, 2000 * MS));
        assert!(first.next());
        assert!(second.next());
        assert_eq!(first.key(), second.key());
    }

    #[test]
    fn test_series_count_saturates_instead_of_overflowing() {
        let spec = Spec::from_toml(
            r#"
[[measurements]]
name = "wide"
tags = [
    { name = "a", source = { type = "sequence", count = 4000000000 } },
    { name = "b", source = { type = "sequence", count = 4000000000 } },
    { name = "c", source = { type = "sequence", count = 4000000000 } },
]
fields = [{ name = "f", count = 1, source = 1 }]
"#,
        )
        .unwrap();
        assert_eq!(spec.series_count(), u64::MAX);
    }

    #[test]
    fn test_points_per_series() {
        let spec = Spec::from_toml(ACCEPTANCE_SCHEMA).unwrap();
        assert_eq!(spec.measurements[0].points_per_series(), 10);
        assert_eq!(spec.measurements[0].field.data_type(), FieldDataType::Float);
    }
}
