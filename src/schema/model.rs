//! Schema model
//!
//! In-memory representation of a generation schema: measurements, their tag
//! sets, and their fields. A schema is built by decoding a TOML document
//! (`Schema::from_toml`) or assembled programmatically, validated, and then
//! compiled into an immutable [`Spec`](crate::spec::Spec).

use std::fmt;
use std::str::FromStr;

/// Timestamp granularity for a field's generated points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePrecision {
    /// Nanosecond precision
    Nanosecond,
    /// Microsecond precision
    Microsecond,
    /// Millisecond precision (the default)
    #[default]
    Millisecond,
    /// Second precision
    Second,
    /// Minute precision
    Minute,
    /// Hour precision
    Hour,
}

impl TimePrecision {
    /// Number of nanoseconds in one unit of this precision
    pub fn as_nanos(&self) -> i64 {
        match self {
            TimePrecision::Nanosecond => 1,
            TimePrecision::Microsecond => 1_000,
            TimePrecision::Millisecond => 1_000_000,
            TimePrecision::Second => 1_000_000_000,
            TimePrecision::Minute => 60 * 1_000_000_000,
            TimePrecision::Hour => 3_600 * 1_000_000_000,
        }
    }
}

impl FromStr for TimePrecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" | "nanosecond" => Ok(TimePrecision::Nanosecond),
            "us" | "µs" | "microsecond" => Ok(TimePrecision::Microsecond),
            "ms" | "millisecond" => Ok(TimePrecision::Millisecond),
            "s" | "second" => Ok(TimePrecision::Second),
            "m" | "minute" => Ok(TimePrecision::Minute),
            "h" | "hour" => Ok(TimePrecision::Hour),
            other => Err(format!("unknown time precision {other:?}")),
        }
    }
}

impl fmt::Display for TimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimePrecision::Nanosecond => "ns",
            TimePrecision::Microsecond => "us",
            TimePrecision::Millisecond => "ms",
            TimePrecision::Second => "s",
            TimePrecision::Minute => "m",
            TimePrecision::Hour => "h",
        };
        f.write_str(s)
    }
}

/// Root of the schema tree
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Human-readable title, informational only
    pub title: String,
    /// Cap on the total number of series across all measurements
    pub series_limit: Option<u64>,
    /// Measurements to generate, in declaration order
    pub measurements: Vec<Measurement>,
}

/// One measurement: a named tag set plus one or more fields
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    /// Cap on the number of series this measurement contributes
    pub series_limit: Option<u64>,
    pub tags: Vec<Tag>,
    pub fields: Vec<Field>,
}

/// A tag key and the source of its values
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub source: TagSource,
}

/// Where a tag's values come from
#[derive(Debug, Clone, PartialEq)]
pub enum TagSource {
    /// Fixed set of values; sorted and de-duplicated during compilation
    Array(Vec<String>),
    /// `count` strings formed by substituting a zero-padded counter,
    /// starting at `start`, into `template` at the `{}` placeholder
    Sequence {
        template: String,
        start: u64,
        count: u64,
    },
}

/// A field: per-series point count, time precision, and value source
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Number of timestamped values per series; must be positive
    pub count: u64,
    pub time_precision: TimePrecision,
    pub source: FieldSource,
}

/// Where a field's values come from
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// A single scalar repeated for every point
    Constant(ScalarValue),
    /// A homogeneous list of scalars cycled in declaration order
    Array(ScalarArray),
}

/// One scalar of any supported kind
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Float(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
}

/// A homogeneous list of scalars
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarArray {
    Float(Vec<f64>),
    Integer(Vec<i64>),
    String(Vec<String>),
    Boolean(Vec<bool>),
}

impl ScalarArray {
    pub fn len(&self) -> usize {
        match self {
            ScalarArray::Float(v) => v.len(),
            ScalarArray::Integer(v) => v.len(),
            ScalarArray::String(v) => v.len(),
            ScalarArray::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default counter template for sequence tag sources
pub const DEFAULT_TAG_TEMPLATE: &str = "value{}";

/// Placeholder substituted by sequence tag sources
pub const TAG_TEMPLATE_PLACEHOLDER: &str = "{}";
