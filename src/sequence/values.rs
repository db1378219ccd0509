//! Field value sequences
//!
//! Batch-oriented production of timestamped values. A [`TimeValuesSequence`]
//! pairs a timestamp sequence with a typed value sequence and materializes
//! up to [`BATCH_SIZE`] points at a time into internal buffers, so memory
//! stays bounded no matter how many points a series carries. [`TimeValues`]
//! erases the scalar type for callers that only route batches.

use std::fmt;

use super::time::TimestampSequence;

/// Number of points prepared per `next_batch` call
pub const BATCH_SIZE: usize = 1000;

/// Scalar kind of a field's generated values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDataType {
    Float,
    Integer,
    String,
    Boolean,
}

impl fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldDataType::Float => "float",
            FieldDataType::Integer => "integer",
            FieldDataType::String => "string",
            FieldDataType::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// Produces a field's values in order
#[derive(Debug, Clone)]
pub enum ValueSequence<T> {
    /// One value repeated for every point
    Constant(T),
    /// Values cycled in declaration order, continuing across batches
    Array { values: Vec<T>, index: usize },
}

impl<T: Clone> ValueSequence<T> {
    pub fn constant(value: T) -> Self {
        ValueSequence::Constant(value)
    }

    pub fn array(values: Vec<T>) -> Self {
        debug_assert!(!values.is_empty());
        ValueSequence::Array { values, index: 0 }
    }

    /// Rewinds the cycle to the first value
    pub fn reset(&mut self) {
        if let ValueSequence::Array { index, .. } = self {
            *index = 0;
        }
    }

    /// Writes the next `dest.len()` values
    pub fn fill(&mut self, dest: &mut [T]) {
        match self {
            ValueSequence::Constant(value) => {
                for slot in dest {
                    slot.clone_from(value);
                }
            }
            ValueSequence::Array { values, index } => {
                for slot in dest {
                    slot.clone_from(&values[*index]);
                    *index = (*index + 1) % values.len();
                }
            }
        }
    }
}

/// Lazily produces one series' timestamped values, batch by batch
#[derive(Debug)]
pub struct TimeValuesSequence<T> {
    timestamps: TimestampSequence,
    values: ValueSequence<T>,
    ts_buf: Vec<i64>,
    val_buf: Vec<T>,
    count: u64,
    remaining: u64,
}

impl<T: Clone + Default> TimeValuesSequence<T> {
    pub fn new(count: u64, timestamps: TimestampSequence, values: ValueSequence<T>) -> Self {
        let cap = count.min(BATCH_SIZE as u64) as usize;
        TimeValuesSequence {
            timestamps,
            values,
            ts_buf: Vec::with_capacity(cap),
            val_buf: Vec::with_capacity(cap),
            count,
            remaining: count,
        }
    }

    /// Rewinds both cursors so the sequence can serve the next series
    pub fn reset(&mut self) {
        self.timestamps.reset();
        self.values.reset();
        self.remaining = self.count;
    }

    /// Prepares the next batch; false once the series is spent
    pub fn next_batch(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        let n = self.remaining.min(BATCH_SIZE as u64) as usize;
        self.ts_buf.resize(n, 0);
        self.val_buf.resize(n, T::default());
        self.timestamps.fill(&mut self.ts_buf);
        self.values.fill(&mut self.val_buf);
        self.remaining -= n as u64;
        true
    }

    /// Timestamps of the current batch
    pub fn timestamps(&self) -> &[i64] {
        &self.ts_buf
    }

    /// Values of the current batch
    pub fn values(&self) -> &[T] {
        &self.val_buf
    }

    /// Points per series
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// A series value sequence with the scalar type erased
#[derive(Debug)]
pub enum TimeValues {
    Float(TimeValuesSequence<f64>),
    Integer(TimeValuesSequence<i64>),
    String(TimeValuesSequence<String>),
    Boolean(TimeValuesSequence<bool>),
}

impl TimeValues {
    pub fn reset(&mut self) {
        match self {
            TimeValues::Float(s) => s.reset(),
            TimeValues::Integer(s) => s.reset(),
            TimeValues::String(s) => s.reset(),
            TimeValues::Boolean(s) => s.reset(),
        }
    }

    pub fn next_batch(&mut self) -> bool {
        match self {
            TimeValues::Float(s) => s.next_batch(),
            TimeValues::Integer(s) => s.next_batch(),
            TimeValues::String(s) => s.next_batch(),
            TimeValues::Boolean(s) => s.next_batch(),
        }
    }

    /// Typed view of the current batch
    pub fn batch(&self) -> Batch<'_> {
        match self {
            TimeValues::Float(s) => Batch::Float {
                timestamps: s.timestamps(),
                values: s.values(),
            },
            TimeValues::Integer(s) => Batch::Integer {
                timestamps: s.timestamps(),
                values: s.values(),
            },
            TimeValues::String(s) => Batch::String {
                timestamps: s.timestamps(),
                values: s.values(),
            },
            TimeValues::Boolean(s) => Batch::Boolean {
                timestamps: s.timestamps(),
                values: s.values(),
            },
        }
    }

    pub fn data_type(&self) -> FieldDataType {
        match self {
            TimeValues::Float(_) => FieldDataType::Float,
            TimeValues::Integer(_) => FieldDataType::Integer,
            TimeValues::String(_) => FieldDataType::String,
            TimeValues::Boolean(_) => FieldDataType::Boolean,
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            TimeValues::Float(s) => s.count(),
            TimeValues::Integer(s) => s.count(),
            TimeValues::String(s) => s.count(),
            TimeValues::Boolean(s) => s.count(),
        }
    }
}

/// Borrowed view of one prepared batch
#[derive(Debug, Clone, Copy)]
pub enum Batch<'a> {
    Float {
        timestamps: &'a [i64],
        values: &'a [f64],
    },
    Integer {
        timestamps: &'a [i64],
        values: &'a [i64],
    },
    String {
        timestamps: &'a [i64],
        values: &'a [String],
    },
    Boolean {
        timestamps: &'a [i64],
        values: &'a [bool],
    },
}

impl<'a> Batch<'a> {
    pub fn timestamps(&self) -> &'a [i64] {
        match self {
            Batch::Float { timestamps, .. }
            | Batch::Integer { timestamps, .. }
            | Batch::String { timestamps, .. }
            | Batch::Boolean { timestamps, .. } => timestamps,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps().is_empty()
    }
}
