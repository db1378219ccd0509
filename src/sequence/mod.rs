//! Sequence algebra
//!
//! The building blocks series are generated from: countable tag value
//! cursors, their cartesian product, timestamp arithmetic, and batch
//! oriented value production. Everything here is deterministic and
//! resettable; nothing allocates per point.

pub mod countable;
pub mod tags;
pub mod time;
pub mod values;

pub use countable::{CountableSequence, CounterFormatSequence, StringArraySequence};
pub use tags::TagsSequence;
pub use time::{point_delta, TimeRange, TimestampSequence};
pub use values::{Batch, FieldDataType, TimeValues, TimeValuesSequence, ValueSequence, BATCH_SIZE};
