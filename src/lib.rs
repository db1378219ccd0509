//! # seriesgen
//!
//! Deterministic time-series dataset generation. A declarative TOML schema
//! describes measurements, tag sets, and fields; seriesgen compiles it into
//! an immutable spec and then, for any time range, produces a globally
//! key-ordered stream of series whose timestamped values are generated
//! lazily, batch by batch.
//!
//! ## Features
//!
//! - **Deterministic**: the same schema and time range always produce byte
//!   identical series keys, timestamps, and values
//! - **Lazy**: memory stays bounded by one value batch per active series,
//!   so datasets can run to billions of points
//! - **Ordered**: series arrive in ascending key order across all
//!   measurements, ready for sorted-ingest paths
//! - **Bounded**: per-measurement and global series limits truncate the
//!   stream without changing what comes before the cut
//!
//! ## Modules
//!
//! - [`schema`]: schema model, TOML decoding, validation, tree traversal
//! - [`spec`]: compilation into immutable sequence factories
//! - [`sequence`]: countable tag sequences, cartesian products, timestamp
//!   and value batching
//! - [`series`]: per-measurement generators and the k-way merge
//!
//! ## Quick Start
//!
//! ```rust
//! use seriesgen::{Spec, TimeRange};
//!
//! let spec = Spec::from_toml(r#"
//! [[measurements]]
//! name = "cpu"
//! tags = [{ name = "host", source = ["a", "b"] }]
//! fields = [{ name = "usage", count = 100, source = 0.5 }]
//! "#)?;
//!
//! let mut series = spec.series_generator(TimeRange::new(0, 1_000_000_000));
//! let mut points = 0;
//! while series.next() {
//!     let values = series.time_values();
//!     while values.next_batch() {
//!         points += values.batch().len();
//!     }
//! }
//! assert_eq!(points, 200);
//! # Ok::<(), seriesgen::SchemaError>(())
//! ```

pub mod schema;
pub mod sequence;
pub mod series;
pub mod spec;

// Re-export top-level types for convenience
pub use schema::{Schema, SchemaError, SchemaResult};
pub use sequence::{Batch, FieldDataType, TimeRange, BATCH_SIZE};
pub use series::{MergedSeriesGenerator, SeriesGenerator};
pub use spec::Spec;
