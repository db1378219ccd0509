//! Schema definition, decoding, and traversal
//!
//! A schema declares what to generate: measurements, tag sets, and fields.
//! This module owns the model types, the TOML decoder, structural
//! validation, and the visitor-based tree walks the compiler is built on.

mod decode;
pub mod error;
pub mod model;
pub mod validate;
pub mod walk;

pub use error::{SchemaError, SchemaResult};
pub use model::{
    Field, FieldSource, Measurement, ScalarArray, ScalarValue, Schema, Tag, TagSource,
    TimePrecision, DEFAULT_TAG_TEMPLATE, TAG_TEMPLATE_PLACEHOLDER,
};
pub use validate::validate;
pub use walk::{walk_down, walk_up, Flow, SchemaNode, Visitor};
