//! Schema error types
//!
//! Defines all errors raised while reading, decoding, or validating a schema.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a schema or compiling it into a spec
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Reading the schema file failed
    #[error("failed to read schema {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML
    #[error("invalid schema document: {0}")]
    Parse(#[from] toml::de::Error),

    /// A schema-level rule was violated
    #[error("schema: {0}")]
    Schema(String),

    /// A measurement-level rule was violated
    #[error("measurement {name:?}: {reason}")]
    Measurement { name: String, reason: String },

    /// A tag-level rule was violated
    #[error("tag {tag:?} in measurement {measurement:?}: {reason}")]
    Tag {
        measurement: String,
        tag: String,
        reason: String,
    },

    /// A field-level rule was violated
    #[error("field {field:?} in measurement {measurement:?}: {reason}")]
    Field {
        measurement: String,
        field: String,
        reason: String,
    },
}

impl SchemaError {
    /// Measurement-level error with the offending measurement's name attached
    pub fn measurement(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Measurement {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Tag-level error with measurement and tag names attached
    pub fn tag(
        measurement: impl Into<String>,
        tag: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::Tag {
            measurement: measurement.into(),
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    /// Field-level error with measurement and field names attached
    pub fn field(
        measurement: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::Field {
            measurement: measurement.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::tag("cpu", "host", "missing source");
        assert_eq!(err.to_string(), "tag \"host\" in measurement \"cpu\": missing source");

        let err = SchemaError::field("cpu", "usage", "count must be greater than zero");
        assert_eq!(
            err.to_string(),
            "field \"usage\" in measurement \"cpu\": count must be greater than zero"
        );

        let err = SchemaError::Schema("series-limit must not be negative".to_string());
        assert_eq!(err.to_string(), "schema: series-limit must not be negative");
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse = toml::from_str::<toml::Value>("not = = toml").unwrap_err();
        let err: SchemaError = parse.into();
        assert!(matches!(err, SchemaError::Parse(_)));
    }
}
