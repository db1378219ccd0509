//! TOML schema decoding
//!
//! Decodes the on-disk schema format into the model, attaching the offending
//! measurement, tag, or field name to every error. The `source` key of a tag
//! or field is deliberately untyped in the document (a scalar, an array, or
//! a table), so source payloads are decoded by hand from [`toml::Value`].
//!
//! # Format
//!
//! ```toml
//! title = "demo schema"
//! series-limit = 10000
//!
//! [[measurements]]
//! name = "cpu"
//! tags = [
//!     { name = "host", source = ["alpha", "beta"] },
//!     { name = "core", source = { type = "sequence", format = "core{}", count = 8 } },
//! ]
//! fields = [
//!     { name = "usage", count = 5000, time-precision = "ms", source = 0.5 },
//! ]
//! ```

use std::path::Path;

use serde::Deserialize;

use super::error::{SchemaError, SchemaResult};
use super::model::{
    Field, FieldSource, Measurement, ScalarArray, ScalarValue, Schema, Tag, TagSource,
    TimePrecision, DEFAULT_TAG_TEMPLATE, TAG_TEMPLATE_PLACEHOLDER,
};

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "series-limit")]
    series_limit: Option<i64>,
    #[serde(default)]
    measurements: Vec<RawMeasurement>,
}

#[derive(Debug, Deserialize)]
struct RawMeasurement {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "series-limit")]
    series_limit: Option<i64>,
    #[serde(default)]
    tags: Vec<RawTag>,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    #[serde(default)]
    name: String,
    source: Option<toml::Value>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    #[serde(default)]
    name: String,
    count: Option<i64>,
    #[serde(default, rename = "time-precision")]
    time_precision: Option<String>,
    source: Option<toml::Value>,
}

impl Schema {
    /// Decodes a schema from TOML text
    pub fn from_toml(text: &str) -> SchemaResult<Schema> {
        let raw: RawSchema = toml::from_str(text)?;
        raw.into_schema()
    }

    /// Reads and decodes a schema file
    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Schema> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Schema::from_toml(&text)
    }
}

impl RawSchema {
    fn into_schema(self) -> SchemaResult<Schema> {
        let series_limit = match self.series_limit {
            Some(v) if v < 0 => {
                return Err(SchemaError::Schema(
                    "series-limit must not be negative".to_string(),
                ))
            }
            Some(v) => Some(v as u64),
            None => None,
        };

        let mut measurements = Vec::with_capacity(self.measurements.len());
        for (i, raw) in self.measurements.into_iter().enumerate() {
            if raw.name.is_empty() {
                return Err(SchemaError::Schema(format!(
                    "measurement at index {i} is missing a name"
                )));
            }
            measurements.push(raw.into_measurement()?);
        }

        Ok(Schema {
            title: self.title,
            series_limit,
            measurements,
        })
    }
}

impl RawMeasurement {
    fn into_measurement(self) -> SchemaResult<Measurement> {
        let name = self.name;

        let series_limit = match self.series_limit {
            Some(v) if v < 0 => {
                return Err(SchemaError::measurement(
                    &name,
                    "series-limit must not be negative",
                ))
            }
            Some(v) => Some(v as u64),
            None => None,
        };

        let mut tags: Vec<Tag> = Vec::with_capacity(self.tags.len());
        for (i, raw) in self.tags.into_iter().enumerate() {
            if raw.name.is_empty() {
                return Err(SchemaError::measurement(
                    &name,
                    format!("tag at index {i} is missing a name"),
                ));
            }
            if tags.iter().any(|t| t.name == raw.name) {
                return Err(SchemaError::tag(&name, &raw.name, "declared more than once"));
            }
            let source = match raw.source {
                Some(value) => decode_tag_source(&name, &raw.name, value)?,
                None => return Err(SchemaError::tag(&name, &raw.name, "missing source")),
            };
            tags.push(Tag {
                name: raw.name,
                source,
            });
        }

        if self.fields.is_empty() {
            return Err(SchemaError::measurement(
                &name,
                "must declare at least one field",
            ));
        }
        let mut fields = Vec::with_capacity(self.fields.len());
        for (i, raw) in self.fields.into_iter().enumerate() {
            if raw.name.is_empty() {
                return Err(SchemaError::measurement(
                    &name,
                    format!("field at index {i} is missing a name"),
                ));
            }
            fields.push(raw.into_field(&name)?);
        }

        Ok(Measurement {
            name,
            series_limit,
            tags,
            fields,
        })
    }
}

impl RawField {
    fn into_field(self, measurement: &str) -> SchemaResult<Field> {
        let count = match self.count {
            Some(v) if v <= 0 => {
                return Err(SchemaError::field(
                    measurement,
                    &self.name,
                    "count must be greater than zero",
                ))
            }
            Some(v) => v as u64,
            None => return Err(SchemaError::field(measurement, &self.name, "missing count")),
        };

        let time_precision = match self.time_precision {
            Some(s) => s
                .parse::<TimePrecision>()
                .map_err(|e| SchemaError::field(measurement, &self.name, e))?,
            None => TimePrecision::default(),
        };

        let source = match self.source {
            Some(value) => decode_field_source(measurement, &self.name, value)?,
            None => return Err(SchemaError::field(measurement, &self.name, "missing source")),
        };

        Ok(Field {
            name: self.name,
            count,
            time_precision,
            source,
        })
    }
}

fn decode_tag_source(measurement: &str, tag: &str, value: toml::Value) -> SchemaResult<TagSource> {
    match value {
        toml::Value::Array(items) => {
            if items.is_empty() {
                return Err(SchemaError::tag(measurement, tag, "empty array source"));
            }
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    toml::Value::String(s) => values.push(s),
                    other => {
                        return Err(SchemaError::tag(
                            measurement,
                            tag,
                            format!("array values must be strings, got {}", other.type_str()),
                        ))
                    }
                }
            }
            Ok(TagSource::Array(values))
        }
        toml::Value::Table(table) => decode_tag_sequence(measurement, tag, &table),
        other => Err(SchemaError::tag(
            measurement,
            tag,
            format!("unsupported source ({})", other.type_str()),
        )),
    }
}

fn decode_tag_sequence(
    measurement: &str,
    tag: &str,
    table: &toml::value::Table,
) -> SchemaResult<TagSource> {
    match table.get("type") {
        Some(toml::Value::String(s)) if s == "sequence" => {}
        Some(toml::Value::String(s)) => {
            return Err(SchemaError::tag(
                measurement,
                tag,
                format!("unknown source type {s:?}"),
            ))
        }
        Some(_) | None => {
            return Err(SchemaError::tag(
                measurement,
                tag,
                "source table is missing a type",
            ))
        }
    }

    let template = match table.get("format") {
        Some(toml::Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(SchemaError::tag(
                measurement,
                tag,
                format!("format must be a string, got {}", other.type_str()),
            ))
        }
        None => DEFAULT_TAG_TEMPLATE.to_string(),
    };
    if !template.contains(TAG_TEMPLATE_PLACEHOLDER) {
        return Err(SchemaError::tag(
            measurement,
            tag,
            format!("format {template:?} is missing the {TAG_TEMPLATE_PLACEHOLDER} placeholder"),
        ));
    }

    let start = match table.get("start") {
        Some(toml::Value::Integer(v)) if *v < 0 => {
            return Err(SchemaError::tag(measurement, tag, "start must not be negative"))
        }
        Some(toml::Value::Integer(v)) => *v as u64,
        Some(other) => {
            return Err(SchemaError::tag(
                measurement,
                tag,
                format!("start must be an integer, got {}", other.type_str()),
            ))
        }
        None => 0,
    };

    let count = match table.get("count") {
        Some(toml::Value::Integer(v)) if *v <= 0 => {
            return Err(SchemaError::tag(
                measurement,
                tag,
                "count must be greater than zero",
            ))
        }
        Some(toml::Value::Integer(v)) => *v as u64,
        Some(other) => {
            return Err(SchemaError::tag(
                measurement,
                tag,
                format!("count must be an integer, got {}", other.type_str()),
            ))
        }
        None => return Err(SchemaError::tag(measurement, tag, "missing count")),
    };

    Ok(TagSource::Sequence {
        template,
        start,
        count,
    })
}

fn decode_field_source(
    measurement: &str,
    field: &str,
    value: toml::Value,
) -> SchemaResult<FieldSource> {
    match value {
        toml::Value::Float(v) => Ok(FieldSource::Constant(ScalarValue::Float(v))),
        toml::Value::Integer(v) => Ok(FieldSource::Constant(ScalarValue::Integer(v))),
        toml::Value::String(s) => Ok(FieldSource::Constant(ScalarValue::String(s))),
        toml::Value::Boolean(b) => Ok(FieldSource::Constant(ScalarValue::Boolean(b))),
        toml::Value::Array(items) => decode_field_array(measurement, field, items),
        other => Err(SchemaError::field(
            measurement,
            field,
            format!("unsupported source ({})", other.type_str()),
        )),
    }
}

fn decode_field_array(
    measurement: &str,
    field: &str,
    items: Vec<toml::Value>,
) -> SchemaResult<FieldSource> {
    if items.is_empty() {
        return Err(SchemaError::field(measurement, field, "empty array source"));
    }

    let mismatch = |expected: &str, got: &toml::Value| {
        SchemaError::field(
            measurement,
            field,
            format!(
                "type mismatch in array source: expected {expected}, got {}",
                got.type_str()
            ),
        )
    };

    // The first element fixes the array's type. Integer literals are widened
    // into float arrays; any other mixing is an error.
    let array = match items[0].type_str() {
        "float" => {
            let mut values = Vec::with_capacity(items.len());
            for item in &items {
                match item {
                    toml::Value::Float(v) => values.push(*v),
                    toml::Value::Integer(v) => values.push(*v as f64),
                    other => return Err(mismatch("float", other)),
                }
            }
            ScalarArray::Float(values)
        }
        "integer" => {
            let mut values = Vec::with_capacity(items.len());
            for item in &items {
                match item {
                    toml::Value::Integer(v) => values.push(*v),
                    other => return Err(mismatch("integer", other)),
                }
            }
            ScalarArray::Integer(values)
        }
        "string" => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    toml::Value::String(s) => values.push(s),
                    other => return Err(mismatch("string", &other)),
                }
            }
            ScalarArray::String(values)
        }
        "boolean" => {
            let mut values = Vec::with_capacity(items.len());
            for item in &items {
                match item {
                    toml::Value::Boolean(b) => values.push(*b),
                    other => return Err(mismatch("boolean", other)),
                }
            }
            ScalarArray::Boolean(values)
        }
        other => {
            return Err(SchemaError::field(
                measurement,
                field,
                format!("array values must be float, integer, string, or boolean, got {other}"),
            ))
        }
    };

    Ok(FieldSource::Array(array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL_SCHEMA: &str = r#"
title = "example schema"
series-limit = 100

[[measurements]]
name = "cpu"
series-limit = 10
tags = [
    { name = "host", source = ["gamma", "alpha"] },
    { name = "core", source = { type = "sequence", format = "core-{}", start = 2, count = 8 } },
]
fields = [
    { name = "usage", count = 5000, time-precision = "us", source = [0.5, 0.7, 1] },
    { name = "online", count = 100, source = true },
]

[[measurements]]
name = "mem"
tags = []
fields = [
    { name = "free", count = 10, source = [1024, 2048] },
    { name = "note", count = 2, time-precision = "hour", source = "ok" },
]
"#;

    #[test]
    fn test_decode_full_schema() {
        let schema = Schema::from_toml(FULL_SCHEMA).unwrap();
        assert_eq!(schema.title, "example schema");
        assert_eq!(schema.series_limit, Some(100));
        assert_eq!(schema.measurements.len(), 2);

        let cpu = &schema.measurements[0];
        assert_eq!(cpu.name, "cpu");
        assert_eq!(cpu.series_limit, Some(10));
        assert_eq!(cpu.tags.len(), 2);
        assert_eq!(
            cpu.tags[0].source,
            TagSource::Array(vec!["gamma".to_string(), "alpha".to_string()])
        );
        assert_eq!(
            cpu.tags[1].source,
            TagSource::Sequence {
                template: "core-{}".to_string(),
                start: 2,
                count: 8,
            }
        );
        assert_eq!(cpu.fields.len(), 2);
        assert_eq!(cpu.fields[0].count, 5000);
        assert_eq!(cpu.fields[0].time_precision, TimePrecision::Microsecond);
        // Integer literal widened into the float array.
        assert_eq!(
            cpu.fields[0].source,
            FieldSource::Array(ScalarArray::Float(vec![0.5, 0.7, 1.0]))
        );
        assert_eq!(cpu.fields[1].time_precision, TimePrecision::Millisecond);
        assert_eq!(
            cpu.fields[1].source,
            FieldSource::Constant(ScalarValue::Boolean(true))
        );

        let mem = &schema.measurements[1];
        assert_eq!(mem.series_limit, None);
        assert!(mem.tags.is_empty());
        assert_eq!(
            mem.fields[0].source,
            FieldSource::Array(ScalarArray::Integer(vec![1024, 2048]))
        );
        assert_eq!(mem.fields[1].time_precision, TimePrecision::Hour);
    }

    #[test]
    fn test_decode_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(FULL_SCHEMA.as_bytes()).unwrap();

        let schema = Schema::from_path(&path).unwrap();
        assert_eq!(schema.measurements.len(), 2);
    }

    #[test]
    fn test_decode_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Schema::from_path(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }

    #[test]
    fn test_decode_invalid_toml() {
        let err = Schema::from_toml("measurements = [[").unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }

    #[test]
    fn test_decode_defaults() {
        let schema = Schema::from_toml(
            r#"
[[measurements]]
name = "m0"
tags = [{ name = "t0", source = { type = "sequence", count = 3 } }]
fields = [{ name = "f0", count = 1, source = 1.0 }]
"#,
        )
        .unwrap();
        assert_eq!(schema.title, "");
        assert_eq!(schema.series_limit, None);
        assert_eq!(
            schema.measurements[0].tags[0].source,
            TagSource::Sequence {
                template: "value{}".to_string(),
                start: 0,
                count: 3,
            }
        );
    }

    fn decode_err(text: &str) -> SchemaError {
        Schema::from_toml(text).unwrap_err()
    }

    #[test]
    fn test_decode_negative_series_limit() {
        let err = decode_err("series-limit = -1\nmeasurements = []");
        assert!(err.to_string().contains("series-limit"));

        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
series-limit = -5
fields = [{ name = "f0", count = 1, source = 1.0 }]
"#,
        );
        assert!(matches!(err, SchemaError::Measurement { .. }));
        assert!(err.to_string().contains("m0"));
    }

    #[test]
    fn test_decode_measurement_missing_name() {
        let err = decode_err(
            r#"
[[measurements]]
fields = [{ name = "f0", count = 1, source = 1.0 }]
"#,
        );
        assert!(err.to_string().contains("missing a name"));
    }

    #[test]
    fn test_decode_measurement_without_fields() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
tags = [{ name = "t0", source = ["a"] }]
"#,
        );
        assert!(matches!(err, SchemaError::Measurement { .. }));
        assert!(err.to_string().contains("at least one field"));
    }

    #[test]
    fn test_decode_tag_missing_source() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
tags = [{ name = "t0" }]
fields = [{ name = "f0", count = 1, source = 1.0 }]
"#,
        );
        assert_eq!(
            err.to_string(),
            "tag \"t0\" in measurement \"m0\": missing source"
        );
    }

    #[test]
    fn test_decode_tag_empty_array() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
tags = [{ name = "t0", source = [] }]
fields = [{ name = "f0", count = 1, source = 1.0 }]
"#,
        );
        assert!(err.to_string().contains("empty array source"));
    }

    #[test]
    fn test_decode_tag_non_string_array() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
tags = [{ name = "t0", source = [1, 2] }]
fields = [{ name = "f0", count = 1, source = 1.0 }]
"#,
        );
        assert!(err.to_string().contains("must be strings"));
    }

    #[test]
    fn test_decode_duplicate_tag_name() {
        let err = decode_err(
            r#"
[[measurements]]
name = "cpu"
tags = [
    { name = "host", source = ["a"] },
    { name = "host", source = ["b"] },
]
fields = [{ name = "usage", count = 1, source = 1.0 }]
"#,
        );
        assert_eq!(
            err.to_string(),
            "tag \"host\" in measurement \"cpu\": declared more than once"
        );
    }

    #[test]
    fn test_decode_tag_unknown_source_type() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
tags = [{ name = "t0", source = { type = "file", path = "values.txt" } }]
fields = [{ name = "f0", count = 1, source = 1.0 }]
"#,
        );
        assert!(err.to_string().contains("unknown source type \"file\""));
    }

    #[test]
    fn test_decode_sequence_validation() {
        let base = |source: &str| {
            format!(
                r#"
[[measurements]]
name = "m0"
tags = [{{ name = "t0", source = {source} }}]
fields = [{{ name = "f0", count = 1, source = 1.0 }}]
"#
            )
        };

        let err = decode_err(&base(r#"{ type = "sequence" }"#));
        assert!(err.to_string().contains("missing count"));

        let err = decode_err(&base(r#"{ type = "sequence", count = 0 }"#));
        assert!(err.to_string().contains("count must be greater than zero"));

        let err = decode_err(&base(r#"{ type = "sequence", count = 2, start = -1 }"#));
        assert!(err.to_string().contains("start must not be negative"));

        let err = decode_err(&base(r#"{ type = "sequence", count = 2, format = "static" }"#));
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_decode_field_count_validation() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
fields = [{ name = "f0", source = 1.0 }]
"#,
        );
        assert_eq!(
            err.to_string(),
            "field \"f0\" in measurement \"m0\": missing count"
        );

        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
fields = [{ name = "f0", count = 0, source = 1.0 }]
"#,
        );
        assert!(err.to_string().contains("count must be greater than zero"));
    }

    #[test]
    fn test_decode_field_mixed_array() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
fields = [{ name = "f0", count = 1, source = [1, 2.5] }]
"#,
        );
        assert!(matches!(err, SchemaError::Field { .. }));
        assert!(err.to_string().contains("type mismatch"));

        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
fields = [{ name = "f0", count = 1, source = ["a", true] }]
"#,
        );
        assert!(err.to_string().contains("expected string, got boolean"));
    }

    #[test]
    fn test_decode_field_unsupported_source() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
fields = [{ name = "f0", count = 1, source = { lo = 0, hi = 10 } }]
"#,
        );
        assert!(err.to_string().contains("unsupported source (table)"));
    }

    #[test]
    fn test_decode_bad_precision() {
        let err = decode_err(
            r#"
[[measurements]]
name = "m0"
fields = [{ name = "f0", count = 1, time-precision = "day", source = 1.0 }]
"#,
        );
        assert!(err.to_string().contains("unknown time precision \"day\""));
    }
}
