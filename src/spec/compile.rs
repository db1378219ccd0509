//! Schema compilation
//!
//! Lowers a validated schema into the immutable spec with a post-order walk:
//! each node pops its children's results off an explicit stack and pushes
//! its own. Validation runs first, so by the time the walk starts user input
//! can no longer fail; a stack-shape mismatch here means a bug in the walk
//! itself and panics instead of surfacing as an error.

use std::sync::Arc;

use super::{
    CountableSequenceSpec, FieldValuesSpec, MeasurementSpec, Spec, TagValuesSpec, TagsSpec,
    TimeSequenceSpec, ValueSource, ValuesSpec,
};
use crate::schema::{
    validate, walk_up, FieldSource, Flow, ScalarArray, ScalarValue, Schema, SchemaNode,
    SchemaResult, TagSource, Visitor,
};

pub(super) fn compile(schema: &Schema) -> SchemaResult<Spec> {
    validate(schema)?;

    let mut compiler = Compiler::default();
    walk_up(&mut compiler, schema);
    let spec = compiler.finish(schema.series_limit);

    tracing::debug!(
        "compiled schema {:?} into {} measurement specs",
        schema.title,
        spec.measurements.len()
    );
    Ok(spec)
}

#[derive(Debug)]
enum StackItem {
    TagValues(CountableSequenceSpec),
    Tag(TagValuesSpec),
    Tags(Arc<TagsSpec>),
    FieldValues(ValuesSpec),
    Field(FieldValuesSpec),
    Fields(Vec<FieldValuesSpec>),
    Measurements(Vec<MeasurementSpec>),
}

#[derive(Default)]
struct Compiler {
    stack: Vec<StackItem>,
}

impl Compiler {
    fn finish(mut self, series_limit: Option<u64>) -> Spec {
        let measurements = match self.stack.pop() {
            Some(StackItem::Measurements(m)) if self.stack.is_empty() => m,
            other => panic!("schema compiler: unbalanced stack, top was {other:?}"),
        };
        Spec {
            series_limit,
            measurements,
        }
    }

    fn pop_tag_values(&mut self) -> CountableSequenceSpec {
        match self.stack.pop() {
            Some(StackItem::TagValues(v)) => v,
            other => panic!("schema compiler: expected tag values, found {other:?}"),
        }
    }

    fn pop_tags(&mut self) -> Arc<TagsSpec> {
        match self.stack.pop() {
            Some(StackItem::Tags(t)) => t,
            other => panic!("schema compiler: expected tags spec, found {other:?}"),
        }
    }

    fn pop_field_values(&mut self) -> ValuesSpec {
        match self.stack.pop() {
            Some(StackItem::FieldValues(v)) => v,
            other => panic!("schema compiler: expected field values, found {other:?}"),
        }
    }

    fn pop_fields(&mut self) -> Vec<FieldValuesSpec> {
        match self.stack.pop() {
            Some(StackItem::Fields(f)) => f,
            other => panic!("schema compiler: expected fields, found {other:?}"),
        }
    }

    /// Pops every pending `Tag` item, restoring declaration order
    fn drain_tag_items(&mut self) -> Vec<TagValuesSpec> {
        let mut tags = Vec::new();
        while let Some(StackItem::Tag(_)) = self.stack.last() {
            match self.stack.pop() {
                Some(StackItem::Tag(t)) => tags.push(t),
                _ => unreachable!(),
            }
        }
        tags.reverse();
        tags
    }

    /// Pops every pending `Field` item, restoring declaration order
    fn drain_field_items(&mut self) -> Vec<FieldValuesSpec> {
        let mut fields = Vec::new();
        while let Some(StackItem::Field(_)) = self.stack.last() {
            match self.stack.pop() {
                Some(StackItem::Field(f)) => fields.push(f),
                _ => unreachable!(),
            }
        }
        fields.reverse();
        fields
    }

    /// Pops every pending `Measurements` item, restoring declaration order
    fn drain_measurement_items(&mut self) -> Vec<MeasurementSpec> {
        let mut groups = Vec::new();
        while let Some(StackItem::Measurements(_)) = self.stack.last() {
            match self.stack.pop() {
                Some(StackItem::Measurements(m)) => groups.push(m),
                _ => unreachable!(),
            }
        }
        groups.reverse();
        groups.into_iter().flatten().collect()
    }
}

impl Visitor for Compiler {
    fn visit(&mut self, node: SchemaNode<'_>) -> Flow {
        match node {
            SchemaNode::TagSource(source) => {
                let spec = match source {
                    TagSource::Array(values) => {
                        let mut values = values.clone();
                        values.sort();
                        values.dedup();
                        CountableSequenceSpec::Array(values)
                    }
                    TagSource::Sequence {
                        template,
                        start,
                        count,
                    } => CountableSequenceSpec::Counter {
                        template: template.clone(),
                        start: *start,
                        count: *count,
                    },
                };
                self.stack.push(StackItem::TagValues(spec));
            }
            SchemaNode::Tag(tag) => {
                let values = self.pop_tag_values();
                self.stack.push(StackItem::Tag(TagValuesSpec {
                    key: tag.name.clone(),
                    values,
                }));
            }
            SchemaNode::Tags(_) => {
                let mut tags = self.drain_tag_items();
                tags.sort_by(|a, b| a.key.cmp(&b.key));
                self.stack
                    .push(StackItem::Tags(Arc::new(TagsSpec { tags })));
            }
            SchemaNode::FieldSource(source) => {
                self.stack
                    .push(StackItem::FieldValues(values_spec(source)));
            }
            SchemaNode::Field(field) => {
                let values = self.pop_field_values();
                self.stack.push(StackItem::Field(FieldValuesSpec {
                    name: field.name.clone(),
                    time: TimeSequenceSpec {
                        count: field.count,
                        precision: field.time_precision,
                    },
                    values,
                }));
            }
            SchemaNode::Fields(_) => {
                let fields = self.drain_field_items();
                self.stack.push(StackItem::Fields(fields));
            }
            SchemaNode::Measurement(measurement) => {
                let fields = self.pop_fields();
                let tags = self.pop_tags();
                let mut specs: Vec<MeasurementSpec> = fields
                    .into_iter()
                    .map(|field| MeasurementSpec {
                        name: measurement.name.clone(),
                        series_limit: measurement.series_limit,
                        tags: Arc::clone(&tags),
                        field,
                    })
                    .collect();
                specs.sort_by(|a, b| a.field.name.cmp(&b.field.name));
                self.stack.push(StackItem::Measurements(specs));
            }
            SchemaNode::Measurements(_) => {
                let merged = self.drain_measurement_items();
                self.stack.push(StackItem::Measurements(merged));
            }
            SchemaNode::Schema(_) => {
                let mut measurements = match self.stack.pop() {
                    Some(StackItem::Measurements(m)) => m,
                    other => panic!("schema compiler: expected measurements, found {other:?}"),
                };
                measurements.sort_by(|a, b| a.name.cmp(&b.name));
                self.stack.push(StackItem::Measurements(measurements));
            }
        }
        Flow::Descend
    }
}

fn values_spec(source: &FieldSource) -> ValuesSpec {
    match source {
        FieldSource::Constant(ScalarValue::Float(v)) => {
            ValuesSpec::Float(ValueSource::Constant(*v))
        }
        FieldSource::Constant(ScalarValue::Integer(v)) => {
            ValuesSpec::Integer(ValueSource::Constant(*v))
        }
        FieldSource::Constant(ScalarValue::String(v)) => {
            ValuesSpec::String(ValueSource::Constant(v.clone()))
        }
        FieldSource::Constant(ScalarValue::Boolean(v)) => {
            ValuesSpec::Boolean(ValueSource::Constant(*v))
        }
        FieldSource::Array(ScalarArray::Float(v)) => ValuesSpec::Float(ValueSource::Array(v.clone())),
        FieldSource::Array(ScalarArray::Integer(v)) => {
            ValuesSpec::Integer(ValueSource::Array(v.clone()))
        }
        FieldSource::Array(ScalarArray::String(v)) => {
            ValuesSpec::String(ValueSource::Array(v.clone()))
        }
        FieldSource::Array(ScalarArray::Boolean(v)) => {
            ValuesSpec::Boolean(ValueSource::Array(v.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TimePrecision;

    #[test]
    fn test_measurement_specs_sorted_by_name() {
        let spec = Spec::from_toml(
            r#"
[[measurements]]
name = "zebra"
fields = [{ name = "f", count = 1, source = 1 }]

[[measurements]]
name = "aardvark"
fields = [{ name = "f", count = 1, source = 1 }]
"#,
        )
        .unwrap();
        let names: Vec<&str> = spec.measurements.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["aardvark", "zebra"]);
    }

    #[test]
    fn test_one_spec_per_field_sorted_by_field_name() {
        let spec = Spec::from_toml(
            r#"
[[measurements]]
name = "cpu"
tags = [{ name = "host", source = ["a"] }]
fields = [
    { name = "user", count = 1, source = 0.1 },
    { name = "idle", count = 2, source = 0.9 },
]
"#,
        )
        .unwrap();
        assert_eq!(spec.measurements.len(), 2);
        assert_eq!(spec.measurements[0].field.name, "idle");
        assert_eq!(spec.measurements[1].field.name, "user");
        // Both fields share the measurement's tag spec.
        assert!(Arc::ptr_eq(
            &spec.measurements[0].tags,
            &spec.measurements[1].tags
        ));
    }

    #[test]
    fn test_tags_sorted_by_key() {
        let spec = Spec::from_toml(
            r#"
[[measurements]]
name = "cpu"
tags = [
    { name = "rack", source = ["r1"] },
    { name = "host", source = ["a"] },
]
fields = [{ name = "f", count = 1, source = 1 }]
"#,
        )
        .unwrap();
        let keys: Vec<&str> = spec.measurements[0]
            .tags
            .tags
            .iter()
            .map(|t| t.key.as_str())
            .collect();
        assert_eq!(keys, vec!["host", "rack"]);
    }

    #[test]
    fn test_array_values_normalized() {
        let spec = Spec::from_toml(
            r#"
[[measurements]]
name = "cpu"
tags = [{ name = "host", source = ["c", "a", "c", "b", "a"] }]
fields = [{ name = "f", count = 1, source = 1 }]
"#,
        )
        .unwrap();
        match &spec.measurements[0].tags.tags[0].values {
            CountableSequenceSpec::Array(values) => {
                assert_eq!(values, &["a".to_string(), "b".to_string(), "c".to_string()]);
            }
            other => panic!("unexpected tag values spec: {other:?}"),
        }
        assert_eq!(spec.measurements[0].tags.cardinality(), 3);
    }

    #[test]
    fn test_counter_spec_preserved() {
        let spec = Spec::from_toml(
            r#"
[[measurements]]
name = "cpu"
tags = [{ name = "core", source = { type = "sequence", format = "core-{}", start = 4, count = 12 } }]
fields = [{ name = "f", count = 1, source = 1 }]
"#,
        )
        .unwrap();
        match &spec.measurements[0].tags.tags[0].values {
            CountableSequenceSpec::Counter {
                template,
                start,
                count,
            } => {
                assert_eq!(template, "core-{}");
                assert_eq!(*start, 4);
                assert_eq!(*count, 12);
            }
            other => panic!("unexpected tag values spec: {other:?}"),
        }
    }

    #[test]
    fn test_limits_attached() {
        let spec = Spec::from_toml(
            r#"
series-limit = 100

[[measurements]]
name = "cpu"
series-limit = 7
fields = [{ name = "f", count = 1, source = 1 }]
"#,
        )
        .unwrap();
        assert_eq!(spec.series_limit, Some(100));
        assert_eq!(spec.measurements[0].series_limit, Some(7));
    }

    #[test]
    fn test_field_time_spec_preserved() {
        let spec = Spec::from_toml(
            r#"
[[measurements]]
name = "cpu"
fields = [{ name = "f", count = 42, time-precision = "s", source = ["up", "down"] }]
"#,
        )
        .unwrap();
        let field = &spec.measurements[0].field;
        assert_eq!(field.time.count, 42);
        assert_eq!(field.time.precision, TimePrecision::Second);
        match &field.values {
            ValuesSpec::String(ValueSource::Array(values)) => {
                assert_eq!(values, &["up".to_string(), "down".to_string()]);
            }
            other => panic!("unexpected values spec: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_schema_fails_compilation() {
        let schema = Schema {
            title: String::new(),
            series_limit: None,
            measurements: vec![crate::schema::Measurement {
                name: "cpu".to_string(),
                series_limit: None,
                tags: Vec::new(),
                fields: Vec::new(),
            }],
        };
        assert!(Spec::from_schema(&schema).is_err());
    }

    #[test]
    fn test_duplicate_tag_key_fails_compilation() {
        let schema = Schema {
            title: String::new(),
            series_limit: None,
            measurements: vec![crate::schema::Measurement {
                name: "cpu".to_string(),
                series_limit: None,
                tags: vec![
                    crate::schema::Tag {
                        name: "host".to_string(),
                        source: TagSource::Array(vec!["a".to_string()]),
                    },
                    crate::schema::Tag {
                        name: "host".to_string(),
                        source: TagSource::Array(vec!["b".to_string()]),
                    },
                ],
                fields: vec![crate::schema::Field {
                    name: "usage".to_string(),
                    count: 1,
                    time_precision: TimePrecision::default(),
                    source: FieldSource::Constant(ScalarValue::Integer(1)),
                }],
            }],
        };
        let err = Spec::from_schema(&schema).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_empty_schema_compiles_to_empty_spec() {
        let spec = Spec::from_toml("title = \"nothing\"").unwrap();
        assert!(spec.measurements.is_empty());
        assert_eq!(spec.series_count(), 0);

        let mut gen = spec.series_generator(crate::sequence::TimeRange::new(0, 1000));
        assert!(!gen.next());
    }
}
