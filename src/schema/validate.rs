//! Structural schema validation
//!
//! Applies the decode-time rules to schemas assembled programmatically, so
//! both construction paths meet the same bar before compilation. Implemented
//! as a [`walk_down`] visitor that stops at the first violation.

use super::error::{SchemaError, SchemaResult};
use super::model::{FieldSource, Schema, TagSource, TAG_TEMPLATE_PLACEHOLDER};
use super::walk::{walk_down, Flow, SchemaNode, Visitor};

#[derive(Default)]
struct Validator {
    measurement: String,
    tag: String,
    field: String,
    seen_tags: Vec<String>,
    error: Option<SchemaError>,
}

impl Validator {
    fn fail(&mut self, error: SchemaError) {
        self.error = Some(error);
    }
}

impl Visitor for Validator {
    fn visit(&mut self, node: SchemaNode<'_>) -> Flow {
        if self.error.is_some() {
            return Flow::Prune;
        }

        match node {
            SchemaNode::Measurement(m) => {
                if m.name.is_empty() {
                    self.fail(SchemaError::Schema(
                        "measurement with an empty name".to_string(),
                    ));
                } else if m.fields.is_empty() {
                    self.fail(SchemaError::measurement(
                        &m.name,
                        "must declare at least one field",
                    ));
                } else {
                    self.measurement = m.name.clone();
                    self.seen_tags.clear();
                }
            }
            SchemaNode::Tag(t) => {
                if t.name.is_empty() {
                    self.fail(SchemaError::measurement(
                        &self.measurement,
                        "tag with an empty name",
                    ));
                } else if self.seen_tags.contains(&t.name) {
                    self.fail(SchemaError::tag(
                        &self.measurement,
                        &t.name,
                        "declared more than once",
                    ));
                } else {
                    self.seen_tags.push(t.name.clone());
                    self.tag = t.name.clone();
                }
            }
            SchemaNode::TagSource(source) => match source {
                TagSource::Array(values) => {
                    if values.is_empty() {
                        self.fail(SchemaError::tag(
                            &self.measurement,
                            &self.tag,
                            "empty array source",
                        ));
                    }
                }
                TagSource::Sequence {
                    template, count, ..
                } => {
                    if *count == 0 {
                        self.fail(SchemaError::tag(
                            &self.measurement,
                            &self.tag,
                            "count must be greater than zero",
                        ));
                    } else if !template.contains(TAG_TEMPLATE_PLACEHOLDER) {
                        self.fail(SchemaError::tag(
                            &self.measurement,
                            &self.tag,
                            format!(
                                "format {template:?} is missing the {TAG_TEMPLATE_PLACEHOLDER} placeholder"
                            ),
                        ));
                    }
                }
            },
            SchemaNode::Field(f) => {
                if f.name.is_empty() {
                    self.fail(SchemaError::measurement(
                        &self.measurement,
                        "field with an empty name",
                    ));
                } else if f.count == 0 {
                    self.fail(SchemaError::field(
                        &self.measurement,
                        &f.name,
                        "count must be greater than zero",
                    ));
                } else {
                    self.field = f.name.clone();
                }
            }
            SchemaNode::FieldSource(source) => {
                if let FieldSource::Array(values) = source {
                    if values.is_empty() {
                        self.fail(SchemaError::field(
                            &self.measurement,
                            &self.field,
                            "empty array source",
                        ));
                    }
                }
            }
            _ => {}
        }

        if self.error.is_some() {
            Flow::Prune
        } else {
            Flow::Descend
        }
    }
}

/// Checks a schema against the structural rules enforced during decoding
pub fn validate(schema: &Schema) -> SchemaResult<()> {
    let mut validator = Validator::default();
    walk_down(&mut validator, schema);
    match validator.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
