//! Schema traversal
//!
//! Visitor-based traversal over the schema tree in two orders:
//!
//! - [`walk_down`]: pre-order, parents before children. The visitor can
//!   return [`Flow::Prune`] to skip a node's subtree.
//! - [`walk_up`]: post-order, children before parents. Used by the spec
//!   compiler to assemble results bottom-up.
//!
//! Node taxonomy:
//!
//! ```text
//! Schema
//! └── Measurements
//!     └── Measurement
//!         ├── Tags
//!         │   └── Tag
//!         │       └── TagSource
//!         └── Fields
//!             └── Field
//!                 └── FieldSource
//! ```

use super::model::{Field, FieldSource, Measurement, Schema, Tag, TagSource};

/// A borrowed view of one node in the schema tree
#[derive(Debug, Clone, Copy)]
pub enum SchemaNode<'a> {
    Schema(&'a Schema),
    Measurements(&'a [Measurement]),
    Measurement(&'a Measurement),
    Tags(&'a [Tag]),
    Tag(&'a Tag),
    TagSource(&'a TagSource),
    Fields(&'a [Field]),
    Field(&'a Field),
    FieldSource(&'a FieldSource),
}

/// Directs [`walk_down`] after a node has been visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue into the node's children
    Descend,
    /// Skip the node's children; siblings are still visited
    Prune,
}

/// Receives nodes during a walk
///
/// The return value is honored by [`walk_down`] only; [`walk_up`] ignores it
/// because by the time a node is visited its subtree is already done.
pub trait Visitor {
    fn visit(&mut self, node: SchemaNode<'_>) -> Flow;
}

impl<F> Visitor for F
where
    F: FnMut(SchemaNode<'_>) -> Flow,
{
    fn visit(&mut self, node: SchemaNode<'_>) -> Flow {
        self(node)
    }
}

/// Visits the schema tree pre-order, honoring [`Flow::Prune`]
pub fn walk_down<V: Visitor>(visitor: &mut V, schema: &Schema) {
    walk(visitor, SchemaNode::Schema(schema), false);
}

/// Visits the schema tree post-order, children before parents
pub fn walk_up<V: Visitor>(visitor: &mut V, schema: &Schema) {
    walk(visitor, SchemaNode::Schema(schema), true);
}

fn walk<V: Visitor>(visitor: &mut V, node: SchemaNode<'_>, up: bool) {
    if !up && visitor.visit(node) == Flow::Prune {
        return;
    }

    match node {
        SchemaNode::Schema(schema) => {
            walk(visitor, SchemaNode::Measurements(&schema.measurements), up);
        }
        SchemaNode::Measurements(measurements) => {
            for m in measurements {
                walk(visitor, SchemaNode::Measurement(m), up);
            }
        }
        SchemaNode::Measurement(measurement) => {
            walk(visitor, SchemaNode::Tags(&measurement.tags), up);
            walk(visitor, SchemaNode::Fields(&measurement.fields), up);
        }
        SchemaNode::Tags(tags) => {
            for t in tags {
                walk(visitor, SchemaNode::Tag(t), up);
            }
        }
        SchemaNode::Tag(tag) => {
            walk(visitor, SchemaNode::TagSource(&tag.source), up);
        }
        SchemaNode::Fields(fields) => {
            for f in fields {
                walk(visitor, SchemaNode::Field(f), up);
            }
        }
        SchemaNode::Field(field) => {
            walk(visitor, SchemaNode::FieldSource(&field.source), up);
        }
        SchemaNode::TagSource(_) | SchemaNode::FieldSource(_) => {}
    }

    if up {
        visitor.visit(node);
    }
}
