//! Pairing rows by their first label.

use dpe_dom::value::names;
use dpe_dom::{
    attribute, children, node_name, nodes, push_child, semantic_eq, set_attribute, VALUE_ATTRIBUTE,
};
use serde_json::{json, Value};

use crate::aggregate::{AggregateRow, RowAggregatePolicy, RowAggregateAdapter};

/// Editor type of the property editor shown for rows whose sources disagree.
pub const VALUES_DIFFER: &str = "ValuesDiffer";

/// Identifies rows by the `Value` of their first `Label` child and compares
/// contributions with [`semantic_eq`].
///
/// Rows without a label never pair up with rows of other sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabeledRowPolicy;

impl LabeledRowPolicy {
    pub fn first_label(row: &Value) -> Option<&str> {
        children(row)
            .iter()
            .find(|child| node_name(child) == Some(names::LABEL))
            .and_then(|label| attribute(label, VALUE_ATTRIBUTE))
            .and_then(Value::as_str)
    }
}

impl RowAggregatePolicy for LabeledRowPolicy {
    fn generate_aggregate_row(&self, row: &AggregateRow) -> Value {
        row.representative().cloned().unwrap_or_else(nodes::row)
    }

    fn generate_values_differ_row(&self, row: &AggregateRow) -> Value {
        let label = row
            .representative()
            .and_then(Self::first_label)
            .unwrap_or_default();

        let mut distinct: Vec<&Value> = Vec::new();
        for (_, value) in row.contributors() {
            if !distinct.iter().any(|seen| semantic_eq(seen, value)) {
                distinct.push(value);
            }
        }

        let mut editor = nodes::property_editor(VALUES_DIFFER, Value::Null);
        set_attribute(&mut editor, "DistinctValues", json!(distinct.len()));
        set_attribute(&mut editor, "MissingSources", json!(row.missing_count()));

        let mut differ = nodes::row();
        push_child(&mut differ, nodes::label(label));
        push_child(&mut differ, editor);
        differ
    }

    fn same_row(&self, new_row: &Value, existing_row: &Value) -> bool {
        match (Self::first_label(new_row), Self::first_label(existing_row)) {
            (Some(new_label), Some(existing_label)) => new_label == existing_label,
            _ => false,
        }
    }

    fn values_match(&self, left: &Value, right: &Value) -> bool {
        semantic_eq(left, right)
    }
}

/// Aggregate adapter pairing rows by label.
pub type LabeledRowAggregateAdapter = RowAggregateAdapter<LabeledRowPolicy>;
