//! Node conventions layered over `serde_json::Value`.

use serde_json::{Map, Value};

/// Key holding the node name.
pub const TYPE_KEY: &str = "$type";
/// Key holding the ordered child list of a node.
pub const CHILDREN_KEY: &str = "$children";
/// Attribute carrying the displayed value of labels and property editors.
pub const VALUE_ATTRIBUTE: &str = "Value";

/// Well-known node names.
pub mod names {
    pub const ADAPTER: &str = "Adapter";
    pub const ROW: &str = "Row";
    pub const LABEL: &str = "Label";
    pub const PROPERTY_EDITOR: &str = "PropertyEditor";
}

/// Creates an empty node named `name`.
pub fn node(name: &str) -> Value {
    let mut map = Map::new();
    map.insert(TYPE_KEY.to_string(), Value::String(name.to_string()));
    Value::Object(map)
}

/// Returns the node name, if `value` is a node.
pub fn node_name(value: &Value) -> Option<&str> {
    value.as_object()?.get(TYPE_KEY)?.as_str()
}

pub fn is_node(value: &Value) -> bool {
    node_name(value).is_some()
}

/// Returns true if `value` is a `Row` node.
pub fn is_row(value: &Value) -> bool {
    node_name(value) == Some(names::ROW)
}

/// Returns the children of a node, or an empty slice for anything else.
pub fn children(value: &Value) -> &[Value] {
    value
        .as_object()
        .and_then(|map| map.get(CHILDREN_KEY))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Mutable child list of a node, created on demand.
///
/// Returns `None` when `value` is not an object or its `$children` entry is
/// not an array.
pub fn children_mut(value: &mut Value) -> Option<&mut Vec<Value>> {
    let map = value.as_object_mut()?;
    map.entry(CHILDREN_KEY.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
}

/// Appends `child` to the node's child list. Non-object values are left
/// untouched.
pub fn push_child(node: &mut Value, child: Value) {
    if let Some(list) = children_mut(node) {
        list.push(child);
    }
}

pub fn attribute<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.as_object()?.get(name)
}

pub fn set_attribute(node: &mut Value, name: &str, attribute: Value) {
    if let Value::Object(map) = node {
        map.insert(name.to_string(), attribute);
    }
}

/// Returns a copy of `row` with its nested rows removed.
///
/// The result contains only the row's own content (attributes, labels,
/// editors), which is what matching and row generation compare.
pub fn comparison_row(row: &Value) -> Value {
    let mut out = row.clone();
    if let Some(Value::Array(list)) = out.as_object_mut().and_then(|m| m.get_mut(CHILDREN_KEY)) {
        list.retain(|child| !is_row(child));
    }
    out
}

/// Structural equality that compares numbers by value and ignores object key
/// order, so `1` and `1.0` are equal.
pub fn semantic_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
                return x == y;
            }
            a.as_f64() == b.as_f64()
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| semantic_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| semantic_eq(x, y)))
        }
        _ => left == right,
    }
}
