//! Fluent construction of adapter documents.

use serde_json::Value;
use thiserror::Error;

use crate::value::{self, names, VALUE_ATTRIBUTE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("{0} node(s) left open")]
    Unclosed(usize),
    #[error("end_{expected} called while a {found} node is open")]
    Mismatched { expected: String, found: String },
    #[error("end called with no open node")]
    NothingOpen,
}

/// Constructors for the standard node kinds.
pub mod nodes {
    use super::*;

    /// The document root, with an empty child list.
    pub fn adapter() -> Value {
        with_children(names::ADAPTER)
    }

    /// An empty row. Rows always carry a `$children` list.
    pub fn row() -> Value {
        with_children(names::ROW)
    }

    pub fn label(text: &str) -> Value {
        let mut node = value::node(names::LABEL);
        value::set_attribute(&mut node, VALUE_ATTRIBUTE, Value::String(text.to_string()));
        node
    }

    /// A property editor of kind `editor_type` displaying `shown`.
    pub fn property_editor(editor_type: &str, shown: Value) -> Value {
        let mut node = value::node(names::PROPERTY_EDITOR);
        value::set_attribute(&mut node, "Type", Value::String(editor_type.to_string()));
        value::set_attribute(&mut node, VALUE_ATTRIBUTE, shown);
        node
    }

    fn with_children(name: &str) -> Value {
        let mut node = value::node(name);
        value::set_attribute(&mut node, value::CHILDREN_KEY, Value::Array(Vec::new()));
        node
    }
}

/// Stack-based builder for an `Adapter` document.
///
/// Errors (unbalanced begin/end pairs) are recorded and reported by
/// [`AdapterBuilder::finish`], so calls can be chained freely.
#[derive(Debug)]
pub struct AdapterBuilder {
    stack: Vec<Value>,
    error: Option<BuildError>,
}

impl Default for AdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterBuilder {
    pub fn new() -> Self {
        Self {
            stack: vec![nodes::adapter()],
            error: None,
        }
    }

    pub fn begin_node(mut self, name: &str) -> Self {
        let mut node = value::node(name);
        value::set_attribute(&mut node, value::CHILDREN_KEY, Value::Array(Vec::new()));
        self.stack.push(node);
        self
    }

    pub fn end_node(mut self) -> Self {
        self.close(None);
        self
    }

    pub fn begin_row(mut self) -> Self {
        self.stack.push(nodes::row());
        self
    }

    pub fn end_row(mut self) -> Self {
        self.close(Some(names::ROW));
        self
    }

    pub fn label(self, text: &str) -> Self {
        self.value(nodes::label(text))
    }

    pub fn property_editor(self, editor_type: &str, value: Value) -> Self {
        self.value(nodes::property_editor(editor_type, value))
    }

    /// Sets an attribute on the innermost open node.
    pub fn attribute(mut self, name: &str, attribute: Value) -> Self {
        if let Some(top) = self.stack.last_mut() {
            value::set_attribute(top, name, attribute);
        }
        self
    }

    /// Appends an arbitrary child to the innermost open node.
    pub fn value(mut self, child: Value) -> Self {
        if let Some(top) = self.stack.last_mut() {
            value::push_child(top, child);
        }
        self
    }

    pub fn finish(mut self) -> Result<Value, BuildError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        match self.stack.len() {
            1 => Ok(self.stack.pop().unwrap_or(Value::Null)),
            n => Err(BuildError::Unclosed(n - 1)),
        }
    }

    fn close(&mut self, expected: Option<&str>) {
        if self.error.is_some() {
            return;
        }
        if self.stack.len() < 2 {
            self.error = Some(BuildError::NothingOpen);
            return;
        }
        let Some(node) = self.stack.pop() else { return };
        if let Some(expected) = expected {
            let found = value::node_name(&node).unwrap_or_default();
            if found != expected {
                self.error = Some(BuildError::Mismatched {
                    expected: expected.to_lowercase(),
                    found: found.to_string(),
                });
                return;
            }
        }
        if let Some(parent) = self.stack.last_mut() {
            value::push_child(parent, node);
        }
    }
}
