//! Sequential document patches.
//!
//! A [`Patch`] is an ordered list of add / remove / replace operations. Each
//! operation's path is resolved against the document as left by the previous
//! operation. The JSON form follows RFC 6902:
//! `{"op": "add", "path": "/0/1", "value": ...}`.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::path::{get_mut, Path, PathEntry};
use crate::value::CHILDREN_KEY;

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
    #[error("INVALID_TARGET: {0}")]
    InvalidTarget(String),
    #[error("INVALID_OP: {0}")]
    InvalidOp(String),
}

/// A single patch operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOperation {
    Add { path: Path, value: Value },
    Remove { path: Path },
    Replace { path: Path, value: Value },
}

impl PatchOperation {
    pub fn op_name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. } => path,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            PatchOperation::Add { value, .. } | PatchOperation::Replace { value, .. } => {
                Some(value)
            }
            PatchOperation::Remove { .. } => None,
        }
    }

    /// Applies this operation to `doc` in place.
    pub fn apply(&self, doc: &mut Value) -> Result<(), PatchError> {
        match self {
            PatchOperation::Add { path, value } => apply_add(doc, path, value.clone()),
            PatchOperation::Remove { path } => apply_remove(doc, path).map(|_| ()),
            PatchOperation::Replace { path, value } => apply_replace(doc, path, value.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PatchOperation::Add { path, value } => json!({
                "op": "add",
                "path": path.to_string(),
                "value": value
            }),
            PatchOperation::Remove { path } => json!({
                "op": "remove",
                "path": path.to_string()
            }),
            PatchOperation::Replace { path, value } => json!({
                "op": "replace",
                "path": path.to_string(),
                "value": value
            }),
        }
    }

    pub fn from_json(op: &Value) -> Result<Self, PatchError> {
        let map = op
            .as_object()
            .ok_or_else(|| PatchError::InvalidOp("operation must be an object".into()))?;
        let path = decode_path(map)?;
        let name = map
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| PatchError::InvalidOp("missing op".into()))?;
        match name {
            "add" => Ok(PatchOperation::Add {
                path,
                value: decode_value(map)?,
            }),
            "remove" => Ok(PatchOperation::Remove { path }),
            "replace" => Ok(PatchOperation::Replace {
                path,
                value: decode_value(map)?,
            }),
            other => Err(PatchError::InvalidOp(format!("unsupported op: {other}"))),
        }
    }
}

fn decode_path(map: &Map<String, Value>) -> Result<Path, PatchError> {
    map.get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| PatchError::InvalidOp("path must be a string".into()))?
        .parse()
        .map_err(|e| PatchError::InvalidOp(format!("{e}")))
}

fn decode_value(map: &Map<String, Value>) -> Result<Value, PatchError> {
    map.get("value")
        .cloned()
        .ok_or_else(|| PatchError::InvalidOp("missing value".into()))
}

/// An ordered sequence of [`PatchOperation`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    operations: Vec<PatchOperation>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: PatchOperation) {
        self.operations.push(op);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchOperation> {
        self.operations.iter()
    }

    /// Applies every operation in order.
    ///
    /// On error `doc` holds the result of the operations applied so far;
    /// callers wanting all-or-nothing semantics apply to a copy.
    pub fn apply(&self, doc: &mut Value) -> Result<(), PatchError> {
        for op in &self.operations {
            op.apply(doc)?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.operations.iter().map(PatchOperation::to_json).collect())
    }

    pub fn from_json(value: &Value) -> Result<Self, PatchError> {
        let ops = value
            .as_array()
            .ok_or_else(|| PatchError::InvalidOp("patch must be an array".into()))?;
        ops.iter().map(PatchOperation::from_json).collect()
    }
}

impl From<Vec<PatchOperation>> for Patch {
    fn from(operations: Vec<PatchOperation>) -> Self {
        Self { operations }
    }
}

impl FromIterator<PatchOperation> for Patch {
    fn from_iter<I: IntoIterator<Item = PatchOperation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Patch {
    type Item = PatchOperation;
    type IntoIter = std::vec::IntoIter<PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a PatchOperation;
    type IntoIter = std::slice::Iter<'a, PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

// ── Operation applicators ─────────────────────────────────────────────────

fn parent_mut<'a>(doc: &'a mut Value, parent: &[PathEntry]) -> Result<&'a mut Value, PatchError> {
    get_mut(doc, parent).ok_or_else(|| PatchError::NotFound(Path::from(parent).to_string()))
}

/// Child list addressed by an index step: the array itself, or a node's
/// `$children`.
fn child_list_mut(target: &mut Value, create: bool) -> Result<&mut Vec<Value>, PatchError> {
    match target {
        Value::Array(arr) => Ok(arr),
        Value::Object(map) => {
            if create && !map.contains_key(CHILDREN_KEY) {
                map.insert(CHILDREN_KEY.to_string(), Value::Array(Vec::new()));
            }
            match map.get_mut(CHILDREN_KEY) {
                Some(Value::Array(arr)) => Ok(arr),
                Some(_) => Err(PatchError::InvalidTarget(CHILDREN_KEY.into())),
                None => Err(PatchError::NotFound(CHILDREN_KEY.into())),
            }
        }
        other => Err(PatchError::InvalidTarget(format!("{other}"))),
    }
}

fn apply_add(doc: &mut Value, path: &Path, value: Value) -> Result<(), PatchError> {
    let Some((last, parent)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };
    let target = parent_mut(doc, parent)?;
    match last {
        PathEntry::Key(key) => match target {
            Value::Object(map) => {
                map.insert(key.clone(), value);
                Ok(())
            }
            _ => Err(PatchError::InvalidTarget(path.to_string())),
        },
        PathEntry::Index(idx) => {
            let list = child_list_mut(target, true)?;
            if *idx > list.len() {
                return Err(PatchError::InvalidIndex(path.to_string()));
            }
            list.insert(*idx, value);
            Ok(())
        }
        PathEntry::EndOfArray => {
            child_list_mut(target, true)?.push(value);
            Ok(())
        }
    }
}

fn apply_remove(doc: &mut Value, path: &Path) -> Result<Value, PatchError> {
    let Some((last, parent)) = path.split_last() else {
        return Err(PatchError::InvalidTarget("cannot remove the document root".into()));
    };
    let target = parent_mut(doc, parent)?;
    match last {
        PathEntry::Key(key) => match target {
            Value::Object(map) => map
                .shift_remove(key)
                .ok_or_else(|| PatchError::NotFound(path.to_string())),
            _ => Err(PatchError::InvalidTarget(path.to_string())),
        },
        PathEntry::Index(idx) => {
            let list = child_list_mut(target, false)?;
            if *idx >= list.len() {
                return Err(PatchError::NotFound(path.to_string()));
            }
            Ok(list.remove(*idx))
        }
        PathEntry::EndOfArray => Err(PatchError::InvalidIndex(path.to_string())),
    }
}

fn apply_replace(doc: &mut Value, path: &Path, value: Value) -> Result<(), PatchError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let slot = get_mut(doc, path).ok_or_else(|| PatchError::NotFound(path.to_string()))?;
    *slot = value;
    Ok(())
}
