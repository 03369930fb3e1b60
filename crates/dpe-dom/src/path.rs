//! Paths into document trees.
//!
//! A path is a sequence of [`PathEntry`] steps. `Index` steps select a child
//! of a node (or an element of an array), `Key` steps select an attribute.
//! Paths format as JSON Pointers (RFC 6901), with `-` standing for the
//! end-of-array position.

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::value::CHILDREN_KEY;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("pointer must be empty or start with '/': {0:?}")]
    MissingLeadingSlash(String),
}

/// A single step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathEntry {
    Index(usize),
    Key(String),
    /// The position one past the last child; only meaningful for additions.
    EndOfArray,
}

impl PathEntry {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathEntry::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<usize> for PathEntry {
    fn from(index: usize) -> Self {
        PathEntry::Index(index)
    }
}

impl From<&str> for PathEntry {
    fn from(key: &str) -> Self {
        PathEntry::Key(key.to_string())
    }
}

impl From<String> for PathEntry {
    fn from(key: String) -> Self {
        PathEntry::Key(key)
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathEntry::Index(i) => write!(f, "{i}"),
            PathEntry::Key(key) => f.write_str(&escape_component(key)),
            PathEntry::EndOfArray => f.write_str("-"),
        }
    }
}

/// An ordered sequence of path entries. The empty path is the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathEntry>);

impl Path {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.0
    }

    pub fn push(&mut self, entry: impl Into<PathEntry>) {
        self.0.push(entry.into());
    }

    pub fn pop(&mut self) -> Option<PathEntry> {
        self.0.pop()
    }

    /// Returns a new path with `entry` appended.
    pub fn with(&self, entry: impl Into<PathEntry>) -> Path {
        let mut out = self.clone();
        out.push(entry);
        out
    }

    /// Returns a new path with all of `other`'s entries appended.
    pub fn join(&self, other: &[PathEntry]) -> Path {
        let mut out = self.clone();
        out.0.extend_from_slice(other);
        out
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        let (_, parent) = self.0.split_last()?;
        Some(Path(parent.to_vec()))
    }

    pub fn starts_with(&self, prefix: &[PathEntry]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Rewrites `$children` key steps followed by an index into plain index
    /// steps, so `/$children/0` and `/0` address the same child.
    pub fn canonical(&self) -> Path {
        let mut out = Vec::with_capacity(self.0.len());
        let mut iter = self.0.iter().peekable();
        while let Some(entry) = iter.next() {
            if matches!(entry, PathEntry::Key(key) if key == CHILDREN_KEY)
                && matches!(
                    iter.peek(),
                    Some(PathEntry::Index(_)) | Some(PathEntry::EndOfArray)
                )
            {
                continue;
            }
            out.push(entry.clone());
        }
        Path(out)
    }
}

impl Deref for Path {
    type Target = [PathEntry];

    fn deref(&self) -> &[PathEntry] {
        &self.0
    }
}

impl From<Vec<PathEntry>> for Path {
    fn from(entries: Vec<PathEntry>) -> Self {
        Path(entries)
    }
}

impl From<&[PathEntry]> for Path {
    fn from(entries: &[PathEntry]) -> Self {
        Path(entries.to_vec())
    }
}

impl FromIterator<PathEntry> for Path {
    fn from_iter<I: IntoIterator<Item = PathEntry>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathEntry;
    type IntoIter = std::slice::Iter<'a, PathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.0 {
            write!(f, "/{entry}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    /// Parses a JSON Pointer. Canonical array indices become `Index` steps,
    /// `-` becomes `EndOfArray`, everything else is an unescaped `Key`.
    fn from_str(pointer: &str) -> Result<Self, Self::Err> {
        if pointer.is_empty() {
            return Ok(Path::new());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(PathError::MissingLeadingSlash(pointer.to_string()));
        };
        Ok(rest
            .split('/')
            .map(|token| {
                if token == "-" {
                    PathEntry::EndOfArray
                } else if is_valid_index(token) {
                    token
                        .parse()
                        .map(PathEntry::Index)
                        .unwrap_or_else(|_| PathEntry::Key(token.to_string()))
                } else {
                    PathEntry::Key(unescape_component(token).into_owned())
                }
            })
            .collect())
    }
}

/// Escapes a key for use in a JSON Pointer (`~` → `~0`, `/` → `~1`).
pub fn escape_component(component: &str) -> Cow<'_, str> {
    if !component.contains(['~', '/']) {
        return Cow::Borrowed(component);
    }
    let mut out = String::with_capacity(component.len() + 2);
    for ch in component.chars() {
        match ch {
            '~' => out.push_str("~0"),
            '/' => out.push_str("~1"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Reverses [`escape_component`] in one left-to-right pass, so `~01` reads
/// as `~1` rather than `/`. A `~` not followed by `0` or `1` is kept.
pub fn unescape_component(component: &str) -> Cow<'_, str> {
    if !component.contains('~') {
        return Cow::Borrowed(component);
    }
    let mut out = String::with_capacity(component.len());
    let mut chars = component.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('0') => {
                chars.next();
                out.push('~');
            }
            Some('1') => {
                chars.next();
                out.push('/');
            }
            _ => out.push('~'),
        }
    }
    Cow::Owned(out)
}

/// Non-empty ASCII digits without a leading zero.
fn is_valid_index(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.is_empty() || (bytes.len() > 1 && bytes[0] == b'0') {
        return false;
    }
    bytes.iter().all(u8::is_ascii_digit)
}

/// Looks up the value at `path`.
///
/// `Index` steps descend into a node's `$children` or an array element;
/// `Key` steps descend into an object attribute.
pub fn get<'a>(value: &'a Value, path: &[PathEntry]) -> Option<&'a Value> {
    let mut current = value;
    for entry in path {
        current = match (entry, current) {
            (PathEntry::Index(i), Value::Array(arr)) => arr.get(*i)?,
            (PathEntry::Index(i), Value::Object(map)) => {
                map.get(CHILDREN_KEY)?.as_array()?.get(*i)?
            }
            (PathEntry::Key(key), Value::Object(map)) => map.get(key)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable counterpart of [`get`].
pub fn get_mut<'a>(value: &'a mut Value, path: &[PathEntry]) -> Option<&'a mut Value> {
    let mut current = value;
    for entry in path {
        current = match (entry, current) {
            (PathEntry::Index(i), Value::Array(arr)) => arr.get_mut(*i)?,
            (PathEntry::Index(i), Value::Object(map)) => {
                map.get_mut(CHILDREN_KEY)?.as_array_mut()?.get_mut(*i)?
            }
            (PathEntry::Key(key), Value::Object(map)) => map.get_mut(key)?,
            _ => return None,
        };
    }
    Some(current)
}
