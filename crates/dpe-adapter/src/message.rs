//! Messages exchanged between adapters and the editor.

use dpe_dom::Path;
use serde_json::Value;

/// Replace the `Value` attribute of the node at the message origin with the
/// message arguments.
pub const SET_VALUE: &str = "SetValue";

/// A named message addressed to the node at `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterMessage {
    pub name: String,
    pub origin: Path,
    pub args: Value,
}

impl AdapterMessage {
    pub fn new(name: impl Into<String>, origin: Path, args: Value) -> Self {
        Self {
            name: name.into(),
            origin,
            args,
        }
    }

    /// The same message re-addressed to `origin`.
    pub fn with_origin(&self, origin: Path) -> Self {
        Self {
            name: self.name.clone(),
            origin,
            args: self.args.clone(),
        }
    }
}
