//! Document model for the document property editor.
//!
//! Documents are plain [`serde_json::Value`] trees that follow a small node
//! convention:
//!
//! - `"$type"` names the node (`"Adapter"`, `"Row"`, `"Label"`, ...),
//! - `"$children"` holds the ordered child values,
//! - every other key is an attribute of the node.
//!
//! On top of that this crate provides [`Path`]s that address children by
//! index and attributes by key, sequential [`Patch`]es of add / remove /
//! replace operations, and an [`AdapterBuilder`] for assembling trees.
//!
//! # Example
//!
//! ```
//! use dpe_dom::{AdapterBuilder, Patch, PatchOperation, Path};
//! use serde_json::json;
//!
//! let mut doc = AdapterBuilder::new()
//!     .begin_row()
//!     .label("Width")
//!     .property_editor("SpinBox", json!(4))
//!     .end_row()
//!     .finish()
//!     .unwrap();
//!
//! let patch = Patch::from(vec![PatchOperation::Replace {
//!     path: "/0/1/Value".parse().unwrap(),
//!     value: json!(8),
//! }]);
//! patch.apply(&mut doc).unwrap();
//!
//! let width: Path = "/0/1/Value".parse().unwrap();
//! assert_eq!(dpe_dom::get(&doc, &width), Some(&json!(8)));
//! ```

pub mod builder;
pub mod patch;
pub mod path;
pub mod value;

pub use builder::{nodes, AdapterBuilder, BuildError};
pub use patch::{Patch, PatchError, PatchOperation};
pub use path::{get, get_mut, Path, PathEntry, PathError};
pub use serde_json::Value;
pub use value::{
    attribute, children, children_mut, comparison_row, is_node, is_row, node, node_name, push_child,
    semantic_eq, set_attribute, CHILDREN_KEY, TYPE_KEY, VALUE_ATTRIBUTE,
};
