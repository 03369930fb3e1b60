use std::rc::Rc;

use serde_json::Value;

use crate::events::AdapterEvents;
use crate::message::AdapterMessage;

/// Shared handle to a document adapter.
pub type DocumentAdapterPtr = Rc<dyn DocumentAdapter>;

/// A producer of an `Adapter` document.
///
/// Implementations own their document and report every change through
/// [`DocumentAdapter::events`]: a reset when the document was replaced
/// wholesale, a patch for incremental edits. Events must be raised after the
/// document is updated and while no internal borrow is held, since listeners
/// call back into [`DocumentAdapter::generate_contents`].
pub trait DocumentAdapter {
    /// The full current document.
    fn generate_contents(&self) -> Value;

    /// Handles a message sent by the editor (typically an edit request for
    /// the node at `message.origin`) and returns its response.
    fn handle_message(&self, message: &AdapterMessage) -> Value;

    fn events(&self) -> &AdapterEvents;
}

/// Identity comparison of two adapter handles.
pub fn same_adapter(left: &DocumentAdapterPtr, right: &DocumentAdapterPtr) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(left), Rc::as_ptr(right))
}
