//! In-memory adapter over a single document.

use std::cell::RefCell;
use std::rc::Rc;

use dpe_dom::{Patch, PatchError, PatchOperation, VALUE_ATTRIBUTE};
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter::DocumentAdapter;
use crate::events::AdapterEvents;
use crate::message::{AdapterMessage, SET_VALUE};

/// Holds a document and raises events for every modification made through
/// it.
#[derive(Debug)]
pub struct ValueAdapter {
    contents: RefCell<Value>,
    events: AdapterEvents,
}

impl ValueAdapter {
    pub fn new(contents: Value) -> Self {
        Self {
            contents: RefCell::new(contents),
            events: AdapterEvents::new(),
        }
    }

    /// Convenience for the common case of sharing the adapter right away.
    pub fn shared(contents: Value) -> Rc<Self> {
        Rc::new(Self::new(contents))
    }

    pub fn contents(&self) -> Value {
        self.contents.borrow().clone()
    }

    /// Replaces the document and raises a reset.
    pub fn set_contents(&self, contents: Value) {
        *self.contents.borrow_mut() = contents;
        self.events.notify_reset();
    }

    /// Applies `patch` atomically and raises a change event with it. The
    /// document is left untouched when any operation fails.
    pub fn apply_patch(&self, patch: &Patch) -> Result<(), PatchError> {
        {
            let mut contents = self.contents.borrow_mut();
            let mut working = contents.clone();
            patch.apply(&mut working)?;
            *contents = working;
        }
        self.events.notify_changed(patch);
        Ok(())
    }

    /// Raises `message` towards this adapter's consumers.
    pub fn send_message(&self, message: &AdapterMessage) -> Value {
        self.events.notify_message(message)
    }
}

impl DocumentAdapter for ValueAdapter {
    fn generate_contents(&self) -> Value {
        self.contents()
    }

    fn handle_message(&self, message: &AdapterMessage) -> Value {
        match message.name.as_str() {
            SET_VALUE => {
                let patch = Patch::from(vec![PatchOperation::Replace {
                    path: message.origin.with(VALUE_ATTRIBUTE),
                    value: message.args.clone(),
                }]);
                if let Err(err) = self.apply_patch(&patch) {
                    warn!(origin = %message.origin, %err, "SetValue rejected");
                }
                Value::Null
            }
            other => {
                debug!(name = other, "unhandled adapter message");
                Value::Null
            }
        }
    }

    fn events(&self) -> &AdapterEvents {
        &self.events
    }
}
