//! Reset / change / message listener registry shared by every adapter.
//!
//! Listeners are keyed by [`HandlerId`] and called in registration order.
//! Dispatch works on a snapshot of the listener list, so a listener may
//! connect or disconnect handlers (including itself) while being notified.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use dpe_dom::Patch;
use serde_json::Value;

use crate::message::AdapterMessage;

/// Identifies a connected listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type ResetListener = Rc<dyn Fn()>;
type ChangedListener = Rc<dyn Fn(&Patch)>;
type MessageListener = Rc<dyn Fn(&AdapterMessage) -> Value>;

#[derive(Default)]
pub struct AdapterEvents {
    next_handler_id: Cell<u64>,
    reset_listeners: RefCell<BTreeMap<HandlerId, ResetListener>>,
    changed_listeners: RefCell<BTreeMap<HandlerId, ChangedListener>>,
    message_listeners: RefCell<BTreeMap<HandlerId, MessageListener>>,
}

impl std::fmt::Debug for AdapterEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterEvents")
            .field("reset_listeners", &self.reset_listeners.borrow().len())
            .field("changed_listeners", &self.changed_listeners.borrow().len())
            .field("message_listeners", &self.message_listeners.borrow().len())
            .finish()
    }
}

impl AdapterEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the whole document must be considered replaced.
    pub fn connect_reset<F>(&self, listener: F) -> HandlerId
    where
        F: Fn() + 'static,
    {
        let id = self.next_id();
        self.reset_listeners.borrow_mut().insert(id, Rc::new(listener));
        id
    }

    /// Called with every patch applied to the document.
    pub fn connect_changed<F>(&self, listener: F) -> HandlerId
    where
        F: Fn(&Patch) + 'static,
    {
        let id = self.next_id();
        self.changed_listeners.borrow_mut().insert(id, Rc::new(listener));
        id
    }

    /// Called with messages the adapter raises towards its consumers.
    pub fn connect_message<F>(&self, listener: F) -> HandlerId
    where
        F: Fn(&AdapterMessage) -> Value + 'static,
    {
        let id = self.next_id();
        self.message_listeners.borrow_mut().insert(id, Rc::new(listener));
        id
    }

    /// Removes the listener registered under `id`, whichever event it
    /// listens to. Returns false if no such listener exists.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        self.reset_listeners.borrow_mut().remove(&id).is_some()
            || self.changed_listeners.borrow_mut().remove(&id).is_some()
            || self.message_listeners.borrow_mut().remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.reset_listeners.borrow().len()
            + self.changed_listeners.borrow().len()
            + self.message_listeners.borrow().len()
    }

    pub fn notify_reset(&self) {
        let listeners: Vec<ResetListener> = self.reset_listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn notify_changed(&self, patch: &Patch) {
        let listeners: Vec<ChangedListener> =
            self.changed_listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(patch);
        }
    }

    /// Delivers `message` to every message listener and returns the first
    /// non-null response, or `Null`.
    pub fn notify_message(&self, message: &AdapterMessage) -> Value {
        let listeners: Vec<MessageListener> =
            self.message_listeners.borrow().values().cloned().collect();
        let mut response = Value::Null;
        for listener in listeners {
            let result = listener(message);
            if response.is_null() {
                response = result;
            }
        }
        response
    }

    fn next_id(&self) -> HandlerId {
        let id = self.next_handler_id.get().saturating_add(1);
        self.next_handler_id.set(id);
        HandlerId(id)
    }
}
