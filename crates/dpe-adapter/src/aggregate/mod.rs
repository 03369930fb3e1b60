//! Merging several source adapters into one document.
//!
//! [`RowAggregateAdapter`] keeps a tree of aggregate nodes, one per logical
//! row across all sources. Each node records where the row lives in every
//! source document; rows of different sources are paired by the
//! [`RowAggregatePolicy`]. Source events are translated into edits of that
//! tree, and at the end of every event a sync pass diffs what consumers hold
//! against the new tree and emits a single patch.

mod matching;
mod node;
mod policy;
mod registry;
mod sync;
mod translate;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use dpe_dom::Patch;
use serde_json::Value;
use tracing::warn;

use crate::adapter::{DocumentAdapter, DocumentAdapterPtr};
use crate::error::AggregateError;
use crate::events::{AdapterEvents, HandlerId};
use crate::message::AdapterMessage;

use node::{AggregateNode, NodeArena, NodeId};
use registry::{AdapterInfo, AdapterKey};

pub use policy::{AggregateRow, RowAggregatePolicy};

/// Options of a [`RowAggregateAdapter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Emit a reset instead of a patch when adapters are added or removed.
    pub reset_on_attach_change: bool,
}

/// What consumers must be told once the state borrow is released.
#[derive(Debug)]
pub(crate) enum Notification {
    Nothing,
    Reset,
    Changed(Patch),
}

impl Notification {
    fn dispatch(self, events: &AdapterEvents) {
        match self {
            Notification::Nothing => {}
            Notification::Reset => events.notify_reset(),
            Notification::Changed(patch) => events.notify_changed(&patch),
        }
    }
}

pub(crate) struct AggregateState<P> {
    policy: P,
    options: AggregateOptions,
    adapters: Vec<AdapterInfo>,
    next_adapter_key: AdapterKey,
    nodes: NodeArena,
    root: NodeId,
    update_frame: u64,
}

impl<P: RowAggregatePolicy> AggregateState<P> {
    fn new(policy: P, options: AggregateOptions) -> Self {
        let mut nodes = NodeArena::default();
        let root = nodes.insert(AggregateNode::new(None, 0));
        let mut state = Self {
            policy,
            options,
            adapters: Vec::new(),
            next_adapter_key: 0,
            nodes,
            root,
            update_frame: 0,
        };
        state.reset_rendered();
        state
    }

    /// Drops every node and starts over from an empty root.
    fn reset_tree(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(AggregateNode::new(None, self.adapters.len()));
    }
}

/// A document adapter presenting the merge of several source adapters.
///
/// Rows present in every source with matching values are shown through
/// [`RowAggregatePolicy::generate_aggregate_row`], all others through
/// [`RowAggregatePolicy::generate_values_differ_row`]. Messages sent to the
/// aggregate are forwarded to every source contributing the addressed row.
pub struct RowAggregateAdapter<P: RowAggregatePolicy + 'static> {
    state: Rc<RefCell<AggregateState<P>>>,
    events: Rc<AdapterEvents>,
}

impl<P: RowAggregatePolicy + 'static> RowAggregateAdapter<P> {
    pub fn new(policy: P) -> Self {
        Self::with_options(policy, AggregateOptions::default())
    }

    pub fn with_options(policy: P, options: AggregateOptions) -> Self {
        Self {
            state: Rc::new(RefCell::new(AggregateState::new(policy, options))),
            events: Rc::new(AdapterEvents::new()),
        }
    }

    /// Attaches `adapter` as the last source.
    pub fn add_adapter(&self, adapter: DocumentAdapterPtr) -> Result<(), AggregateError> {
        let notification = {
            let mut state = self.state.borrow_mut();
            if state.index_of(&adapter).is_some() {
                warn!("add_adapter called with an adapter that is already attached");
                return Err(AggregateError::AdapterAlreadyAttached);
            }
            let key = state.allocate_key();
            let handlers = self.subscribe(&adapter, key);
            state.attach(AdapterInfo::new(key, adapter, handlers))
        };
        notification.dispatch(&self.events);
        Ok(())
    }

    /// Detaches `adapter` and drops its contribution.
    pub fn remove_adapter(&self, adapter: &DocumentAdapterPtr) -> Result<(), AggregateError> {
        let notification = self.state.borrow_mut().detach(adapter)?;
        notification.dispatch(&self.events);
        Ok(())
    }

    pub fn clear_adapters(&self) {
        let notification = self.state.borrow_mut().clear();
        notification.dispatch(&self.events);
    }

    pub fn adapter_count(&self) -> usize {
        self.state.borrow().adapters.len()
    }

    pub fn options(&self) -> AggregateOptions {
        self.state.borrow().options.clone()
    }

    fn subscribe(&self, adapter: &DocumentAdapterPtr, key: AdapterKey) -> Vec<HandlerId> {
        let source = adapter.events();

        let (state, events) = self.weak_handles();
        let reset = source.connect_reset(move || {
            let (Some(state), Some(events)) = (state.upgrade(), events.upgrade()) else {
                return;
            };
            let notification = state.borrow_mut().handle_adapter_reset(key);
            notification.dispatch(&events);
        });

        let (state, events) = self.weak_handles();
        let changed = source.connect_changed(move |patch| {
            let (Some(state), Some(events)) = (state.upgrade(), events.upgrade()) else {
                return;
            };
            let notification = state.borrow_mut().handle_dom_change(key, patch);
            notification.dispatch(&events);
        });

        let (state, events) = self.weak_handles();
        let message = source.connect_message(move |message| {
            let (Some(state), Some(events)) = (state.upgrade(), events.upgrade()) else {
                return Value::Null;
            };
            let forwarded = match state.try_borrow() {
                Ok(state) => state.translate_source_message(key, message),
                Err(_) => {
                    warn!(
                        origin = %message.origin,
                        "source message raised during an update, forwarding its source path"
                    );
                    message.clone()
                }
            };
            events.notify_message(&forwarded)
        });

        vec![reset, changed, message]
    }

    fn weak_handles(&self) -> (Weak<RefCell<AggregateState<P>>>, Weak<AdapterEvents>) {
        (Rc::downgrade(&self.state), Rc::downgrade(&self.events))
    }
}

impl<P: RowAggregatePolicy + 'static> DocumentAdapter for RowAggregateAdapter<P> {
    fn generate_contents(&self) -> Value {
        self.state.borrow().render_contents()
    }

    fn handle_message(&self, message: &AdapterMessage) -> Value {
        let routes = self.state.borrow().route_message(message);
        let mut response = Value::Null;
        for (position, (adapter, routed)) in routes.into_iter().enumerate() {
            let result = adapter.handle_message(&routed);
            if position == 0 {
                response = result;
            }
        }
        response
    }

    fn events(&self) -> &AdapterEvents {
        &self.events
    }
}

impl<P: RowAggregatePolicy + 'static> std::fmt::Debug for RowAggregateAdapter<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("RowAggregateAdapter");
        match self.state.try_borrow() {
            Ok(state) => out
                .field("adapters", &state.adapters.len())
                .field("nodes", &state.nodes.len())
                .field("update_frame", &state.update_frame),
            Err(_) => out.field("state", &"<borrowed>"),
        };
        out.field("events", &self.events).finish()
    }
}
