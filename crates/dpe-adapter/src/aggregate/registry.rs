//! The ordered list of attached source adapters.

use serde_json::Value;
use tracing::{debug, warn};

use super::{AggregateState, Notification, NodeId, RowAggregatePolicy};
use crate::adapter::{same_adapter, DocumentAdapterPtr};
use crate::error::AggregateError;
use crate::events::HandlerId;

/// Stable identity of an attachment; unlike the adapter index it survives
/// the removal of earlier adapters.
pub(super) type AdapterKey = u64;

pub(super) struct AdapterInfo {
    pub key: AdapterKey,
    pub adapter: DocumentAdapterPtr,
    /// The source document as last seen, kept current by applying its
    /// patches.
    pub contents: Value,
    handlers: Vec<HandlerId>,
}

impl AdapterInfo {
    pub fn new(key: AdapterKey, adapter: DocumentAdapterPtr, handlers: Vec<HandlerId>) -> Self {
        let contents = adapter.generate_contents();
        Self {
            key,
            adapter,
            contents,
            handlers,
        }
    }
}

impl Drop for AdapterInfo {
    fn drop(&mut self) {
        let events = self.adapter.events();
        for id in self.handlers.drain(..) {
            events.disconnect(id);
        }
    }
}

impl<P: RowAggregatePolicy> AggregateState<P> {
    pub(super) fn index_of(&self, adapter: &DocumentAdapterPtr) -> Option<usize> {
        self.adapters
            .iter()
            .position(|info| same_adapter(&info.adapter, adapter))
    }

    pub(super) fn index_of_key(&self, key: AdapterKey) -> Option<usize> {
        self.adapters.iter().position(|info| info.key == key)
    }

    pub(super) fn allocate_key(&mut self) -> AdapterKey {
        let key = self.next_adapter_key;
        self.next_adapter_key += 1;
        key
    }

    pub(super) fn attach(&mut self, info: AdapterInfo) -> Notification {
        self.update_frame += 1;
        self.adapters.push(info);
        for node in self.nodes.iter_mut() {
            node.push_column();
        }
        let adapter = self.adapters.len() - 1;
        debug!(adapter, frame = self.update_frame, "attaching source adapter");

        self.populate_nodes_for_adapter(adapter);
        self.refresh_all();

        if adapter == 0 || self.options.reset_on_attach_change {
            self.reset_rendered();
            Notification::Reset
        } else {
            self.stamp_all();
            self.flush()
        }
    }

    pub(super) fn detach(
        &mut self,
        adapter: &DocumentAdapterPtr,
    ) -> Result<Notification, AggregateError> {
        let Some(index) = self.index_of(adapter) else {
            warn!("remove_adapter called with an adapter that is not attached");
            return Err(AggregateError::AdapterNotAttached);
        };
        self.update_frame += 1;
        debug!(adapter = index, frame = self.update_frame, "detaching source adapter");

        let root = self.root;
        let rows: Vec<NodeId> = self.nodes[root].child_index[index].values().copied().collect();
        for row in rows {
            self.detach_subtree(index, row);
        }
        // Dropping the info disconnects its handlers.
        drop(self.adapters.remove(index));
        for node in self.nodes.iter_mut() {
            node.remove_column(index);
        }
        self.refresh_all();

        if self.adapters.is_empty() || self.options.reset_on_attach_change {
            self.reset_rendered();
            Ok(Notification::Reset)
        } else {
            self.stamp_all();
            Ok(self.flush())
        }
    }

    pub(super) fn clear(&mut self) -> Notification {
        debug!(adapters = self.adapters.len(), "clearing source adapters");
        self.update_frame += 1;
        self.adapters.clear();
        self.reset_tree();
        self.reset_rendered();
        Notification::Reset
    }
}
