//! Arena of aggregate nodes.
//!
//! Nodes reference each other through [`NodeId`] handles. A removed node's
//! slot is retired until [`NodeArena::recycle`] runs, so a handle recorded in
//! the rendered view of the current update pass can never alias a node
//! created later in that same pass.

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u32);

/// One logical row across every attached source.
#[derive(Debug)]
pub(crate) struct AggregateNode {
    /// Per adapter, the index of this row among its parent's children in
    /// that adapter's document.
    pub path_entries: Vec<Option<usize>>,
    pub all_match: bool,
    pub last_update_frame: u64,
    /// Per adapter, child nodes keyed by their source child index.
    pub child_index: Vec<BTreeMap<usize, NodeId>>,
    pub parent: Option<NodeId>,
    /// Child rows in aggregate order.
    pub children: Vec<NodeId>,
    /// Header consumers currently hold for this node.
    pub rendered_header: Option<Value>,
    /// Child rows consumers currently hold, in their order.
    pub rendered_children: Vec<NodeId>,
}

impl AggregateNode {
    pub fn new(parent: Option<NodeId>, adapter_count: usize) -> Self {
        Self {
            path_entries: vec![None; adapter_count],
            all_match: false,
            last_update_frame: 0,
            child_index: vec![BTreeMap::new(); adapter_count],
            parent,
            children: Vec::new(),
            rendered_header: None,
            rendered_children: Vec::new(),
        }
    }

    pub fn entry(&self, adapter: usize) -> Option<usize> {
        self.path_entries.get(adapter).copied().flatten()
    }

    pub fn has_entry(&self, adapter: usize) -> bool {
        self.entry(adapter).is_some()
    }

    pub fn entry_count(&self) -> usize {
        self.path_entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// The lowest adapter with an entry, together with that entry. This is
    /// the node's sort key among its siblings.
    pub fn primary_entry(&self) -> Option<(usize, usize)> {
        self.path_entries
            .iter()
            .enumerate()
            .find_map(|(adapter, entry)| entry.map(|index| (adapter, index)))
    }

    pub fn push_column(&mut self) {
        self.path_entries.push(None);
        self.child_index.push(BTreeMap::new());
    }

    pub fn remove_column(&mut self, adapter: usize) {
        self.path_entries.remove(adapter);
        self.child_index.remove(adapter);
    }
}

#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Option<AggregateNode>>,
    free: Vec<u32>,
    retired: Vec<u32>,
}

impl NodeArena {
    pub fn insert(&mut self, node: AggregateNode) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId((self.slots.len() - 1) as u32)
            }
        }
    }

    pub fn remove(&mut self, id: NodeId) -> Option<AggregateNode> {
        let node = self.slots.get_mut(id.0 as usize)?.take()?;
        self.retired.push(id.0);
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&AggregateNode> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    /// Makes the slots retired since the last call available again.
    pub fn recycle(&mut self) {
        self.free.append(&mut self.retired);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.retired.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AggregateNode> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }
}

impl Index<NodeId> for NodeArena {
    type Output = AggregateNode;

    fn index(&self, id: NodeId) -> &AggregateNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale aggregate node handle {id:?}"),
        }
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut AggregateNode {
        match self.slots.get_mut(id.0 as usize).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("stale aggregate node handle {id:?}"),
        }
    }
}
