//! Pairing source rows with aggregate nodes.

use dpe_dom::{children, comparison_row, is_row, Path, PathEntry};
use serde_json::Value;
use tracing::trace;

use super::{AggregateNode, AggregateRow, AggregateState, NodeId, RowAggregatePolicy};

impl<P: RowAggregatePolicy> AggregateState<P> {
    pub(super) fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    fn create_node(&mut self, parent: NodeId) -> NodeId {
        let node = AggregateNode::new(Some(parent), self.adapter_count());
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        id
    }

    /// Where `node` lives in `adapter`'s document, if it has an entry there.
    pub(super) fn source_path(&self, node: NodeId, adapter: usize) -> Option<Path> {
        let mut entries = Vec::new();
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            entries.push(PathEntry::Index(self.nodes[current].entry(adapter)?));
            current = parent;
        }
        entries.reverse();
        Some(Path::from(entries))
    }

    /// The full source row (nested rows included) behind `node` in
    /// `adapter`'s cached document.
    pub(super) fn source_row(&self, node: NodeId, adapter: usize) -> Option<&Value> {
        let path = self.source_path(node, adapter)?;
        dpe_dom::get(&self.adapters.get(adapter)?.contents, &path)
    }

    pub(super) fn comparison_value(&self, node: NodeId, adapter: usize) -> Option<Value> {
        self.source_row(node, adapter).map(comparison_row)
    }

    /// Comparison row of the lowest-indexed contributor.
    fn representative_value(&self, node: NodeId) -> Option<Value> {
        let (adapter, _) = self.nodes[node].primary_entry()?;
        self.comparison_value(node, adapter)
    }

    pub(super) fn aggregate_row(&self, node: NodeId) -> AggregateRow {
        let contributors = (0..self.adapter_count())
            .filter_map(|adapter| Some((adapter, self.comparison_value(node, adapter)?)))
            .collect();
        AggregateRow::new(self.nodes[node].all_match, self.adapter_count(), contributors)
    }

    fn compute_all_match(&self, node: NodeId) -> bool {
        let mut values = Vec::with_capacity(self.adapter_count());
        for adapter in 0..self.adapter_count() {
            match self.comparison_value(node, adapter) {
                Some(value) => values.push(value),
                None => return false,
            }
        }
        values.iter().enumerate().all(|(position, left)| {
            values[position + 1..]
                .iter()
                .all(|right| self.policy.values_match(left, right))
        })
    }

    /// Recomputes `all_match`, stamping the node when it flips.
    pub(super) fn refresh_match(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        let all_match = self.compute_all_match(node);
        if self.nodes[node].all_match != all_match {
            self.nodes[node].all_match = all_match;
            self.stamp(node);
        }
    }

    pub(super) fn refresh_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            self.refresh_match(id);
            stack.extend(self.nodes[id].children.iter().copied());
        }
    }

    pub(super) fn refresh_all(&mut self) {
        self.refresh_subtree(self.root);
    }

    /// Marks `node` and its ancestors as changed in the current frame.
    pub(super) fn stamp(&mut self, node: NodeId) {
        let frame = self.update_frame;
        let mut current = Some(node);
        while let Some(id) = current {
            let entry = &mut self.nodes[id];
            if id != node && entry.last_update_frame == frame {
                // Stamping always runs up to the root, so the rest is done.
                break;
            }
            entry.last_update_frame = frame;
            current = entry.parent;
        }
    }

    pub(super) fn stamp_all(&mut self) {
        let frame = self.update_frame;
        for node in self.nodes.iter_mut() {
            node.last_update_frame = frame;
        }
    }

    pub(super) fn populate_nodes_for_adapter(&mut self, adapter: usize) {
        let contents = self.adapters[adapter].contents.clone();
        let root = self.root;
        self.populate_children(adapter, &contents, root);
    }

    /// Binds every row below `parent_value` (recursively) for `adapter`.
    pub(super) fn populate_children(&mut self, adapter: usize, parent_value: &Value, parent: NodeId) {
        for (index, child) in children(parent_value).iter().enumerate() {
            if is_row(child) {
                let node = self.match_row(adapter, parent, index, child);
                self.populate_children(adapter, child, node);
            }
        }
    }

    /// Finds or creates the node for `row`, the `index`-th child of
    /// `parent`'s row in `adapter`'s document, and binds it.
    pub(super) fn match_row(&mut self, adapter: usize, parent: NodeId, index: usize, row: &Value) -> NodeId {
        if let Some(&existing) = self.nodes[parent].child_index[adapter].get(&index) {
            return existing;
        }

        let candidate = comparison_row(row);
        let matched = self.nodes[parent].children.iter().copied().find(|&child| {
            !self.nodes[child].has_entry(adapter)
                && self
                    .representative_value(child)
                    .is_some_and(|existing| self.policy.same_row(&candidate, &existing))
        });
        let node = match matched {
            Some(node) => node,
            None => self.create_node(parent),
        };
        trace!(adapter, index, matched = matched.is_some(), "bound source row");

        self.bind(node, adapter, index);
        self.sort_children(parent);
        self.stamp(node);
        node
    }

    fn bind(&mut self, node: NodeId, adapter: usize, index: usize) {
        self.nodes[node].path_entries[adapter] = Some(index);
        if let Some(parent) = self.nodes[node].parent {
            self.nodes[parent].child_index[adapter].insert(index, node);
        }
    }

    /// Restores the canonical order: by lowest contributing adapter, then by
    /// that adapter's child index.
    pub(super) fn sort_children(&mut self, parent: NodeId) {
        let mut ordered = std::mem::take(&mut self.nodes[parent].children);
        ordered.sort_by_key(|&child| {
            self.nodes[child]
                .primary_entry()
                .unwrap_or((usize::MAX, usize::MAX))
        });
        self.nodes[parent].children = ordered;
    }

    /// Clears `adapter`'s entries in the subtree of `node`, deleting nodes
    /// left without any contributor. The caller unlinks `node` from its
    /// parent's `child_index`.
    pub(super) fn detach_subtree(&mut self, adapter: usize, node: NodeId) {
        let nested: Vec<NodeId> = self.nodes[node].child_index[adapter].values().copied().collect();
        for child in nested {
            self.detach_subtree(adapter, child);
        }

        let entry = &mut self.nodes[node];
        entry.child_index[adapter].clear();
        entry.path_entries[adapter] = None;
        let parent = entry.parent;

        if entry.entry_count() == 0 {
            self.delete_node(node);
        } else {
            self.stamp(node);
            if let Some(parent) = parent {
                self.sort_children(parent);
            }
        }
    }

    fn delete_node(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node].parent {
            self.nodes[parent].children.retain(|&child| child != node);
            self.stamp(parent);
        }
        // A node without contributors cannot have descendants with any.
        let mut doomed = vec![node];
        while let Some(id) = doomed.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                doomed.extend(removed.children);
            }
        }
    }
}
