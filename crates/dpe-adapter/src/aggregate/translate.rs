//! Folding source events into the aggregate tree, and moving message paths
//! between source and aggregate space.

use std::rc::Rc;

use dpe_dom::{
    children, comparison_row, is_row, Patch, PatchOperation, Path, PathEntry, Value, CHILDREN_KEY,
};
use tracing::{debug, trace, warn};

use super::registry::AdapterKey;
use super::{AggregateState, NodeId, Notification, RowAggregatePolicy};
use crate::adapter::DocumentAdapterPtr;
use crate::error::AggregateError;
use crate::message::AdapterMessage;

/// Outcome of translating one source operation.
enum Translation {
    Applied,
    /// The operation replaced the whole source document, or the whole child
    /// list of its root.
    Rebuild,
}

impl<P: RowAggregatePolicy> AggregateState<P> {
    pub(super) fn handle_adapter_reset(&mut self, key: AdapterKey) -> Notification {
        let Some(adapter) = self.index_of_key(key) else {
            return Notification::Nothing;
        };
        self.update_frame += 1;
        debug!(adapter, frame = self.update_frame, "source adapter reset");
        self.rebuild_adapter(adapter);
        self.reset_rendered();
        Notification::Reset
    }

    pub(super) fn handle_dom_change(&mut self, key: AdapterKey, patch: &Patch) -> Notification {
        let Some(adapter) = self.index_of_key(key) else {
            return Notification::Nothing;
        };
        self.update_frame += 1;
        for op in patch {
            match self.apply_source_operation(adapter, op) {
                Ok(Translation::Applied) => {}
                Ok(Translation::Rebuild) => {
                    debug!(adapter, "source document replaced");
                    self.rebuild_adapter(adapter);
                    self.reset_rendered();
                    return Notification::Reset;
                }
                Err(err) => {
                    warn!(
                        adapter,
                        op = op.op_name(),
                        path = %op.path(),
                        %err,
                        "malformed source patch, rebuilding contribution"
                    );
                    self.rebuild_adapter(adapter);
                    self.reset_rendered();
                    return Notification::Reset;
                }
            }
        }
        self.flush()
    }

    /// Re-reads `adapter`'s document and rebuilds its contribution. The
    /// primary adapter drives the canonical order, so its rebuild starts the
    /// whole tree over.
    pub(super) fn rebuild_adapter(&mut self, adapter: usize) {
        let contents = self.adapters[adapter].adapter.generate_contents();
        self.adapters[adapter].contents = contents;
        if adapter == 0 {
            self.reset_tree();
            for index in 0..self.adapter_count() {
                self.populate_nodes_for_adapter(index);
            }
        } else {
            let root = self.root;
            let rows: Vec<NodeId> = self.nodes[root].child_index[adapter].values().copied().collect();
            for row in rows {
                self.detach_subtree(adapter, row);
            }
            self.nodes[root].child_index[adapter].clear();
            self.populate_nodes_for_adapter(adapter);
        }
        self.refresh_all();
    }

    fn apply_source_operation(
        &mut self,
        adapter: usize,
        op: &PatchOperation,
    ) -> Result<Translation, AggregateError> {
        let path = op.path().canonical();
        trace!(adapter, op = op.op_name(), %path, "translating source operation");

        let Some((last, parent_path)) = path.split_last() else {
            op.apply(&mut self.adapters[adapter].contents)?;
            return Ok(Translation::Rebuild);
        };
        let (node, consumed) = self.resolve_source_path(adapter, parent_path);
        let rest = &path[consumed..];

        if consumed == parent_path.len()
            && matches!(last, PathEntry::Index(_) | PathEntry::EndOfArray)
        {
            self.apply_slot_operation(adapter, node, last, op)?;
        } else if matches!(rest.first(), Some(PathEntry::Key(key)) if key == CHILDREN_KEY) {
            // The whole child list of a row was set at once.
            let before = self.comparison_value(node, adapter);
            op.apply(&mut self.adapters[adapter].contents)?;
            if node == self.root {
                return Ok(Translation::Rebuild);
            }
            let row = self.bound_row(node, adapter, op)?;
            self.rebind_nested(adapter, node, &row);
            self.content_changed(adapter, node, before, op)?;
        } else {
            self.apply_content_edit(adapter, node, rest, op)?;
        }
        Ok(Translation::Applied)
    }

    /// Follows `entries` through `adapter`'s bound rows as far as possible.
    /// Returns the deepest node reached and the number of entries consumed.
    fn resolve_source_path(&self, adapter: usize, entries: &[PathEntry]) -> (NodeId, usize) {
        let mut node = self.root;
        let mut consumed = 0;
        for entry in entries {
            let PathEntry::Index(index) = entry else {
                break;
            };
            match self.nodes[node].child_index[adapter].get(index) {
                Some(&child) => {
                    node = child;
                    consumed += 1;
                }
                None => break,
            }
        }
        (node, consumed)
    }

    /// An add, remove or replace of a direct child of `parent`'s row.
    fn apply_slot_operation(
        &mut self,
        adapter: usize,
        parent: NodeId,
        last: &PathEntry,
        op: &PatchOperation,
    ) -> Result<(), AggregateError> {
        let siblings = self
            .source_row(parent, adapter)
            .map(|row| children(row).len())
            .ok_or_else(|| unknown_row(op))?;
        let index = match last {
            PathEntry::Index(index) => *index,
            _ => siblings,
        };
        let previous = self
            .source_row(parent, adapter)
            .and_then(|row| children(row).get(index))
            .cloned();
        let before = self.comparison_value(parent, adapter);

        op.apply(&mut self.adapters[adapter].contents)?;

        match (op, previous) {
            (PatchOperation::Add { value, .. }, _) => {
                self.shift_entries(parent, adapter, index, 1);
                if is_row(value) {
                    self.attach_row(adapter, parent, index, value);
                } else {
                    self.content_changed(adapter, parent, before, op)?;
                }
            }
            (PatchOperation::Remove { .. }, Some(removed)) => {
                if is_row(&removed) {
                    self.release_slot(adapter, parent, index, op)?;
                    self.shift_entries(parent, adapter, index + 1, -1);
                } else {
                    self.shift_entries(parent, adapter, index + 1, -1);
                    self.content_changed(adapter, parent, before, op)?;
                }
            }
            (PatchOperation::Replace { value, .. }, Some(replaced)) => {
                let was_row = is_row(&replaced);
                let now_row = is_row(value);
                if was_row && now_row {
                    let same = self
                        .policy
                        .same_row(&comparison_row(value), &comparison_row(&replaced));
                    if same {
                        let node = self.bound_child(parent, adapter, index, op)?;
                        self.rebind_nested(adapter, node, value);
                        self.refresh_match(node);
                        self.stamp(node);
                    } else {
                        self.release_slot(adapter, parent, index, op)?;
                        self.attach_row(adapter, parent, index, value);
                    }
                } else {
                    if was_row {
                        self.release_slot(adapter, parent, index, op)?;
                    }
                    if now_row {
                        self.attach_row(adapter, parent, index, value);
                    }
                    self.content_changed(adapter, parent, before, op)?;
                }
            }
            // The operation applied, so the slot existed.
            (_, None) => return Err(unknown_row(op)),
        }
        Ok(())
    }

    /// An edit below `node` that does not add, remove or replace one of its
    /// children. `rest` is the part of the path below `node`.
    ///
    /// The edit may also change whether a value is a row: `node` itself can
    /// stop being one, and the plain child the path enters can become one.
    fn apply_content_edit(
        &mut self,
        adapter: usize,
        node: NodeId,
        rest: &[PathEntry],
        op: &PatchOperation,
    ) -> Result<(), AggregateError> {
        let entered = match rest.first() {
            Some(PathEntry::Index(index)) => Some(*index),
            _ => None,
        };
        if let Some(index) = entered {
            let unbound_row = self
                .source_row(node, adapter)
                .and_then(|row| children(row).get(index))
                .is_some_and(is_row);
            if unbound_row {
                return Err(unknown_row(op));
            }
        }
        let before = self.comparison_value(node, adapter);
        let parent = self.nodes[node].parent;
        let parent_before = parent.and_then(|parent| self.comparison_value(parent, adapter));

        op.apply(&mut self.adapters[adapter].contents)?;

        if let Some(parent) = parent {
            if !self.source_row(node, adapter).is_some_and(is_row) {
                let index = self.nodes[node]
                    .entry(adapter)
                    .ok_or_else(|| unknown_row(op))?;
                trace!(adapter, index, "row became plain content");
                self.release_slot(adapter, parent, index, op)?;
                return self.content_changed(adapter, parent, parent_before, op);
            }
        }

        if let Some(index) = entered {
            let promoted = self
                .source_row(node, adapter)
                .and_then(|row| children(row).get(index))
                .filter(|child| is_row(child))
                .cloned();
            if let Some(row) = promoted {
                trace!(adapter, index, "plain content became a row");
                self.attach_row(adapter, node, index, &row);
            }
        }
        self.content_changed(adapter, node, before, op)
    }

    /// `adapter`'s own content of `node` changed from `before`. Regenerates
    /// the row, or pairs it up again when the edit changed which logical row
    /// it is.
    fn content_changed(
        &mut self,
        adapter: usize,
        node: NodeId,
        before: Option<Value>,
        op: &PatchOperation,
    ) -> Result<(), AggregateError> {
        // Content of the source root is not part of the merged document.
        if node == self.root {
            return Ok(());
        }
        let after = self.comparison_value(node, adapter);
        let same_identity = match (&before, &after) {
            (Some(before), Some(after)) => self.policy.same_row(after, before),
            _ => false,
        };
        if same_identity {
            self.refresh_match(node);
            self.stamp(node);
            return Ok(());
        }

        let (Some(parent), Some(index)) = (self.nodes[node].parent, self.nodes[node].entry(adapter))
        else {
            return Err(unknown_row(op));
        };
        let row = self.bound_row(node, adapter, op)?;
        trace!(adapter, index, "row identity changed");
        self.release_slot(adapter, parent, index, op)?;
        self.attach_row(adapter, parent, index, &row);
        Ok(())
    }

    fn bound_row(&self, node: NodeId, adapter: usize, op: &PatchOperation) -> Result<Value, AggregateError> {
        self.source_row(node, adapter)
            .cloned()
            .ok_or_else(|| unknown_row(op))
    }

    fn bound_child(
        &self,
        parent: NodeId,
        adapter: usize,
        index: usize,
        op: &PatchOperation,
    ) -> Result<NodeId, AggregateError> {
        self.nodes[parent].child_index[adapter]
            .get(&index)
            .copied()
            .ok_or_else(|| unknown_row(op))
    }

    fn attach_row(&mut self, adapter: usize, parent: NodeId, index: usize, row: &Value) {
        let node = self.match_row(adapter, parent, index, row);
        self.populate_children(adapter, row, node);
        self.refresh_subtree(node);
    }

    fn release_slot(
        &mut self,
        adapter: usize,
        parent: NodeId,
        index: usize,
        op: &PatchOperation,
    ) -> Result<(), AggregateError> {
        let node = self.nodes[parent].child_index[adapter]
            .remove(&index)
            .ok_or_else(|| unknown_row(op))?;
        self.detach_subtree(adapter, node);
        if self.nodes.contains(node) {
            self.refresh_subtree(node);
        }
        Ok(())
    }

    /// Rebinds `adapter`'s rows nested in `node` from `row`, keeping `node`
    /// itself.
    fn rebind_nested(&mut self, adapter: usize, node: NodeId, row: &Value) {
        let nested: Vec<NodeId> = self.nodes[node].child_index[adapter].values().copied().collect();
        for child in nested {
            self.detach_subtree(adapter, child);
        }
        self.nodes[node].child_index[adapter].clear();
        self.populate_children(adapter, row, node);
        self.refresh_subtree(node);
    }

    /// Moves `adapter`'s bindings under `parent` at indices `from..` by
    /// `delta`.
    fn shift_entries(&mut self, parent: NodeId, adapter: usize, from: usize, delta: isize) {
        let moved: Vec<(usize, NodeId)> = self.nodes[parent].child_index[adapter]
            .range(from..)
            .map(|(&index, &node)| (index, node))
            .collect();
        if moved.is_empty() {
            return;
        }
        let bindings = &mut self.nodes[parent].child_index[adapter];
        for (index, _) in &moved {
            bindings.remove(index);
        }
        for &(index, node) in &moved {
            bindings.insert(index.saturating_add_signed(delta), node);
        }
        for (index, node) in moved {
            self.nodes[node].path_entries[adapter] = Some(index.saturating_add_signed(delta));
        }
    }

    /// Rewrites the origin of a message raised by a source into aggregate
    /// space. Origins that do not resolve to a bound row are kept as is.
    pub(super) fn translate_source_message(
        &self,
        key: AdapterKey,
        message: &AdapterMessage,
    ) -> AdapterMessage {
        let Some(adapter) = self.index_of_key(key) else {
            return message.clone();
        };
        let (node, consumed) = self.resolve_source_path(adapter, &message.origin);
        if node == self.root {
            return message.clone();
        }
        let mut rest = message.origin[consumed..].to_vec();
        if let (Some(PathEntry::Index(index)), Some(row)) =
            (rest.first_mut(), self.source_row(node, adapter))
        {
            if let Some(header_index) = source_to_header_index(row, *index) {
                *index = header_index;
            }
        }
        message.with_origin(self.aggregate_path(node).join(&rest))
    }

    /// Resolves the aggregate path of `message` and re-addresses it to every
    /// adapter contributing the row, primary contributor first.
    pub(super) fn route_message(
        &self,
        message: &AdapterMessage,
    ) -> Vec<(DocumentAdapterPtr, AdapterMessage)> {
        let mut node = self.root;
        let mut consumed = 0;
        for entry in &message.origin {
            let PathEntry::Index(index) = entry else {
                break;
            };
            let Some(&child) = index
                .checked_sub(self.header_len(node))
                .and_then(|position| self.nodes[node].children.get(position))
            else {
                break;
            };
            node = child;
            consumed += 1;
        }
        let rest = &message.origin[consumed..];

        (0..self.adapter_count())
            .filter_map(|adapter| {
                let base = self.source_path(node, adapter)?;
                let mut rest = rest.to_vec();
                if node != self.root {
                    if let (Some(PathEntry::Index(index)), Some(row)) =
                        (rest.first_mut(), self.source_row(node, adapter))
                    {
                        if let Some(source_index) = header_to_source_index(row, *index) {
                            *index = source_index;
                        }
                    }
                }
                let routed = message.with_origin(base.join(&rest));
                trace!(adapter, origin = %routed.origin, "routing message");
                Some((Rc::clone(&self.adapters[adapter].adapter), routed))
            })
            .collect()
    }

    /// Path of `node` in the merged document.
    pub(super) fn aggregate_path(&self, node: NodeId) -> Path {
        let mut entries = Vec::new();
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            let position = self.nodes[parent]
                .children
                .iter()
                .position(|&child| child == current)
                .unwrap_or_default();
            entries.push(PathEntry::Index(self.header_len(parent) + position));
            current = parent;
        }
        entries.reverse();
        Path::from(entries)
    }
}

fn unknown_row(op: &PatchOperation) -> AggregateError {
    AggregateError::UnknownRow(op.path().to_string())
}

/// Position among the non-row children of the source child at `index`, or
/// `None` when that child is a row.
fn source_to_header_index(row: &Value, index: usize) -> Option<usize> {
    let list = children(row);
    if list.get(index).map_or(true, is_row) {
        return None;
    }
    Some(list[..index].iter().filter(|child| !is_row(child)).count())
}

/// Source index of the `index`-th non-row child.
fn header_to_source_index(row: &Value, index: usize) -> Option<usize> {
    children(row)
        .iter()
        .enumerate()
        .filter(|(_, child)| !is_row(child))
        .nth(index)
        .map(|(position, _)| position)
}
