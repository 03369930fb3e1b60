//! Rendering the aggregate tree and emitting patches for it.
//!
//! Every node remembers the header and the child rows consumers currently
//! hold. A sync pass walks the nodes stamped in the current frame, compares
//! the regenerated view with the remembered one and records the operations
//! that turn one into the other.

use std::collections::{HashMap, HashSet};

use dpe_dom::{
    children, children_mut, comparison_row, nodes, Patch, PatchOperation, Path, Value, CHILDREN_KEY,
};
use tracing::debug;

use super::{AggregateState, NodeId, Notification, RowAggregatePolicy};

impl<P: RowAggregatePolicy> AggregateState<P> {
    /// The merged document.
    pub(super) fn render_contents(&self) -> Value {
        self.render_node(self.root)
    }

    fn render_node(&self, node: NodeId) -> Value {
        let mut value = self.generate_header(node);
        let rows: Vec<Value> = self.nodes[node]
            .children
            .iter()
            .map(|&child| self.render_node(child))
            .collect();
        if let Some(list) = children_mut(&mut value) {
            list.extend(rows);
        }
        value
    }

    /// The node's own part of the merged document, without child rows.
    pub(super) fn generate_header(&self, node: NodeId) -> Value {
        if node == self.root {
            return nodes::adapter();
        }
        let row = self.aggregate_row(node);
        let generated = if row.all_match() {
            self.policy.generate_aggregate_row(&row)
        } else {
            self.policy.generate_values_differ_row(&row)
        };
        let mut header = comparison_row(&generated);
        match header.as_object_mut() {
            Some(map) => {
                map.entry(CHILDREN_KEY)
                    .or_insert_with(|| Value::Array(Vec::new()));
            }
            None => header = nodes::row(),
        }
        header
    }

    /// Number of non-row children in the node's rendered header.
    pub(super) fn header_len(&self, node: NodeId) -> usize {
        match &self.nodes[node].rendered_header {
            Some(header) => children(header).len(),
            None => children(&self.generate_header(node)).len(),
        }
    }

    /// Renders `node` and records the result as what consumers hold.
    fn render_and_cache(&mut self, node: NodeId) -> Value {
        let header = self.generate_header(node);
        let child_ids = self.nodes[node].children.clone();
        let rows: Vec<Value> = child_ids
            .iter()
            .map(|&child| self.render_and_cache(child))
            .collect();

        let mut value = header.clone();
        if let Some(list) = children_mut(&mut value) {
            list.extend(rows);
        }
        let entry = &mut self.nodes[node];
        entry.rendered_header = Some(header);
        entry.rendered_children = child_ids;
        value
    }

    /// Consumers are about to re-read the whole document.
    pub(super) fn reset_rendered(&mut self) {
        let root = self.root;
        self.render_and_cache(root);
        self.nodes.recycle();
        debug!(frame = self.update_frame, "aggregate reset");
    }

    /// Emits everything stamped in the current frame as one patch.
    pub(super) fn flush(&mut self) -> Notification {
        let mut patch = Patch::new();
        let root = self.root;
        self.sync_node(root, Path::new(), &mut patch);
        self.nodes.recycle();
        debug!(frame = self.update_frame, operations = patch.len(), "aggregate patch");
        if patch.is_empty() {
            Notification::Nothing
        } else {
            Notification::Changed(patch)
        }
    }

    fn sync_node(&mut self, node: NodeId, path: Path, out: &mut Patch) {
        let header = self.generate_header(node);
        let incremental = match &self.nodes[node].rendered_header {
            Some(previous) => diff_header(previous, &header, &path, out),
            None => false,
        };
        if !incremental {
            let value = self.render_and_cache(node);
            out.push(PatchOperation::Replace { path, value });
            return;
        }

        let offset = children(&header).len();
        self.nodes[node].rendered_header = Some(header);
        let previous = std::mem::take(&mut self.nodes[node].rendered_children);
        let current = self.nodes[node].children.clone();
        let kept = kept_children(&previous, &current);

        for (position, child) in previous.iter().enumerate().rev() {
            if !kept.contains(child) {
                out.push(PatchOperation::Remove {
                    path: path.with(offset + position),
                });
            }
        }
        for (position, &child) in current.iter().enumerate() {
            if !kept.contains(&child) {
                let value = self.render_and_cache(child);
                out.push(PatchOperation::Add {
                    path: path.with(offset + position),
                    value,
                });
            }
        }

        let frame = self.update_frame;
        for (position, &child) in current.iter().enumerate() {
            if kept.contains(&child) && self.nodes[child].last_update_frame == frame {
                self.sync_node(child, path.with(offset + position), out);
            }
        }
        self.nodes[node].rendered_children = current;
    }
}

/// Records the operations turning header `old` into `new` at `path`.
/// Returns false, recording nothing, when the change is not expressible as
/// attribute edits plus replacements of individual header children.
fn diff_header(old: &Value, new: &Value, path: &Path, out: &mut Patch) -> bool {
    if old == new {
        return true;
    }
    let (Value::Object(old_map), Value::Object(new_map)) = (old, new) else {
        return false;
    };
    let old_children = children(old);
    let new_children = children(new);
    if old_children.len() != new_children.len() {
        return false;
    }

    for key in old_map.keys() {
        if key != CHILDREN_KEY && !new_map.contains_key(key) {
            out.push(PatchOperation::Remove {
                path: path.with(key.as_str()),
            });
        }
    }
    for (key, value) in new_map {
        if key == CHILDREN_KEY {
            continue;
        }
        match old_map.get(key) {
            Some(previous) if previous == value => {}
            Some(_) => out.push(PatchOperation::Replace {
                path: path.with(key.as_str()),
                value: value.clone(),
            }),
            None => out.push(PatchOperation::Add {
                path: path.with(key.as_str()),
                value: value.clone(),
            }),
        }
    }
    for (position, (before, after)) in old_children.iter().zip(new_children).enumerate() {
        if before != after {
            out.push(PatchOperation::Replace {
                path: path.with(position),
                value: after.clone(),
            });
        }
    }
    true
}

/// The children of `old` that can stay in place: the longest run of nodes
/// present in both lists whose relative order is unchanged.
fn kept_children(old: &[NodeId], new: &[NodeId]) -> HashSet<NodeId> {
    let position: HashMap<NodeId, usize> = new
        .iter()
        .enumerate()
        .map(|(index, &node)| (node, index))
        .collect();
    let common: Vec<(NodeId, usize)> = old
        .iter()
        .filter_map(|node| position.get(node).map(|&index| (*node, index)))
        .collect();

    // Longest increasing subsequence of new positions.
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; common.len()];
    for (at, &(_, index)) in common.iter().enumerate() {
        let slot = tails.partition_point(|&tail| common[tail].1 < index);
        if slot > 0 {
            previous[at] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(at);
        } else {
            tails[slot] = at;
        }
    }

    let mut kept = HashSet::new();
    let mut cursor = tails.last().copied();
    while let Some(at) = cursor {
        kept.insert(common[at].0);
        cursor = previous[at];
    }
    kept
}
