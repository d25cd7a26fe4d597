//! Node identity and the dirty set.
//!
//! Every entity in the tree (output, workspace, column, window) gets a
//! process-unique [`NodeId`] at construction. Mutations record the affected
//! ids in a [`DirtySet`]; the transaction engine drains the set wholesale at
//! each commit, so a mutation arriving mid-drain lands in the next batch.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;

static NODE_IDS: AtomicU64 = AtomicU64::new(1);

/// Identifier of a tree entity.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a unique [`NodeId`].
    pub(crate) fn unique() -> Self {
        Self(NODE_IDS.fetch_add(1, Ordering::SeqCst))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// What kind of entity a [`NodeId`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Output,
    Workspace,
    Column,
    Window,
}

/// Ordered set of entities whose `pending` state differs from `current`.
#[derive(Debug, Default)]
pub struct DirtySet {
    nodes: IndexSet<NodeId>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Take the whole set, leaving a fresh one for mutations that happen while
    /// the batch is in flight.
    pub fn drain(&mut self) -> IndexSet<NodeId> {
        std::mem::take(&mut self.nodes)
    }

    /// Drop an entity that is being freed before it was ever committed.
    pub fn remove(&mut self, id: NodeId) {
        self.nodes.shift_remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_monotonic() {
        let a = NodeId::unique();
        let b = NodeId::unique();
        assert!(b.get() > a.get());
    }

    #[test]
    fn drain_keeps_insertion_order_and_resets() {
        let mut dirty = DirtySet::new();
        let ids: Vec<_> = (0..4).map(|_| NodeId::unique()).collect();
        for &id in ids.iter().rev() {
            dirty.mark(id);
        }
        dirty.mark(ids[3]); // re-marking must not reorder

        let drained: Vec<_> = dirty.drain().into_iter().collect();
        let expected: Vec<_> = ids.iter().rev().copied().collect();
        assert_eq!(drained, expected);
        assert!(dirty.is_empty());
    }
}
