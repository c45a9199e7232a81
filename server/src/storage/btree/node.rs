//! B-tree node storage.
//!
//! Nodes live in an arena owned by the tree and refer to each other by
//! dense integer handles; no node owns another. A node holds its keys in
//! ascending order with one posting list per key and, when internal, one
//! child handle per key plus one.

/// Handle into the tree's node arena.
pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub leaf: bool,
    /// Keys in ascending order.
    pub keys: Vec<f64>,
    /// One posting list per key; ids keep insertion order.
    pub ids: Vec<Vec<String>>,
    /// Child handles; empty for leaves, `keys.len() + 1` otherwise.
    pub children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn leaf() -> Self {
        Self {
            leaf: true,
            keys: Vec::new(),
            ids: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A fresh internal node whose only child is `child`; used when the
    /// root splits.
    pub(crate) fn internal_over(child: NodeId) -> Self {
        Self {
            leaf: false,
            keys: Vec::new(),
            ids: Vec::new(),
            children: vec![child],
        }
    }

    /// Position of `key` among this node's keys, or the slot where it
    /// would be inserted, which is also the child index to descend into.
    pub(crate) fn search_keys(&self, key: f64) -> Result<usize, usize> {
        self.keys.binary_search_by(|probe| probe.total_cmp(&key))
    }
}
