//! The B-tree proper: preemptive top-down insertion, point search, and
//! in-order range scans over `f64` keys with id-list payloads.
//!
//! # Invariants
//!
//! - Every node holds at most `2t - 1` keys; non-root nodes hold at least
//!   `t - 1` (the root may hold fewer).
//! - A non-leaf with `k` keys has `k + 1` children.
//! - Keys within a node ascend; a full child is split before descent.
//! - Key slots are unique tree-wide: inserting an existing key appends to
//!   its posting list wherever the slot lives, so a point search always
//!   sees every id for that key and a full range scan emits each key once.
//!
//! Keys come from JSON numbers and are therefore never NaN; `total_cmp`
//! is used for ordering only.

use serde_json::{Map, Value, json};

use super::node::{Node, NodeId};
use crate::error::EngineError;

/// Default minimum degree t.
pub const DEFAULT_MIN_DEGREE: usize = 3;

/// Order-t B-tree from numeric key to a list of document identifiers.
#[derive(Debug, Clone)]
pub struct BTreeIndex {
    t: usize,
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for BTreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::float_cmp)] // keys compare for exact equality by design
impl BTreeIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::with_min_degree(DEFAULT_MIN_DEGREE)
    }

    /// # Panics
    ///
    /// Panics if `t < 2`; a B-tree needs at least degree 2.
    #[must_use]
    pub fn with_min_degree(t: usize) -> Self {
        assert!(t >= 2, "minimum degree must be at least 2");
        Self {
            t,
            nodes: vec![Node::leaf()],
            root: 0,
        }
    }

    fn max_keys(&self) -> usize {
        2 * self.t - 1
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Insert `id` under `key`, appending when the key already exists.
    pub fn insert(&mut self, key: f64, id: String) {
        if self.nodes[self.root].keys.len() == self.max_keys() {
            let old_root = self.root;
            let new_root = self.alloc(Node::internal_over(old_root));
            self.root = new_root;
            self.split_child(new_root, 0);
        }
        self.insert_non_full(self.root, key, id);
    }

    /// Split the full child at `parent.children[i]`: the median key moves
    /// up into the parent and the upper half moves into a fresh sibling.
    fn split_child(&mut self, parent: NodeId, i: usize) {
        let t = self.t;
        let child = self.nodes[parent].children[i];

        let median_key = self.nodes[child].keys[t - 1];
        let median_ids = std::mem::take(&mut self.nodes[child].ids[t - 1]);

        let sibling = Node {
            leaf: self.nodes[child].leaf,
            keys: self.nodes[child].keys.split_off(t),
            ids: self.nodes[child].ids.split_off(t),
            children: if self.nodes[child].leaf {
                Vec::new()
            } else {
                self.nodes[child].children.split_off(t)
            },
        };
        self.nodes[child].keys.truncate(t - 1);
        self.nodes[child].ids.truncate(t - 1);

        let sibling_id = self.alloc(sibling);
        self.nodes[parent].children.insert(i + 1, sibling_id);
        self.nodes[parent].keys.insert(i, median_key);
        self.nodes[parent].ids.insert(i, median_ids);
    }

    fn insert_non_full(&mut self, node: NodeId, key: f64, id: String) {
        if self.nodes[node].leaf {
            match self.nodes[node].search_keys(key) {
                Ok(i) => self.nodes[node].ids[i].push(id),
                Err(i) => {
                    self.nodes[node].keys.insert(i, key);
                    self.nodes[node].ids.insert(i, vec![id]);
                }
            }
            return;
        }

        let mut slot = match self.nodes[node].search_keys(key) {
            // The key already has a slot at this level; append here.
            Ok(i) => {
                self.nodes[node].ids[i].push(id);
                return;
            }
            Err(i) => i,
        };

        let child = self.nodes[node].children[slot];
        if self.nodes[child].keys.len() == self.max_keys() {
            self.split_child(node, slot);
            let promoted = self.nodes[node].keys[slot];
            if key == promoted {
                // The median the split promoted is the key being inserted.
                self.nodes[node].ids[slot].push(id);
                return;
            }
            if key > promoted {
                slot += 1;
            }
        }
        let child = self.nodes[node].children[slot];
        self.insert_non_full(child, key, id);
    }

    /// Ids stored under exactly `key`; empty when the key is absent.
    #[must_use]
    pub fn search(&self, key: f64) -> Vec<String> {
        let mut current = self.root;
        loop {
            let node = &self.nodes[current];
            match node.search_keys(key) {
                Ok(i) => return node.ids[i].clone(),
                Err(i) => {
                    if node.leaf {
                        return Vec::new();
                    }
                    current = node.children[i];
                }
            }
        }
    }

    /// Ids whose keys fall within `[low, high]` as modulated by the
    /// inclusivity flags, ascending by key; insertion order among
    /// duplicates of one key.
    #[must_use]
    pub fn range(&self, low: f64, high: f64, include_low: bool, include_high: bool) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_range(self.root, low, high, include_low, include_high, &mut out);
        out
    }

    fn collect_range(
        &self,
        node: NodeId,
        low: f64,
        high: f64,
        include_low: bool,
        include_high: bool,
        out: &mut Vec<String>,
    ) {
        let n = &self.nodes[node];
        for i in 0..n.keys.len() {
            if !n.leaf {
                self.collect_range(n.children[i], low, high, include_low, include_high, out);
            }
            let key = n.keys[i];
            let above_low = key > low || (include_low && key == low);
            let below_high = key < high || (include_high && key == high);
            if above_low && below_high {
                out.extend(n.ids[i].iter().cloned());
            }
        }
        if !n.leaf {
            self.collect_range(
                n.children[n.keys.len()],
                low,
                high,
                include_low,
                include_high,
                out,
            );
        }
    }

    /// Remove the first occurrence of `id` from the posting list of `key`.
    ///
    /// The key slot stays in place even when its list empties; an emptied
    /// slot contributes nothing to searches or range scans. Returns
    /// whether an id was removed.
    pub fn remove(&mut self, key: f64, id: &str) -> bool {
        let mut current = self.root;
        loop {
            match self.nodes[current].search_keys(key) {
                Ok(i) => {
                    let ids = &mut self.nodes[current].ids[i];
                    return match ids.iter().position(|existing| existing == id) {
                        Some(pos) => {
                            ids.remove(pos);
                            true
                        }
                        None => false,
                    };
                }
                Err(i) => {
                    if self.nodes[current].leaf {
                        return false;
                    }
                    current = self.nodes[current].children[i];
                }
            }
        }
    }

    /// Serialize as the recursive `{leaf, keys, ids, children?}` object,
    /// depth-first from the root.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.node_to_value(self.root)
    }

    fn node_to_value(&self, node: NodeId) -> Value {
        let n = &self.nodes[node];
        let mut obj = Map::new();
        obj.insert("leaf".to_string(), json!(n.leaf));
        obj.insert("keys".to_string(), json!(n.keys));
        obj.insert("ids".to_string(), json!(n.ids));
        if !n.leaf {
            obj.insert(
                "children".to_string(),
                Value::Array(
                    n.children
                        .iter()
                        .map(|&child| self.node_to_value(child))
                        .collect(),
                ),
            );
        }
        Value::Object(obj)
    }

    /// Rebuild a tree from its persisted form, with the default minimum
    /// degree. Malformed input fails as corruption.
    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        let mut tree = Self::new();
        tree.nodes.clear();
        tree.root = tree.load_node(value)?;
        Ok(tree)
    }

    fn load_node(&mut self, value: &Value) -> Result<NodeId, EngineError> {
        let obj = value
            .as_object()
            .ok_or_else(|| corrupt("node must be an object"))?;

        let leaf = obj
            .get("leaf")
            .and_then(Value::as_bool)
            .ok_or_else(|| corrupt("node is missing boolean 'leaf'"))?;

        let keys: Vec<f64> = obj
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| corrupt("node is missing 'keys' array"))?
            .iter()
            .map(|k| k.as_f64().ok_or_else(|| corrupt("non-numeric key")))
            .collect::<Result<_, _>>()?;

        let ids: Vec<Vec<String>> = obj
            .get("ids")
            .and_then(Value::as_array)
            .ok_or_else(|| corrupt("node is missing 'ids' array"))?
            .iter()
            .map(|list| {
                list.as_array()
                    .ok_or_else(|| corrupt("posting list must be an array"))?
                    .iter()
                    .map(|id| {
                        id.as_str()
                            .map(str::to_owned)
                            .ok_or_else(|| corrupt("non-string id"))
                    })
                    .collect::<Result<Vec<String>, _>>()
            })
            .collect::<Result<_, _>>()?;

        if keys.len() != ids.len() {
            return Err(corrupt("keys and ids lengths differ"));
        }

        let children = if leaf {
            Vec::new()
        } else {
            let child_values = obj
                .get("children")
                .and_then(Value::as_array)
                .ok_or_else(|| corrupt("internal node is missing 'children'"))?;
            if child_values.len() != keys.len() + 1 {
                return Err(corrupt("internal node child count mismatch"));
            }
            child_values
                .iter()
                .map(|child| self.load_node(child))
                .collect::<Result<Vec<NodeId>, _>>()?
        };

        Ok(self.alloc(Node {
            leaf,
            keys,
            ids,
            children,
        }))
    }
}

fn corrupt(detail: &str) -> EngineError {
    EngineError::Corrupt(format!("b-tree index: {detail}"))
}
