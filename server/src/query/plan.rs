//! Index planning for single-field queries.
//!
//! A query can be answered from a secondary index when it constrains
//! exactly one field (and is not a `$or` composition) with a condition an
//! index understands. The plan records how each index kind could answer;
//! the collection applies the tie-break (B-tree wins over hash) and falls
//! back to a full scan when neither applies.

use serde_json::Value;

use crate::storage::btree::BTreeIndex;
use crate::storage::hash_index::HashIndex;

/// How a B-tree index on the planned field can answer the condition.
#[derive(Debug, Clone, PartialEq)]
pub enum BTreePlan {
    /// `$eq` with a numeric operand.
    Eq(f64),
    /// `$gt` / `$lt` / both; open bounds are infinite.
    Range {
        low: f64,
        high: f64,
        include_low: bool,
        include_high: bool,
    },
}

impl BTreePlan {
    /// Run the plan against a B-tree index.
    #[must_use]
    pub fn ids(&self, tree: &BTreeIndex) -> Vec<String> {
        match *self {
            Self::Eq(key) => tree.search(key),
            Self::Range {
                low,
                high,
                include_low,
                include_high,
            } => tree.range(low, high, include_low, include_high),
        }
    }
}

/// How a hash index on the planned field can answer the condition.
#[derive(Debug, Clone, PartialEq)]
pub enum HashPlan<'a> {
    /// Bare literal or `$eq`.
    Eq(&'a Value),
    /// `$in` with an array operand; id lists union in candidate order.
    In(&'a Vec<Value>),
}

impl HashPlan<'_> {
    /// Run the plan against a hash index.
    #[must_use]
    pub fn ids(&self, index: &HashIndex) -> Vec<String> {
        match self {
            Self::Eq(value) => index.get(value).cloned().unwrap_or_default(),
            Self::In(candidates) => {
                let mut ids = Vec::new();
                for candidate in candidates.iter() {
                    if let Some(list) = index.get(candidate) {
                        ids.extend(list.iter().cloned());
                    }
                }
                ids
            }
        }
    }
}

/// An index-eligible reading of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan<'a> {
    /// The single constrained field.
    pub field: &'a str,
    pub btree: Option<BTreePlan>,
    pub hash: Option<HashPlan<'a>>,
}

impl<'a> QueryPlan<'a> {
    /// Classify `query`. Returns `None` unless the query is an object with
    /// exactly one entry that is not `$or`.
    #[must_use]
    pub fn for_query(query: &'a Value) -> Option<Self> {
        let obj = query.as_object()?;
        if obj.len() != 1 {
            return None;
        }
        let (field, cond) = obj.iter().next()?;
        if field == "$or" {
            return None;
        }

        let Some(ops) = cond.as_object() else {
            // Bare literal: hash equality only.
            return Some(Self {
                field,
                btree: None,
                hash: Some(HashPlan::Eq(cond)),
            });
        };

        // The operator set must be exactly one an index understands;
        // anything extra would make the index answer a superset of the
        // real condition.
        let mut names: Vec<&str> = ops.keys().map(String::as_str).collect();
        names.sort_unstable();

        let btree = match names.as_slice() {
            ["$eq"] => ops.get("$eq").and_then(Value::as_f64).map(BTreePlan::Eq),
            ["$gt"] => ops.get("$gt").and_then(Value::as_f64).map(|low| {
                BTreePlan::Range {
                    low,
                    high: f64::INFINITY,
                    include_low: false,
                    include_high: false,
                }
            }),
            ["$lt"] => ops.get("$lt").and_then(Value::as_f64).map(|high| {
                BTreePlan::Range {
                    low: f64::NEG_INFINITY,
                    high,
                    include_low: false,
                    include_high: false,
                }
            }),
            ["$gt", "$lt"] => match (
                ops.get("$gt").and_then(Value::as_f64),
                ops.get("$lt").and_then(Value::as_f64),
            ) {
                (Some(low), Some(high)) => Some(BTreePlan::Range {
                    low,
                    high,
                    include_low: false,
                    include_high: false,
                }),
                _ => None,
            },
            _ => None,
        };

        let hash = match names.as_slice() {
            ["$eq"] => ops.get("$eq").map(HashPlan::Eq),
            ["$in"] => ops.get("$in").and_then(Value::as_array).map(HashPlan::In),
            _ => None,
        };

        if btree.is_none() && hash.is_none() {
            return None;
        }
        Some(Self { field, btree, hash })
    }
}
