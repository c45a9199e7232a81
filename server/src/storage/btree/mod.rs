//! Order-t B-tree index over a numeric document field.

mod node;
mod tree;

pub use tree::{BTreeIndex, DEFAULT_MIN_DEGREE};
