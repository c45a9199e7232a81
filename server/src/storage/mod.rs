//! Per-collection storage engine.
//!
//! A collection composes a primary document store with two families of
//! secondary indexes and persists all three as JSON artifacts in the
//! database directory:
//!
//! - `<collection>.json`: the primary store, an object mapping
//!   identifier to document
//! - `indexes/<collection>.<field>.index.json`: a hash index, an object
//!   mapping value-key to an array of identifiers
//! - `indexes/<collection>.<field>.btree.json`: a B-tree index, a
//!   recursive `{leaf, keys, ids, children?}` node object
//!
//! Saves rewrite whole files (write-to-temp, then rename); there is no
//! incremental persistence.

pub mod btree;
pub mod collection;
pub mod hash_index;
pub mod store;

pub use btree::BTreeIndex;
pub use collection::{Collection, IndexKind};
pub use hash_index::{HashIndex, value_key};
pub use store::FnvMap;
