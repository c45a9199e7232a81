//! A named collection: primary store plus secondary index registries.
//!
//! # Invariants
//!
//! - `_id` is unique within the collection and assigned by the engine.
//! - Every hash index holds exactly the ids of the documents whose field
//!   carries the indexed value; every B-tree index holds each document
//!   with a numeric field value exactly once at that key. Both are
//!   maintained incrementally on insert and delete.
//! - The files on disk reflect the in-memory state as of the last
//!   successful [`Collection::save`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::error::EngineError;
use crate::query::{QueryPlan, evaluate_query};
use crate::storage::btree::BTreeIndex;
use crate::storage::hash_index::HashIndex;
use crate::storage::store::FnvMap;

const HASH_INDEX_SUFFIX: &str = ".index.json";
const BTREE_INDEX_SUFFIX: &str = ".btree.json";

/// Which kind of index `create_index` built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Hash,
    BTree,
}

#[derive(Debug)]
pub struct Collection {
    name: String,
    store_file: PathBuf,
    index_dir: PathBuf,
    store: FnvMap<Value>,
    hash_indexes: HashMap<String, HashIndex>,
    btree_indexes: HashMap<String, BTreeIndex>,
    /// Legacy planner behaviour: when set, an empty index result falls
    /// through to the next access path and finally a full scan. Off by
    /// default; a committed index answers authoritatively, empty or not.
    pub scan_on_index_miss: bool,
}

impl Collection {
    /// Open (creating directories as needed) the collection `name` inside
    /// `base_dir`, loading any persisted store and index files.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or undecodable persisted state.
    pub fn open(base_dir: &Path, name: &str) -> Result<Self, EngineError> {
        let index_dir = base_dir.join("indexes");
        fs::create_dir_all(base_dir)?;
        fs::create_dir_all(&index_dir)?;

        let mut collection = Self {
            name: name.to_string(),
            store_file: base_dir.join(format!("{name}.json")),
            index_dir,
            store: FnvMap::new(),
            hash_indexes: HashMap::new(),
            btree_indexes: HashMap::new(),
            scan_on_index_miss: false,
        };
        collection.load()?;
        Ok(collection)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of documents in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Insert a document, assigning (and overwriting) its `_id`. Every
    /// existing index is updated if the document carries the indexed
    /// field (and, for a B-tree, a numeric value there).
    ///
    /// # Errors
    ///
    /// Fails if `doc` is not a JSON object.
    pub fn insert(&mut self, doc: Value) -> Result<String, EngineError> {
        let Value::Object(mut fields) = doc else {
            return Err(EngineError::InvalidDocument(
                "Document must be a JSON object".to_string(),
            ));
        };

        let id = generate_id();
        fields.insert("_id".to_string(), json!(id));
        let doc = Value::Object(fields);

        for (field, index) in &mut self.hash_indexes {
            if let Some(value) = doc.get(field) {
                index.add(value, &id);
            }
        }
        for (field, tree) in &mut self.btree_indexes {
            if let Some(key) = doc.get(field).and_then(Value::as_f64) {
                tree.insert(key, id.clone());
            }
        }

        self.store.put(id.clone(), doc);
        Ok(id)
    }

    /// Evaluate `query`, answering from a secondary index when the
    /// planner finds one, otherwise by scanning the primary store.
    ///
    /// A B-tree index on the queried field wins over a hash index. Once
    /// an index answers, its result is final (see
    /// [`Self::scan_on_index_miss`] for the legacy fallback).
    #[must_use]
    pub fn find(&self, query: &Value) -> Vec<Value> {
        if let Some(plan) = QueryPlan::for_query(query) {
            if let (Some(btree_plan), Some(tree)) =
                (&plan.btree, self.btree_indexes.get(plan.field))
            {
                let docs = self.fetch(&btree_plan.ids(tree));
                if !docs.is_empty() || !self.scan_on_index_miss {
                    return docs;
                }
            }
            if let (Some(hash_plan), Some(index)) =
                (&plan.hash, self.hash_indexes.get(plan.field))
            {
                let docs = self.fetch(&hash_plan.ids(index));
                if !docs.is_empty() || !self.scan_on_index_miss {
                    return docs;
                }
            }
        }

        self.store
            .items()
            .filter(|(_, doc)| evaluate_query(doc, query))
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    fn fetch(&self, ids: &[String]) -> Vec<Value> {
        ids.iter()
            .filter_map(|id| self.store.get(id).cloned())
            .collect()
    }

    /// Delete every document matching `query`, removing each one's
    /// contribution from every index. Returns the number removed.
    pub fn remove(&mut self, query: &Value) -> usize {
        let matches = self.find(query);
        let mut removed = 0;

        for doc in matches {
            let Some(id) = doc.get("_id").and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };
            if !self.store.remove(&id) {
                continue;
            }
            removed += 1;

            for (field, index) in &mut self.hash_indexes {
                if let Some(value) = doc.get(field) {
                    index.remove(value, &id);
                }
            }
            for (field, tree) in &mut self.btree_indexes {
                if let Some(key) =
                    doc.get(field).and_then(Value::as_f64)
                {
                    tree.remove(key, &id);
                }
            }
        }

        removed
    }

    /// Build an index on `field` from the current store contents and
    /// persist it. If any document holds a numeric value there the index
    /// is a B-tree (documents with absent or non-numeric values stay
    /// invisible to it); otherwise it is a hash index.
    ///
    /// # Errors
    ///
    /// Fails if the index file cannot be written.
    pub fn create_index(&mut self, field: &str) -> Result<IndexKind, EngineError> {
        let numeric = self
            .store
            .items()
            .any(|(_, doc)| doc.get(field).is_some_and(Value::is_number));

        if numeric {
            let mut tree = BTreeIndex::new();
            for (id, doc) in self.store.items() {
                if let Some(key) =
                    doc.get(field).and_then(Value::as_f64)
                {
                    tree.insert(key, id.clone());
                }
            }
            self.save_btree_index(field, &tree)?;
            self.btree_indexes.insert(field.to_string(), tree);
            Ok(IndexKind::BTree)
        } else {
            let mut index = HashIndex::new();
            for (id, doc) in self.store.items() {
                if let Some(value) = doc.get(field) {
                    index.add(value, id);
                }
            }
            self.save_hash_index(field, &index)?;
            self.hash_indexes.insert(field.to_string(), index);
            Ok(IndexKind::Hash)
        }
    }

    /// Rewrite the store file and every index file.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors; in-memory state is untouched either way, so a
    /// later successful save persists the combined state.
    pub fn save(&self) -> Result<(), EngineError> {
        write_atomic(&self.store_file, &pretty(&self.store.to_value()))?;
        for (field, index) in &self.hash_indexes {
            self.save_hash_index(field, index)?;
        }
        for (field, tree) in &self.btree_indexes {
            self.save_btree_index(field, tree)?;
        }
        Ok(())
    }

    fn save_hash_index(&self, field: &str, index: &HashIndex) -> Result<(), EngineError> {
        let path = self.hash_index_file(field);
        write_atomic(&path, &pretty(&index.to_value()))
    }

    fn save_btree_index(&self, field: &str, tree: &BTreeIndex) -> Result<(), EngineError> {
        let path = self.btree_index_file(field);
        write_atomic(&path, &pretty(&tree.to_value()))
    }

    fn hash_index_file(&self, field: &str) -> PathBuf {
        self.index_dir
            .join(format!("{}.{field}{HASH_INDEX_SUFFIX}", self.name))
    }

    fn btree_index_file(&self, field: &str) -> PathBuf {
        self.index_dir
            .join(format!("{}.{field}{BTREE_INDEX_SUFFIX}", self.name))
    }

    fn load(&mut self) -> Result<(), EngineError> {
        if self.store_file.exists() {
            self.store = FnvMap::from_value(read_json(&self.store_file)?)?;
        }

        let prefix = format!("{}.", self.name);
        for entry in fs::read_dir(&self.index_dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(rest) = file_name.strip_prefix(&prefix) else {
                continue;
            };

            if let Some(field) = rest.strip_suffix(HASH_INDEX_SUFFIX) {
                let index = HashIndex::from_value(read_json(&path)?)?;
                self.hash_indexes.insert(field.to_string(), index);
            } else if let Some(field) = rest.strip_suffix(BTREE_INDEX_SUFFIX) {
                let tree = BTreeIndex::from_value(&read_json(&path)?)?;
                self.btree_indexes.insert(field.to_string(), tree);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn hash_index(&self, field: &str) -> Option<&HashIndex> {
        self.hash_indexes.get(field)
    }

    #[cfg(test)]
    pub(crate) fn btree_index(&self, field: &str) -> Option<&BTreeIndex> {
        self.btree_indexes.get(field)
    }
}

/// A fresh document identifier: a random 64-bit value in lowercase hex.
/// Collisions within a collection are considered negligible and are not
/// retried.
fn generate_id() -> String {
    format!("{:x}", rand::random::<u64>())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn read_json(path: &Path) -> Result<Value, EngineError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| EngineError::Corrupt(format!("{}: {e}", path.display())))
}

/// Rewrite `path` through a sibling temp file and a rename, so readers
/// never observe a half-written artifact.
fn write_atomic(path: &Path, contents: &str) -> Result<(), EngineError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
