//! Hash index: value-key → ordered list of document identifiers.
//!
//! Indexed field values are reduced to a tagged string key so that values
//! of different kinds can never collide (`"1"` indexes as `s:1`, `1` as
//! `n:1`). Identifier lists keep insertion order; removing the last id
//! under a key drops the key entirely, so an index never holds an empty
//! list.

use serde_json::Value;

use crate::error::EngineError;
use crate::storage::store::FnvMap;

/// Deterministic, type-prefixed key for an indexed field value.
///
/// - strings: `s:<text>`
/// - numbers: `n:<shortest round-trip decimal>`; 1 and 1.0 both give `n:1`
/// - booleans: `b:0` / `b:1`
/// - everything else: `j:<canonical compact serialization>`
#[must_use]
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => format!("s:{s}"),
        Value::Number(n) => format!("n:{}", n.as_f64().unwrap_or(0.0)),
        Value::Bool(b) => format!("b:{}", u8::from(*b)),
        other => format!(
            "j:{}",
            serde_json::to_string(&canonical(other)).unwrap_or_default()
        ),
    }
}

/// Recursively sort object keys so the `j:` encoding is insensitive to
/// member order as well as whitespace.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Secondary index from value-key to the identifiers of the documents
/// holding that value.
#[derive(Debug, Clone, Default)]
pub struct HashIndex {
    entries: FnvMap<Vec<String>>,
}

impl HashIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: FnvMap::new(),
        }
    }

    /// Append `id` to the list under the key derived from `field_value`.
    pub fn add(&mut self, field_value: &Value, id: &str) {
        let key = value_key(field_value);
        match self.entries.get_mut(&key) {
            Some(ids) => ids.push(id.to_string()),
            None => self.entries.put(key, vec![id.to_string()]),
        }
    }

    /// Remove the first occurrence of `id` under the key derived from
    /// `field_value`; drop the key if the list empties.
    pub fn remove(&mut self, field_value: &Value, id: &str) {
        let key = value_key(field_value);
        let Some(ids) = self.entries.get_mut(&key) else {
            return;
        };
        if let Some(pos) = ids.iter().position(|existing| existing == id) {
            ids.remove(pos);
            if ids.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    /// Look up the id list for a field value.
    #[must_use]
    pub fn get(&self, field_value: &Value) -> Option<&Vec<String>> {
        self.entries.get(&value_key(field_value))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every id referenced by the index, in iteration order.
    pub fn all_ids(&self) -> impl Iterator<Item = &String> {
        self.entries.items().flat_map(|(_, ids)| ids.iter())
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        self.entries.to_value()
    }

    pub fn from_value(value: Value) -> Result<Self, EngineError> {
        Ok(Self {
            entries: FnvMap::from_value(value)?,
        })
    }
}
