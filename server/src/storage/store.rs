//! The primary document store and its bucketed map.
//!
//! [`FnvMap`] is a separate-chaining hash map with a fixed, seedless hash
//! (FNV-1a with per-byte post-mixing) so that bucket placement, and with
//! it iteration order, is reproducible across processes. The primary
//! store keys documents by identifier; the hash index layer reuses the
//! same structure with id-list values.
//!
//! # Invariants
//!
//! - The load factor never exceeds 0.75 after an insertion; crossing the
//!   threshold doubles the bucket array and rehashes every entry.
//! - Iteration order is unspecified but stable between mutations.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::EngineError;

const INITIAL_BUCKETS: usize = 16;
const MAX_LOAD_FACTOR: f64 = 0.75;

/// FNV-1a over the key bytes, with an avalanche step folded into each
/// round. The algorithm is fixed: persisted collections must observe the
/// same bucket layout wherever they are loaded.
fn mixed_fnv1a(key: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in key.as_bytes() {
        h ^= u64::from(byte);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
    }
    h
}

/// Separate-chaining map from string key to `V`.
#[derive(Debug, Clone)]
pub struct FnvMap<V> {
    buckets: Vec<Vec<(String, V)>>,
    len: usize,
}

impl<V> Default for FnvMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FnvMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: (0..INITIAL_BUCKETS).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn bucket_index(&self, key: &str) -> usize {
        (mixed_fnv1a(key) % self.buckets.len() as u64) as usize
    }

    /// Insert or overwrite the entry for `key`.
    pub fn put(&mut self, key: String, value: V) {
        if (self.len + 1) as f64 / self.buckets.len() as f64 > MAX_LOAD_FACTOR {
            self.rehash(self.buckets.len() * 2);
        }
        let idx = self.bucket_index(&key);
        for entry in &mut self.buckets[idx] {
            if entry.0 == key {
                entry.1 = value;
                return;
            }
        }
        self.buckets[idx].push((key, value));
        self.len += 1;
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        let idx = self.bucket_index(key);
        self.buckets[idx]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.bucket_index(key);
        self.buckets[idx]
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Remove the entry for `key`. Returns whether an entry was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let idx = self.bucket_index(key);
        let chain = &mut self.buckets[idx];
        match chain.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                chain.remove(pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Iterate entries in bucket order. The order is unspecified but does
    /// not change between mutations.
    pub fn items(&self) -> impl Iterator<Item = (&String, &V)> {
        self.buckets
            .iter()
            .flat_map(|chain| chain.iter().map(|(k, v)| (k, v)))
    }

    fn rehash(&mut self, new_buckets: usize) {
        let mut table: Vec<Vec<(String, V)>> = (0..new_buckets).map(|_| Vec::new()).collect();
        for chain in self.buckets.drain(..) {
            for (key, value) in chain {
                let idx = (mixed_fnv1a(&key) % new_buckets as u64) as usize;
                table[idx].push((key, value));
            }
        }
        self.buckets = table;
    }
}

impl<V: Serialize> FnvMap<V> {
    /// Serialize as a JSON object keyed by entry key.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (key, value) in self.items() {
            obj.insert(
                key.clone(),
                serde_json::to_value(value).unwrap_or(Value::Null),
            );
        }
        Value::Object(obj)
    }
}

impl<V: DeserializeOwned> FnvMap<V> {
    /// Rebuild a map from the JSON object form produced by [`Self::to_value`].
    pub fn from_value(value: Value) -> Result<Self, EngineError> {
        let Value::Object(obj) = value else {
            return Err(EngineError::Corrupt(
                "store file must contain a JSON object".to_string(),
            ));
        };
        let mut map = Self::new();
        for (key, entry) in obj {
            let parsed = serde_json::from_value(entry)
                .map_err(|e| EngineError::Corrupt(format!("entry '{key}': {e}")))?;
            map.put(key, parsed);
        }
        Ok(map)
    }
}
