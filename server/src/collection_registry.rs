//! Registry of open collections, keyed by collection name.
//!
//! Every connection operating on the same collection shares one
//! `Collection` instance behind one reader/writer gate, the
//! `tokio::sync::RwLock` wrapping it. The registry's own lock guards only
//! lookup and insertion (including first-reference materialisation from
//! disk); query execution happens under the per-collection gate, never
//! under the registry lock.
//!
//! # Invariants
//!
//! - Each collection name maps to exactly one `Collection` instance.
//! - Instances are never dropped before shutdown.
//! - Names are validated before they touch the filesystem.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::EngineError;
use crate::storage::Collection;

/// A collection behind its reader/writer gate.
pub type SharedCollection = Arc<tokio::sync::RwLock<Collection>>;

/// Maximum length for a collection name.
const MAX_COLLECTION_NAME_LENGTH: usize = 256;

pub struct CollectionRegistry {
    /// Map from collection name to shared instance.
    collections: RwLock<HashMap<String, SharedCollection>>,
    /// Directory holding every collection's files.
    base_directory: PathBuf,
}

impl CollectionRegistry {
    #[must_use]
    pub fn new(base_directory: PathBuf) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            base_directory,
        }
    }

    #[must_use]
    pub fn base_directory(&self) -> &PathBuf {
        &self.base_directory
    }

    /// Get the collection for `name`, materialising it from disk on first
    /// reference.
    ///
    /// # Pre-conditions
    ///
    /// - `name` passed [`validate_collection_name`].
    ///
    /// # Errors
    ///
    /// Fails if the registry lock is poisoned or the collection cannot be
    /// opened.
    pub fn get_or_create(&self, name: &str) -> Result<SharedCollection, EngineError> {
        // Fast path: already open (read lock only).
        {
            let collections = self
                .collections
                .read()
                .map_err(|_| EngineError::LockPoisoned)?;
            if let Some(collection) = collections.get(name) {
                return Ok(Arc::clone(collection));
            }
        }

        // Slow path: open it (write lock).
        let mut collections = self
            .collections
            .write()
            .map_err(|_| EngineError::LockPoisoned)?;

        // Another task may have opened it while we waited.
        if let Some(collection) = collections.get(name) {
            return Ok(Arc::clone(collection));
        }

        let collection = Collection::open(&self.base_directory, name)?;
        tracing::info!("opened collection '{}' ({} documents)", name, collection.len());

        let shared = Arc::new(tokio::sync::RwLock::new(collection));
        collections.insert(name.to_string(), Arc::clone(&shared));
        Ok(shared)
    }

    /// Save every open collection. Used at shutdown; failures are logged
    /// and do not stop the sweep.
    pub async fn save_all(&self) {
        let open: Vec<(String, SharedCollection)> = match self.collections.read() {
            Ok(collections) => collections
                .iter()
                .map(|(name, shared)| (name.clone(), Arc::clone(shared)))
                .collect(),
            Err(_) => {
                tracing::error!("registry lock poisoned; skipping save sweep");
                return;
            }
        };

        for (name, shared) in open {
            let collection = shared.write().await;
            match collection.save() {
                Ok(()) => tracing::info!("saved collection '{name}'"),
                Err(e) => tracing::error!("failed to save collection '{name}': {e}"),
            }
        }
    }
}

/// Error returned when validating a collection name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionNameError {
    Empty,
    TooLong,
    InvalidCharacters,
}

impl std::fmt::Display for CollectionNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Database name cannot be empty"),
            Self::TooLong => write!(
                f,
                "Database name exceeds maximum length of {MAX_COLLECTION_NAME_LENGTH} characters"
            ),
            Self::InvalidCharacters => write!(
                f,
                "Database name contains invalid characters; only alphanumeric, hyphens, and underscores are allowed"
            ),
        }
    }
}

/// Validate a collection name: non-empty, bounded length, and only
/// alphanumeric characters, hyphens, and underscores. Collection names
/// become file names, so this also rules out path traversal.
pub fn validate_collection_name(name: &str) -> Result<(), CollectionNameError> {
    if name.is_empty() {
        return Err(CollectionNameError::Empty);
    }
    if name.len() > MAX_COLLECTION_NAME_LENGTH {
        return Err(CollectionNameError::TooLong);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CollectionNameError::InvalidCharacters);
    }
    Ok(())
}
