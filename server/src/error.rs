//! Error taxonomy for the engine and the request dispatch layer.
//!
//! Storage code raises [`EngineError`]; the dispatch layer wraps it in
//! [`RequestError`] together with the two failure kinds that originate
//! outside the engine (malformed requests and gate timeouts). The wire
//! response for a failed request is the `Display` rendering of the
//! `RequestError` variant, so every error a client can observe is
//! enumerated here.

use thiserror::Error;

/// A failure inside the storage engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Reading or writing a collection or index file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted collection or index file could not be decoded.
    #[error("corrupted persisted state: {0}")]
    Corrupt(String),

    /// A document failed structural validation.
    #[error("{0}")]
    InvalidDocument(String),

    /// The collection registry lock was poisoned by a panicking thread.
    #[error("collection registry lock poisoned")]
    LockPoisoned,
}

/// A failure surfaced to a client, one variant per wire error kind.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request frame was structurally invalid: missing `database` or
    /// `operation`, an unknown operation, an empty collection name, `data`
    /// that is not a non-empty array of objects, or a missing `query`.
    #[error("{0}")]
    BadRequest(String),

    /// The write side of the collection gate could not be acquired within
    /// the deadline.
    #[error("Database lock timeout")]
    LockTimeout,

    /// The storage engine failed; the message carries the underlying cause.
    #[error("Operation failed: {0}")]
    Engine(#[from] EngineError),
}
