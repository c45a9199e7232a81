//! Per-connection request handling.
//!
//! Each accepted socket gets its own `ClientConnection` running in its
//! own task. The handler is sequential on the socket: it reads one
//! newline-framed request, dispatches it under the matching collection
//! gate, and always writes one response frame before reading the next,
//! so requests on one connection are processed in arrival order. A parse
//! error is answered like any other failure and the connection stays
//! open; a panic tears down only this connection's task.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use crate::collection_registry::{
    CollectionRegistry, SharedCollection, validate_collection_name,
};
use crate::error::RequestError;
use crate::server::ClientTable;
use crate::storage::IndexKind;
use crate::wire::{READ_BUFFER_SIZE, Request, Response, write_frame};

/// Bound on acquiring the write side of a collection gate.
pub const WRITE_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Global counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A connection to the database for a single client.
pub struct ClientConnection {
    connection_id: u64,
    peer: String,
    registry: Arc<CollectionRegistry>,
    clients: Arc<ClientTable>,
}

impl ClientConnection {
    /// Create a connection handler and register it in the client table.
    #[must_use]
    pub fn new(registry: Arc<CollectionRegistry>, clients: Arc<ClientTable>, peer: String) -> Self {
        let connection_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        clients.add(connection_id, peer.clone());
        Self {
            connection_id,
            peer,
            registry,
            clients,
        }
    }

    #[must_use]
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Drive the request/response loop until the client disconnects or
    /// the socket fails.
    pub async fn serve(self, stream: TcpStream) {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, read_half);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tracing::debug!("connection {} disconnected", self.connection_id);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("connection {} read error: {e}", self.connection_id);
                    break;
                }
            }

            let frame = line.trim();
            if frame.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Request>(frame) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => Response::error(format!("Server error: {e}")),
            };

            if let Err(e) = write_frame(&mut write_half, &response).await {
                tracing::debug!("connection {} write error: {e}", self.connection_id);
                break;
            }
        }

        self.clients.remove(self.connection_id);
        tracing::info!(
            "connection {} from {} closed; {} clients connected",
            self.connection_id,
            self.peer,
            self.clients.len()
        );
    }

    /// Handle one request, projecting any failure into an error response.
    pub async fn handle_request(&self, request: Request) -> Response {
        match self.process(request).await {
            Ok(response) => response,
            Err(e) => Response::error(e),
        }
    }

    async fn process(&self, request: Request) -> Result<Response, RequestError> {
        let (Some(database), Some(operation)) =
            (request.database.as_deref(), request.operation.as_deref())
        else {
            return Err(RequestError::BadRequest(
                "Invalid request format".to_string(),
            ));
        };

        validate_collection_name(database)
            .map_err(|e| RequestError::BadRequest(e.to_string()))?;

        let collection = self.registry.get_or_create(database)?;
        self.clients.record_request(self.connection_id, database);

        match operation {
            "insert" => self.insert(&collection, request.data).await,
            "find" => self.find(&collection, request.query).await,
            "delete" => self.delete(&collection, request.query).await,
            "create_index" => self.create_index(&collection, request.field).await,
            other => Err(RequestError::BadRequest(format!(
                "Unknown operation: {other}"
            ))),
        }
    }

    /// Acquire the write side of the collection gate within the deadline.
    async fn write_gate<'a>(
        &self,
        collection: &'a SharedCollection,
    ) -> Result<tokio::sync::RwLockWriteGuard<'a, crate::storage::Collection>, RequestError> {
        tokio::time::timeout(WRITE_LOCK_TIMEOUT, collection.write())
            .await
            .map_err(|_| RequestError::LockTimeout)
    }

    async fn insert(
        &self,
        collection: &SharedCollection,
        data: Option<Value>,
    ) -> Result<Response, RequestError> {
        let docs = match data {
            Some(Value::Array(docs)) if !docs.is_empty() => docs,
            _ => {
                return Err(RequestError::BadRequest(
                    "Insert operation requires a non-empty data array".to_string(),
                ));
            }
        };
        // Validate the whole batch up front so a bad document mutates
        // nothing.
        if docs.iter().any(|doc| !doc.is_object()) {
            return Err(RequestError::BadRequest(
                "Document must be a JSON object".to_string(),
            ));
        }

        let mut guard = self.write_gate(collection).await?;
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            ids.push(guard.insert(doc).map_err(RequestError::Engine)?);
        }
        guard.save().map_err(RequestError::Engine)?;

        let count = ids.len();
        tracing::debug!(
            "connection {} inserted {count} documents into '{}'",
            self.connection_id,
            guard.name()
        );
        Ok(Response::success(
            format!("Inserted {count} documents"),
            Some(json!(ids)),
            Some(count),
        ))
    }

    async fn find(
        &self,
        collection: &SharedCollection,
        query: Option<Value>,
    ) -> Result<Response, RequestError> {
        let query = query.ok_or_else(|| {
            RequestError::BadRequest("Find operation requires query".to_string())
        })?;

        let guard = collection.read().await;
        let docs = guard.find(&query);
        drop(guard);

        let count = docs.len();
        Ok(Response::success(
            format!("Found {count} documents"),
            Some(Value::Array(docs)),
            Some(count),
        ))
    }

    async fn delete(
        &self,
        collection: &SharedCollection,
        query: Option<Value>,
    ) -> Result<Response, RequestError> {
        let query = query.ok_or_else(|| {
            RequestError::BadRequest("Delete operation requires query".to_string())
        })?;

        let mut guard = self.write_gate(collection).await?;
        let count = guard.remove(&query);
        // An empty delete leaves the files alone.
        if count > 0 {
            guard.save().map_err(RequestError::Engine)?;
        }

        Ok(Response::success(
            format!("Deleted {count} documents"),
            None,
            Some(count),
        ))
    }

    async fn create_index(
        &self,
        collection: &SharedCollection,
        field: Option<String>,
    ) -> Result<Response, RequestError> {
        let field = match field {
            Some(field) if !field.is_empty() => field,
            _ => {
                return Err(RequestError::BadRequest(
                    "create_index operation requires field".to_string(),
                ));
            }
        };

        let mut guard = self.write_gate(collection).await?;
        let kind = guard.create_index(&field).map_err(RequestError::Engine)?;

        let message = match kind {
            IndexKind::BTree => format!("B-tree index created on numeric field '{field}'"),
            IndexKind::Hash => format!("Hash index created on field '{field}'"),
        };
        tracing::info!("connection {}: {message}", self.connection_id);
        Ok(Response::success(message, None, None))
    }
}
