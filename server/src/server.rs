//! The TCP server: listener, accept loop, and connected-client table.
//!
//! One acceptor task hands each connection to an independent
//! [`ClientConnection`] task. The server owns the collection registry and
//! the bookkeeping table of connected clients; the table sits behind its
//! own mutex and is touched only for connect/disconnect and per-request
//! accounting, never during query execution.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::net::TcpListener;

use crate::client_connection::ClientConnection;
use crate::collection_registry::CollectionRegistry;
use crate::config::ServerConfig;

/// Bookkeeping for one connected client.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub address: String,
    pub connected_at: Instant,
    /// Last collection the client touched; empty until the first request.
    pub database: String,
    pub request_count: u64,
}

/// Table of currently connected clients, guarded by its own mutex.
#[derive(Debug, Default)]
pub struct ClientTable {
    clients: Mutex<HashMap<u64, ClientInfo>>,
}

impl ClientTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, connection_id: u64, address: String) {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        clients.insert(
            connection_id,
            ClientInfo {
                address,
                connected_at: Instant::now(),
                database: String::new(),
                request_count: 0,
            },
        );
    }

    pub fn remove(&self, connection_id: u64) {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        clients.remove(&connection_id);
    }

    /// Note a request against `database` from this client.
    pub fn record_request(&self, connection_id: u64, database: &str) {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(info) = clients.get_mut(&connection_id) {
            info.database = database.to_string();
            info.request_count += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<(u64, ClientInfo)> {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, info)| (*id, info.clone()))
            .collect()
    }

    fn log_summary(&self) {
        let clients = self.snapshot();
        tracing::info!("connected clients ({})", clients.len());
        for (id, info) in clients {
            tracing::info!(
                "  connection {id} from {} - db: {}, requests: {}, connected: {}s",
                info.address,
                if info.database.is_empty() {
                    "none"
                } else {
                    info.database.as_str()
                },
                info.request_count,
                info.connected_at.elapsed().as_secs()
            );
        }
    }
}

pub struct Server {
    config: ServerConfig,
    registry: Arc<CollectionRegistry>,
    clients: Arc<ClientTable>,
}

impl Server {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(CollectionRegistry::new(config.database_directory.clone()));
        Self {
            config,
            registry,
            clients: Arc::new(ClientTable::new()),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CollectionRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn clients(&self) -> &Arc<ClientTable> {
        &self.clients
    }

    /// Bind the listener on the configured port (port 0 picks an
    /// ephemeral one).
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be bound.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        let listener =
            TcpListener::bind((Ipv4Addr::UNSPECIFIED, self.config.listen_port)).await?;
        tracing::info!("listening on {}", listener.local_addr()?);
        tracing::info!(
            "database directory: {}",
            self.config.database_directory.display()
        );
        Ok(listener)
    }

    /// Accept connections forever, spawning one handler task each.
    /// Accept failures are logged and do not stop the loop.
    pub async fn serve(&self, listener: TcpListener) {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("accept failed: {e}");
                    continue;
                }
            };

            let connection = ClientConnection::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.clients),
                peer.to_string(),
            );
            tracing::info!(
                "new client {} connected from {peer}; {} clients total",
                connection.connection_id(),
                self.clients.len()
            );
            self.clients.log_summary();

            tokio::spawn(connection.serve(stream));
        }
    }

    /// Save every open collection; used for soft shutdown.
    pub async fn save_all(&self) {
        self.registry.save_all().await;
    }
}
