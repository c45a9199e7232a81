//! Ships event batches to the server over the line-framed wire protocol.

use sievedb_server::wire::{READ_BUFFER_SIZE, Request, Response, read_frame, write_frame};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::buffer::EventBuffer;
use crate::config::AgentConfig;
use crate::event::SecurityEvent;

/// Collection every batch is inserted into.
pub const EVENTS_COLLECTION: &str = "security_events";

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Owns the connection to the server and the retry policy. The
/// connection is established lazily and dropped on any failure, so each
/// retry starts from a clean connect.
pub struct BatchSender {
    config: AgentConfig,
    connection: Option<Connection>,
}

impl BatchSender {
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Drain and ship batches forever, pausing `send_interval` between
    /// rounds. Batches that exhaust their retries are dropped with an
    /// error log.
    pub async fn run(&mut self, buffer: &EventBuffer) {
        loop {
            let batch = buffer.next_batch(self.config.batch_size).await;
            if !batch.is_empty() {
                tracing::info!(
                    "sending batch of {} events to collection '{EVENTS_COLLECTION}'",
                    batch.len()
                );
                if self.send_batch(&batch).await {
                    tracing::info!("batch sent successfully");
                } else {
                    tracing::error!(
                        "failed to send batch after {} attempts; {} events dropped",
                        self.config.max_retries,
                        batch.len()
                    );
                }
            }
            tokio::time::sleep(self.config.send_interval).await;
        }
    }

    /// Ship one batch, retrying up to the configured attempt count.
    /// Returns whether the server acknowledged it.
    pub async fn send_batch(&mut self, events: &[SecurityEvent]) -> bool {
        if events.is_empty() {
            return true;
        }
        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                tracing::warn!("retry attempt {attempt} for sending batch");
                tokio::time::sleep(self.config.retry_delay).await;
            }
            match self.try_send(events).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => tracing::error!("send failed: {e}"),
            }
        }
        false
    }

    async fn try_send(&mut self, events: &[SecurityEvent]) -> std::io::Result<bool> {
        if self.connection.is_none() {
            self.connection = Some(self.connect().await?);
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(std::io::ErrorKind::NotConnected.into());
        };

        let request = Request::insert(
            EVENTS_COLLECTION,
            events.iter().map(SecurityEvent::to_value).collect(),
        );

        let exchange = async {
            write_frame(&mut connection.writer, &request).await?;
            read_frame::<_, Response>(&mut connection.reader).await
        }
        .await;

        match exchange {
            Ok(Some(response)) => {
                if response.is_success() {
                    Ok(true)
                } else {
                    tracing::error!("server returned error: {}", response.message);
                    Ok(false)
                }
            }
            Ok(None) => {
                self.connection = None;
                tracing::error!("server closed the connection");
                Err(std::io::ErrorKind::UnexpectedEof.into())
            }
            Err(e) => {
                self.connection = None;
                Err(e)
            }
        }
    }

    async fn connect(&self) -> std::io::Result<Connection> {
        let stream = TcpStream::connect((
            self.config.server_host.as_str(),
            self.config.server_port,
        ))
        .await?;
        tracing::info!(
            "connected to server {}:{}",
            self.config.server_host,
            self.config.server_port
        );
        let (read_half, write_half) = stream.into_split();
        Ok(Connection {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, read_half),
            writer: write_half,
        })
    }
}
