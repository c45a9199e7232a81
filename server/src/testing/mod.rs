//! Common helpers for tests that drive a real server over TCP.

use std::net::SocketAddr;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::Server;
use crate::config::ServerConfig;
use crate::wire::{READ_BUFFER_SIZE, Request, Response, read_frame, write_frame};

/// A server bound to an ephemeral port on a fresh temporary directory.
pub(crate) struct TestServer {
    pub addr: SocketAddr,
    pub server: Arc<Server>,
    /// Owns the database directory; dropping it deletes the files.
    pub dir: TempDir,
}

pub(crate) async fn start_test_server() -> TestServer {
    let dir = tempfile::tempdir().expect("create temp dir");
    start_test_server_in(dir).await
}

/// Start a server over an existing directory, e.g. to simulate a restart
/// against previously persisted state.
pub(crate) async fn start_test_server_in(dir: TempDir) -> TestServer {
    let config = ServerConfig {
        database_directory: dir.path().to_path_buf(),
        listen_port: 0,
    };
    let server = Arc::new(Server::new(config));
    let listener = server.bind().await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    let accept_server = Arc::clone(&server);
    tokio::spawn(async move { accept_server.serve(listener).await });

    TestServer { addr, server, dir }
}

/// A client speaking the line-framed protocol.
pub(crate) struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect to server");
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, read_half),
            writer: write_half,
        }
    }

    /// Send one request frame and wait for its response frame.
    pub async fn request(&mut self, request: &Request) -> Response {
        write_frame(&mut self.writer, request)
            .await
            .expect("write request frame");
        read_frame(&mut self.reader)
            .await
            .expect("read response frame")
            .expect("server closed the connection")
    }

    /// Send a raw line (possibly malformed) and wait for the response.
    pub async fn send_raw(&mut self, line: &str) -> Response {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write raw frame");
        read_frame(&mut self.reader)
            .await
            .expect("read response frame")
            .expect("server closed the connection")
    }
}
