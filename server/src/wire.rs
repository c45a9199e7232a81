//! Wire protocol: newline-framed JSON request/response objects.
//!
//! One frame is one JSON object serialized to a single line and
//! terminated by `\n`. Requests carry a collection name and an
//! operation; responses carry a status, a human-readable message, and,
//! depending on the operation, result data and a count. Fields the
//! engine must validate (`database`, `operation`) are optional here so a
//! malformed frame still decodes and can be answered with a proper
//! error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Receive buffer size per framing unit. Frames larger than this are out
/// of scope for the protocol.
pub const READ_BUFFER_SIZE: usize = 4096;

/// A client request frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Request {
    #[must_use]
    pub fn insert(database: &str, docs: Vec<Value>) -> Self {
        Self {
            database: Some(database.to_string()),
            operation: Some("insert".to_string()),
            data: Some(Value::Array(docs)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn find(database: &str, query: Value) -> Self {
        Self {
            database: Some(database.to_string()),
            operation: Some("find".to_string()),
            query: Some(query),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn delete(database: &str, query: Value) -> Self {
        Self {
            database: Some(database.to_string()),
            operation: Some("delete".to_string()),
            query: Some(query),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn create_index(database: &str, field: &str) -> Self {
        Self {
            database: Some(database.to_string()),
            operation: Some("create_index".to_string()),
            field: Some(field.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// A server response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Response {
    #[must_use]
    pub fn success(message: String, data: Option<Value>, count: Option<usize>) -> Self {
        Self {
            status: Status::Success,
            message,
            data,
            count,
        }
    }

    #[must_use]
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            status: Status::Error,
            message: message.to_string(),
            data: None,
            count: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Write one frame: the message on a single line, newline-terminated.
///
/// # Errors
///
/// Propagates I/O failures; serialization failure surfaces as
/// `InvalidData`.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(message)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

/// Read one frame. Returns `None` on a cleanly closed stream.
///
/// # Errors
///
/// Propagates I/O failures; an undecodable line surfaces as
/// `InvalidData`.
pub async fn read_frame<R, T>(reader: &mut R) -> std::io::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    serde_json::from_str(line.trim_end())
        .map(Some)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
