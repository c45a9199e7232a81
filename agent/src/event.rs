//! The security event record shipped to the server.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One parsed security event.
///
/// `timestamp` is RFC-3339 UTC with millisecond precision, stamped when
/// the event is constructed. `user`, `process`, and `command` are empty
/// when the source line carried no such detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub timestamp: String,
    pub hostname: String,
    pub source: String,
    pub event_type: String,
    pub severity: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub process: String,
    #[serde(default)]
    pub command: String,
    pub raw_log: String,
}

impl SecurityEvent {
    #[must_use]
    pub fn new(source: &str, event_type: &str, severity: &str, raw_log: &str) -> Self {
        Self {
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            hostname: local_hostname(),
            source: source.to_string(),
            event_type: event_type.to_string(),
            severity: severity.to_string(),
            user: String::new(),
            process: String::new(),
            command: String::new(),
            raw_log: raw_log.to_string(),
        }
    }

    /// The document form sent over the wire.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn local_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-host".to_string())
}
