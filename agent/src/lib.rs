// Life of an event:
// 1. A parsed security event arrives from the collector
// 2. It lands in the in-memory buffer (spilling to disk past capacity)
// 3. The sender drains a batch on its interval and ships it to the
//    server as one `insert` frame into the `security_events` collection
// 4. The one-line response is checked; failed batches retry with a
//    fixed delay, reconnecting each attempt

pub mod buffer;
pub mod config;
pub mod event;
pub mod sender;

pub use buffer::EventBuffer;
pub use config::AgentConfig;
pub use event::SecurityEvent;
pub use sender::BatchSender;
