//! In-memory event buffer with optional disk spill.
//!
//! Producers push events; the sender drains batches. When the buffer
//! grows past its capacity and a spill directory is configured, the
//! whole buffer is written to a timestamped JSON file and memory is
//! cleared; spilled files are reloaded (and removed) the next time a
//! buffer is opened over the same directory.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;

use crate::event::SecurityEvent;

/// How long a batch request waits for more events before draining what
/// is there.
const BATCH_WAIT: Duration = Duration::from_secs(1);

const SPILL_PREFIX: &str = "buffer_";
const SPILL_SUFFIX: &str = ".json";

pub struct EventBuffer {
    queue: Mutex<VecDeque<SecurityEvent>>,
    notify: Notify,
    max_memory_events: usize,
    spill_directory: Option<PathBuf>,
    spill_counter: AtomicU64,
}

impl EventBuffer {
    /// Open a buffer. With a spill directory, any previously spilled
    /// files are loaded back into memory and deleted.
    ///
    /// # Errors
    ///
    /// Fails if the spill directory cannot be created or scanned.
    pub fn new(
        max_memory_events: usize,
        spill_directory: Option<PathBuf>,
    ) -> std::io::Result<Self> {
        let buffer = Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            max_memory_events,
            spill_directory,
            spill_counter: AtomicU64::new(0),
        };
        if let Some(dir) = &buffer.spill_directory {
            std::fs::create_dir_all(dir)?;
            buffer.reload_spilled()?;
        }
        Ok(buffer)
    }

    /// Append an event, spilling the whole buffer to disk if it outgrew
    /// its capacity.
    pub fn push(&self, event: SecurityEvent) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.push_back(event);
        if queue.len() > self.max_memory_events && self.spill_directory.is_some() {
            self.spill_locked(&mut queue);
        }
        drop(queue);
        self.notify.notify_one();
    }

    /// Drain up to `batch_size` events, waiting briefly when fewer are
    /// buffered.
    pub async fn next_batch(&self, batch_size: usize) -> Vec<SecurityEvent> {
        if self.len() < batch_size {
            let _ = tokio::time::timeout(BATCH_WAIT, self.notify.notified()).await;
        }
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let count = batch_size.min(queue.len());
        queue.drain(..count).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spill whatever is buffered; used at shutdown so undelivered
    /// events survive a restart.
    pub fn spill_remaining(&self) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if !queue.is_empty() && self.spill_directory.is_some() {
            self.spill_locked(&mut queue);
        }
    }

    /// Write the queue to a fresh spill file and clear it. Memory is
    /// cleared only after a successful write.
    fn spill_locked(&self, queue: &mut VecDeque<SecurityEvent>) {
        let Some(dir) = &self.spill_directory else {
            return;
        };
        let events: Vec<&SecurityEvent> = queue.iter().collect();
        let contents = match serde_json::to_string(&events) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::error!("failed to encode spill file: {e}");
                return;
            }
        };

        let file = dir.join(format!(
            "{SPILL_PREFIX}{}_{:04}{SPILL_SUFFIX}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.spill_counter.fetch_add(1, Ordering::Relaxed)
        ));
        match std::fs::write(&file, contents) {
            Ok(()) => {
                tracing::info!("spilled {} events to {}", queue.len(), file.display());
                queue.clear();
            }
            Err(e) => tracing::error!("failed to write spill file {}: {e}", file.display()),
        }
    }

    fn reload_spilled(&self) -> std::io::Result<()> {
        let Some(dir) = &self.spill_directory else {
            return Ok(());
        };

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| {
                        name.starts_with(SPILL_PREFIX) && name.ends_with(SPILL_SUFFIX)
                    })
            })
            .collect();
        files.sort();

        let mut loaded = 0usize;
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        for file in files {
            let text = std::fs::read_to_string(&file)?;
            match serde_json::from_str::<Vec<SecurityEvent>>(&text) {
                Ok(events) => {
                    loaded += events.len();
                    queue.extend(events);
                    std::fs::remove_file(&file)?;
                }
                Err(e) => {
                    tracing::warn!("skipping undecodable spill file {}: {e}", file.display());
                }
            }
        }
        if loaded > 0 {
            tracing::info!("loaded {loaded} spilled events from {}", dir.display());
        }
        Ok(())
    }
}
