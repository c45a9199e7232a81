#![cfg_attr(not(test), deny(clippy::unwrap_used))]

use std::sync::Arc;

use anyhow::Context;
use sievedb_agent::{AgentConfig, BatchSender, EventBuffer, SecurityEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sievedb_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env();
    tracing::info!(
        "agent starting; server {}:{}, batch size {}, send interval {:?}",
        config.server_host,
        config.server_port,
        config.batch_size,
        config.send_interval
    );

    let buffer = Arc::new(
        EventBuffer::new(config.max_memory_events, config.spill_directory.clone())
            .context("open event buffer")?,
    );

    // Upstream collectors write one event per line on stdin: either a
    // full event object, or a raw line that gets wrapped as-is.
    let feed_buffer = Arc::clone(&buffer);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let event = serde_json::from_str::<SecurityEvent>(line)
                        .unwrap_or_else(|_| SecurityEvent::new("stdin", "raw", "info", line));
                    feed_buffer.push(event);
                }
                Ok(None) => {
                    tracing::info!("event input closed");
                    break;
                }
                Err(e) => {
                    tracing::warn!("failed to read event line: {e}");
                    break;
                }
            }
        }
    });

    let mut sender = BatchSender::new(config);
    tokio::select! {
        () = sender.run(&buffer) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("listen for shutdown signal")?;
            if buffer.is_empty() {
                tracing::info!("shutting down; buffer is empty");
            } else {
                tracing::info!("shutting down; spilling {} buffered events", buffer.len());
                buffer.spill_remaining();
            }
        }
    }

    Ok(())
}
