#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code to prevent panics from corrupt data.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

use std::sync::Arc;

use sievedb_server::Server;
use sievedb_server::config::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sievedb_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        "loaded configuration: database_directory={}, listen_port={}",
        config.database_directory.display(),
        config.listen_port
    );

    // Create the data directory for collections.
    // Pre-condition: config.database_directory is a valid path.
    // Post-condition: The directory exists and is accessible.
    if let Err(e) = std::fs::create_dir_all(&config.database_directory) {
        tracing::error!("failed to create data directory: {e}");
        std::process::exit(1);
    }
    // Paired assertion: verify the directory was actually created and is a directory.
    assert!(
        config.database_directory.is_dir(),
        "database_directory must exist and be a directory after create_dir_all"
    );

    let server = Arc::new(Server::new(config));

    let listener = match server.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind: {e}");
            std::process::exit(1);
        }
    };

    // Serve until interrupted; on ctrl-c, stop accepting and flush every
    // open collection before exiting.
    tokio::select! {
        () = server.serve(listener) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
            tracing::info!("shutting down; saving all collections");
            server.save_all().await;
            tracing::info!("server shutdown complete");
        }
    }
}
