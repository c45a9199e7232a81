use std::path::PathBuf;
use std::time::Duration;

/// Agent configuration, loaded from environment variables.
///
/// # Environment Variables
/// - `SIEVEDB_AGENT_SERVER_HOST`: server host (default: "127.0.0.1")
/// - `SIEVEDB_AGENT_SERVER_PORT`: server port (default: 4720)
/// - `SIEVEDB_AGENT_BATCH_SIZE`: events per insert frame (default: 100)
/// - `SIEVEDB_AGENT_SEND_INTERVAL_SECS`: pause between batches (default: 10)
/// - `SIEVEDB_AGENT_MAX_RETRIES`: attempts per batch (default: 3)
/// - `SIEVEDB_AGENT_RETRY_DELAY_SECS`: pause between attempts (default: 5)
/// - `SIEVEDB_AGENT_MAX_MEMORY_EVENTS`: buffer capacity (default: 10000)
/// - `SIEVEDB_AGENT_SPILL_DIRECTORY`: overflow spill directory
///   (default: unset, overflow stays in memory)
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub server_host: String,
    pub server_port: u16,
    pub batch_size: usize,
    pub send_interval: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_memory_events: usize,
    pub spill_directory: Option<PathBuf>,
}

impl AgentConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_reader(|key| std::env::var(key))
    }

    /// Loads configuration using a custom environment reader, so tests
    /// can supply their own environment.
    #[must_use]
    pub fn from_env_reader<F, E>(env_reader: F) -> Self
    where
        F: Fn(&str) -> Result<String, E>,
    {
        let parse = |key: &str| env_reader(key).ok().and_then(|s| s.parse::<u64>().ok());

        Self {
            server_host: env_reader("SIEVEDB_AGENT_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env_reader("SIEVEDB_AGENT_SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4720),
            batch_size: parse("SIEVEDB_AGENT_BATCH_SIZE").unwrap_or(100) as usize,
            send_interval: Duration::from_secs(
                parse("SIEVEDB_AGENT_SEND_INTERVAL_SECS").unwrap_or(10),
            ),
            max_retries: parse("SIEVEDB_AGENT_MAX_RETRIES").unwrap_or(3) as u32,
            retry_delay: Duration::from_secs(parse("SIEVEDB_AGENT_RETRY_DELAY_SECS").unwrap_or(5)),
            max_memory_events: parse("SIEVEDB_AGENT_MAX_MEMORY_EVENTS").unwrap_or(10_000) as usize,
            spill_directory: env_reader("SIEVEDB_AGENT_SPILL_DIRECTORY")
                .ok()
                .map(PathBuf::from),
        }
    }
}
