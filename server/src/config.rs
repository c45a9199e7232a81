use std::path::PathBuf;

/// Server configuration.
///
/// # Invariants
/// - Configuration is immutable after creation.
/// - `listen_port` is a valid port number; 0 binds an ephemeral port.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory where collection files are stored.
    pub database_directory: PathBuf,
    /// Port the server listens on.
    pub listen_port: u16,
}

impl ServerConfig {
    /// Loads server configuration from environment variables, falling
    /// back to defaults for any that are unset.
    ///
    /// # Environment Variables
    /// - `SIEVEDB_DATA_DIRECTORY`: database directory path (default: "./data")
    /// - `SIEVEDB_LISTEN_PORT`: server listen port (default: 4720)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_reader(|key| std::env::var(key))
    }

    /// Loads server configuration using a custom environment reader, so
    /// tests can supply their own environment.
    #[must_use]
    pub fn from_env_reader<F, E>(env_reader: F) -> Self
    where
        F: Fn(&str) -> Result<String, E>,
    {
        let database_directory = env_reader("SIEVEDB_DATA_DIRECTORY")
            .map_or_else(|_| PathBuf::from("./data"), PathBuf::from);

        let listen_port = env_reader("SIEVEDB_LISTEN_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4720);

        Self {
            database_directory,
            listen_port,
        }
    }
}
