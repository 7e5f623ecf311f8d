//! Client configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via `--config` or CLI_CONFIG)
//! 3. Environment variables
//!
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "CLI_CONFIG";

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agency identifier, appended to every bet and used for winner queries.
    pub id: String,
    /// Server connection settings.
    pub server: ServerConfig,
    /// Upload batching settings.
    pub batch: BatchConfig,
    /// Winner polling settings.
    pub poll: PollConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: "1".to_string(),
            server: ServerConfig::default(),
            batch: BatchConfig::default(),
            poll: PollConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    ///
    /// An explicit `path` wins over CLI_CONFIG. Without either, defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parses configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Applies environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides looked up through `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("CLI_ID") {
            self.id = id;
        }
        self.server.apply_overrides(&var);
        self.batch.apply_overrides(&var);
        self.poll.apply_overrides(&var);
        self.log.apply_overrides(&var);
    }

    /// Checks values that have no sensible fallback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::Validation("id must not be empty".to_string()));
        }
        if self.server.address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.address must not be empty".to_string(),
            ));
        }
        if self.batch.max_amount == 0 {
            return Err(ConfigError::Validation(
                "batch.max_amount must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of this agency's bet file.
    pub fn records_path(&self) -> PathBuf {
        self.batch.data_dir.join(format!("agency-{}.csv", self.id))
    }
}

/// Server connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server address as `host:port`.
    pub address: String,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: format!("server:{}", lottery_protocol::DEFAULT_PORT),
            connect_timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(address) = var("CLI_SERVER_ADDRESS") {
            self.address = address;
        }

        if let Some(ms) = var("CLI_SERVER_CONNECT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.connect_timeout_ms = ms;
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Upload batching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of bets per chunk.
    pub max_amount: usize,
    /// Directory holding the `agency-<id>.csv` files.
    pub data_dir: PathBuf,
    /// How long to wait for a chunk acknowledgment, in milliseconds.
    pub ack_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_amount: 100,
            data_dir: PathBuf::from("."),
            ack_timeout_ms: 5_000,
        }
    }
}

impl BatchConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(n) = var("CLI_BATCH_MAXAMOUNT").and_then(|v| v.parse().ok()) {
            self.max_amount = n;
        }

        if let Some(dir) = var("CLI_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(ms) = var("CLI_ACK_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.ack_timeout_ms = ms;
        }
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

/// Winner polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Wait between a NOWINN reply and the next request, in milliseconds.
    pub backoff_ms: u64,
    /// Largest reply payload accepted from the server.
    pub max_reply_size: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            backoff_ms: 1_000,
            max_reply_size: lottery_protocol::MAX_PAYLOAD_SIZE,
        }
    }
}

impl PollConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(ms) = var("CLI_POLL_BACKOFF_MS").and_then(|v| v.parse().ok()) {
            self.backoff_ms = ms;
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when RUST_LOG is not set.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(level) = var("CLI_LOG_LEVEL") {
            self.level = level.to_lowercase();
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.address, "server:12345");
        assert_eq!(config.batch.max_amount, 100);
        assert_eq!(config.poll.backoff(), Duration::from_secs(1));
        assert_eq!(config.log.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_records_path() {
        let mut config = Config::default();
        config.id = "3".to_string();
        config.batch.data_dir = PathBuf::from("/data");
        assert_eq!(config.records_path(), PathBuf::from("/data/agency-3.csv"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("CLI_ID", "5"),
            ("CLI_SERVER_ADDRESS", "127.0.0.1:9000"),
            ("CLI_BATCH_MAXAMOUNT", "42"),
            ("CLI_POLL_BACKOFF_MS", "250"),
            ("CLI_LOG_LEVEL", "DEBUG"),
        ]));

        assert_eq!(config.id, "5");
        assert_eq!(config.server.address, "127.0.0.1:9000");
        assert_eq!(config.batch.max_amount, 42);
        assert_eq!(config.poll.backoff_ms, 250);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("CLI_BATCH_MAXAMOUNT", "lots")]));
        assert_eq!(config.batch.max_amount, 100);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "id: \"2\"\nserver:\n  address: \"lottery:7000\"\nbatch:\n  max_amount: 8\n",
        )
        .unwrap();
        assert_eq!(config.id, "2");
        assert_eq!(config.server.address, "lottery:7000");
        assert_eq!(config.server.connect_timeout_ms, 10_000);
        assert_eq!(config.batch.max_amount, 8);
        assert_eq!(config.poll.backoff_ms, 1_000);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.server.address, config.server.address);
        assert_eq!(parsed.batch.data_dir, config.batch.data_dir);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "poll:\n  backoff_ms: 20\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.poll.backoff_ms, 20);

        let missing = Config::from_file(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_bad_yaml_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "batch: [1, 2").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: ref p, .. } if p == &path));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.batch.max_amount = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.id = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.address.clear();
        assert!(config.validate().is_err());
    }
}
