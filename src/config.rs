//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dashboard::DashboardSettings;
use crate::store::{MemoryStoreConfig, WalSyncMode};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Seconds between WebSocket heartbeat pings
    #[serde(default = "default_heartbeat")]
    pub ws_heartbeat_secs: u64,

    #[serde(default = "default_max_connections")]
    pub ws_max_connections: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_heartbeat() -> u64 {
    30
}

fn default_max_connections() -> usize {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:8091".to_string(),
                "http://127.0.0.1:8091".to_string(),
            ],
            ws_heartbeat_secs: default_heartbeat(),
            ws_max_connections: default_max_connections(),
        }
    }
}

/// Store persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Without a WAL the store is volatile
    #[serde(default = "default_wal_enabled")]
    pub wal_enabled: bool,

    #[serde(default)]
    pub wal_sync: WalSyncMode,

    /// WAL entries replayed at startup before the log is compacted
    #[serde(default = "default_compact_threshold")]
    pub compact_threshold: u64,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("energy-tracker").to_string_lossy().to_string())
        .unwrap_or_else(|| "./energy_tracker_data".to_string())
}

fn default_wal_enabled() -> bool {
    true
}

fn default_compact_threshold() -> u64 {
    10_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            wal_enabled: default_wal_enabled(),
            wal_sync: WalSyncMode::default(),
            compact_threshold: default_compact_threshold(),
        }
    }
}

impl StoreConfig {
    pub fn wal_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("store.wal")
    }

    pub fn to_store_config(&self) -> MemoryStoreConfig {
        MemoryStoreConfig {
            wal_path: self.wal_enabled.then(|| self.wal_path()),
            wal_sync: self.wal_sync,
            compact_threshold: self.compact_threshold,
        }
    }
}

/// Dashboard behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_timer_presets")]
    pub timer_presets: Vec<u32>,

    #[serde(default = "default_limit_hours")]
    pub default_limit_hours: f64,

    #[serde(default = "default_unit_price")]
    pub default_unit_price: f64,

    #[serde(default = "default_update_capacity")]
    pub update_capacity: usize,
}

fn default_timer_presets() -> Vec<u32> {
    vec![15, 30, 60, 120]
}

fn default_limit_hours() -> f64 {
    12.0
}

fn default_unit_price() -> f64 {
    8.0
}

fn default_update_capacity() -> usize {
    256
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timer_presets: default_timer_presets(),
            default_limit_hours: default_limit_hours(),
            default_unit_price: default_unit_price(),
            update_capacity: default_update_capacity(),
        }
    }
}

impl DashboardConfig {
    pub fn to_settings(&self) -> DashboardSettings {
        DashboardSettings {
            timer_presets: self.timer_presets.clone(),
            default_limit_hours: self.default_limit_hours,
            default_unit_price: self.default_unit_price,
            update_capacity: self.update_capacity,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> String {
        format!("energy_tracker={},tower_http=debug", self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("energy-tracker").join("config.toml")),
            Some(PathBuf::from("/etc/energy-tracker/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(host) = var("ENERGY_TRACKER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("ENERGY_TRACKER_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Store overrides
        if let Some(data_dir) = var("ENERGY_TRACKER_DATA_DIR") {
            self.store.data_dir = data_dir;
        }
        if let Some(enabled) = var("ENERGY_TRACKER_WAL_ENABLED") {
            if let Ok(b) = enabled.parse() {
                self.store.wal_enabled = b;
            }
        }

        // Dashboard overrides
        if let Some(price) = var("ENERGY_TRACKER_DEFAULT_UNIT_PRICE") {
            if let Ok(p) = price.parse() {
                self.dashboard.default_unit_price = p;
            }
        }

        // Logging overrides
        if let Some(level) = var("ENERGY_TRACKER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("ENERGY_TRACKER_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Energy Tracker Configuration
#
# Environment variables override these settings:
# - ENERGY_TRACKER_HOST
# - ENERGY_TRACKER_PORT
# - ENERGY_TRACKER_DATA_DIR
# - ENERGY_TRACKER_WAL_ENABLED
# - ENERGY_TRACKER_DEFAULT_UNIT_PRICE
# - ENERGY_TRACKER_LOG_LEVEL
# - ENERGY_TRACKER_LOG_FORMAT

[server]
# Server host
host = "0.0.0.0"

# Server port
port = 8090

# Allowed CORS origins
cors_origins = ["http://localhost:8091", "http://127.0.0.1:8091"]

# WebSocket heartbeat interval (seconds)
ws_heartbeat_secs = 30

# Maximum concurrent WebSocket clients
ws_max_connections = 1000

[store]
# Directory for the store's write-ahead log
data_dir = "~/.local/share/energy-tracker"

# Persist writes to a write-ahead log
wal_enabled = true

# WAL sync mode: every_write, batched or none
wal_sync = "batched"

# Compact the WAL at startup once it holds this many entries
compact_threshold = 10000

[dashboard]
# Timer preset buttons (minutes)
timer_presets = [15, 30, 60, 120]

# Limit used for a blank or invalid hour field
default_limit_hours = 12.0

# Price used for a blank or invalid price field
default_unit_price = 8.0

# Buffered view updates per live client
update_capacity = 256

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.store.wal_sync, WalSyncMode::Batched);
        assert_eq!(config.dashboard.timer_presets, vec![15, 30, 60, 120]);
        assert_eq!(config.dashboard.default_limit_hours, 12.0);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.dashboard.default_unit_price, 8.0);
        assert!(config.store.wal_enabled);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ENERGY_TRACKER_PORT", "9100"),
            ("ENERGY_TRACKER_DATA_DIR", "/tmp/et"),
            ("ENERGY_TRACKER_WAL_ENABLED", "false"),
            ("ENERGY_TRACKER_LOG_FORMAT", "json"),
            ("ENERGY_TRACKER_DEFAULT_UNIT_PRICE", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.store.data_dir, "/tmp/et");
        assert!(!config.store.wal_enabled);
        assert!(config.logging.is_json());
        // Unparsable values are ignored
        assert_eq!(config.dashboard.default_unit_price, 8.0);
    }

    #[test]
    fn test_store_config_conversion() {
        let mut store = StoreConfig {
            data_dir: "/var/lib/et".to_string(),
            ..StoreConfig::default()
        };
        assert_eq!(
            store.to_store_config().wal_path,
            Some(PathBuf::from("/var/lib/et/store.wal"))
        );

        store.wal_enabled = false;
        assert!(store.to_store_config().wal_path.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/energy-tracker.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dashboard]\ntimer_presets = [5, 10]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.dashboard.timer_presets, vec![5, 10]);
    }
}
