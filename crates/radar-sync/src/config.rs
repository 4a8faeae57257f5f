//! # Sync Configuration
//!
//! Configuration for the hub server and the save-then-notify engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RADAR_DB_PATH=/var/lib/radar/radar.db                              │
//! │     RADAR_REDIS_URL=redis://broker:6379                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/radar-sync/sync.toml (Linux)                             │
//! │     ~/Library/Application Support/org.radar.radar-sync/sync.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./radar.db, port 8765, in-process bus, 256 lines x 512 chars       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [database]
//! path = "/var/lib/radar/radar.db"
//! max_connections = 5
//!
//! [hub]
//! port = 8765
//! bind_addr = "0.0.0.0"
//!
//! [transport]
//! redis_url = "redis://broker:6379"  # omit for the in-process bus
//! bus_capacity = 1024
//!
//! [limits]
//! max_lines = 256
//! max_line_len = 512
//! ```

use radar_core::LineLimits;
use radar_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Database Settings
// =============================================================================

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on the SQLite write lock (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./radar.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Hub Server Settings
// =============================================================================

/// Listener settings for the HTTP API and WebSocket hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    /// Port for the HTTP/WebSocket server.
    #[serde(default = "default_hub_port")]
    pub port: u16,

    /// Bind address (default: 0.0.0.0 for all interfaces).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_hub_port() -> u16 {
    8765
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

impl Default for HubSettings {
    fn default() -> Self {
        HubSettings {
            port: default_hub_port(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl HubSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// =============================================================================
// Transport Settings
// =============================================================================

/// Which transport carries change notifications.
///
/// ## Transport Selection
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                      Transport Selection                                │
/// │                                                                         │
/// │  redis_url unset (Default)          │  redis_url set                    │
/// │  ──────────────────────────         │  ──────────────                   │
/// │  • LocalBus (tokio broadcast)       │  • PUBLISH topic '[..]'           │
/// │  • /ws hub relays to sessions       │  • Sessions subscribe on Redis    │
/// │  • Single hub process               │  • Several hub processes          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Redis URL (`redis://` or `rediss://`). None selects the in-process bus.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Buffered events per in-process subscriber before it starts lagging.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_bus_capacity() -> usize {
    1024
}

impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings {
            redis_url: None,
            bus_capacity: default_bus_capacity(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Persistence settings.
    #[serde(default)]
    pub database: DatabaseSettings,

    /// HTTP/WebSocket listener.
    #[serde(default)]
    pub hub: HubSettings,

    /// Notification transport.
    #[serde(default)]
    pub transport: TransportSettings,

    /// List size limits enforced before any write.
    #[serde(default)]
    pub limits: LineLimits,
}

impl SyncConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(SyncError::Config("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(SyncError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if let Some(ref raw) = self.transport.redis_url {
            let parsed = url::Url::parse(raw)?;
            if !matches!(parsed.scheme(), "redis" | "rediss") {
                return Err(SyncError::Config(format!(
                    "Redis URL must start with redis:// or rediss://, got: {}",
                    raw
                )));
            }
        }

        if self.transport.bus_capacity == 0 {
            return Err(SyncError::Config(
                "transport.bus_capacity must be greater than 0".into(),
            ));
        }

        if self.limits.max_lines == 0 || self.limits.max_line_len == 0 {
            return Err(SyncError::Config("limits must be greater than 0".into()));
        }

        Ok(())
    }

    /// Applies overrides from a key lookup (the process environment in
    /// [`SyncConfig::load`]).
    ///
    /// Unparseable numeric values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("RADAR_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(port) = lookup("RADAR_HUB_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding hub port from environment");
                    self.hub.port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid RADAR_HUB_PORT"),
            }
        }

        if let Some(addr) = lookup("RADAR_BIND_ADDR") {
            self.hub.bind_addr = addr;
        }

        if let Some(url) = lookup("RADAR_REDIS_URL") {
            debug!("Overriding Redis URL from environment");
            self.transport.redis_url = if url.trim().is_empty() { None } else { Some(url) };
        }

        if let Some(cap) = lookup("RADAR_BUS_CAPACITY") {
            match cap.parse::<usize>() {
                Ok(c) => self.transport.bus_capacity = c,
                Err(_) => warn!(value = %cap, "Ignoring invalid RADAR_BUS_CAPACITY"),
            }
        }

        if let Some(max) = lookup("RADAR_MAX_LINES") {
            match max.parse::<usize>() {
                Ok(m) => self.limits.max_lines = m,
                Err(_) => warn!(value = %max, "Ignoring invalid RADAR_MAX_LINES"),
            }
        }

        if let Some(max) = lookup("RADAR_MAX_LINE_LEN") {
            match max.parse::<usize>() {
                Ok(m) => self.limits.max_line_len = m,
                Err(_) => warn!(value = %max, "Ignoring invalid RADAR_MAX_LINE_LEN"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "radar", "radar-sync")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Builds the database pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    /// Returns the Redis URL if the Redis transport is selected.
    pub fn redis_url(&self) -> Option<&str> {
        self.transport.redis_url.as_deref()
    }
}
