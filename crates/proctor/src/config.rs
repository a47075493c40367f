//! Layered configuration: defaults, then `proctor.toml`, then `PROCTOR__*`

use backend_client::BackendConfig;
use serde::{Deserialize, Serialize};
use session_control::SessionConfig;
use std::net::SocketAddr;
use std::path::Path;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level (`trace` .. `error`)
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Replay driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Answer to the exit confirmation prompt
    pub confirm_exit: bool,
    /// Recorder chunk interval (milliseconds)
    pub chunk_interval_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            confirm_exit: true,
            chunk_interval_ms: 1000,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProctorConfig {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub replay: ReplayConfig,
    /// Prometheus scrape endpoint; no exporter when unset
    pub metrics_listen: Option<SocketAddr>,
}

impl ProctorConfig {
    /// Load from `path` (optional) layered under `PROCTOR__SECTION__KEY`
    /// environment variables
    pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("PROCTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
