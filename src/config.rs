// Configuration for mediabridge
//
// Loaded from a JSON file with per-field defaults, so an empty file
// (or no file at all) yields a working localhost configuration.

use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_fetch_timeout_secs() -> u64 {
    5
}

fn default_query_command() -> Vec<String> {
    vec!["mediabridge-query".to_string()]
}

fn default_control_command() -> Vec<String> {
    vec!["mediabridge-control".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// MQTT broker hostname or IP
    #[serde(default = "default_broker_host")]
    pub broker_host: String,

    /// MQTT broker port
    #[serde(default = "default_broker_port")]
    pub broker_port: u16,

    /// Seconds between media session polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound on one media query, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Host identifier used in topic names; defaults to the machine
    /// hostname when unset
    #[serde(default)]
    pub host_id: Option<String>,

    /// Helper command (argv vector) that prints one JSON media snapshot
    #[serde(default = "default_query_command")]
    pub query_command: Vec<String>,

    /// Platform control command (argv vector); the action name is
    /// appended as the last argument
    #[serde(default = "default_control_command")]
    pub control_command: Vec<String>,

    /// Log level: error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            broker_host: default_broker_host(),
            broker_port: default_broker_port(),
            poll_interval_secs: default_poll_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            host_id: None,
            query_command: default_query_command(),
            control_command: default_control_command(),
            log_level: default_log_level(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: BridgeConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Host identifier for topic names
    pub fn host_id(&self) -> String {
        match &self.host_id {
            Some(id) => id.clone(),
            None => gethostname::gethostname().to_string_lossy().into_owned(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
