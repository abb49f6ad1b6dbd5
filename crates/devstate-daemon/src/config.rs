//! Daemon configuration loaded from TOML.

use devstate_protocol::Endpoints;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub version: VersionConfig,
    #[serde(default)]
    pub thermal: ThermalConfig,
}

/// Dispatch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Capacity of the dispatch loop's event queue.
    #[serde(default = "default_event_queue")]
    pub event_queue: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            event_queue: default_event_queue(),
        }
    }
}

/// Protocol bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub endpoints: Endpoints,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoints: Endpoints::default(),
        }
    }
}

/// Version reporting settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionConfig {
    /// Reported instead of the crate version when set.
    #[serde(default)]
    pub version: Option<String>,
}

/// Thermal monitoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_shutdown_celsius")]
    pub shutdown_celsius: i32,
    #[serde(default = "default_consecutive_samples")]
    pub consecutive_samples: u32,
    /// Use a simulated sensor that always reads this value.
    #[serde(default)]
    pub simulated_celsius: Option<i32>,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval_secs(),
            shutdown_celsius: default_shutdown_celsius(),
            consecutive_samples: default_consecutive_samples(),
            simulated_celsius: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_queue() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_shutdown_celsius() -> i32 {
    85
}

fn default_consecutive_samples() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("service = \"org.devstate\""));
        assert!(toml_str.contains("shutdown_celsius = 85"));
    }

    #[test]
    fn parse_example_config() {
        let toml_str = r#"
[daemon]
log_level = "debug"

[bridge]
service = "com.example.state"
request_interface = "com.example.state.request"

[version]
version = "2.5.0"

[thermal]
enabled = false
shutdown_celsius = 70
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.daemon.log_level, "debug");
        assert_eq!(config.daemon.event_queue, 256);
        assert!(config.bridge.enabled);
        assert_eq!(config.bridge.endpoints.service, "com.example.state");
        assert_eq!(config.bridge.endpoints.signal_path, "/org/devstate/signal");
        assert_eq!(config.version.version.as_deref(), Some("2.5.0"));
        assert!(!config.thermal.enabled);
        assert_eq!(config.thermal.shutdown_celsius, 70);
        assert_eq!(config.thermal.consecutive_samples, 3);
    }

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.bridge.enabled);
        assert_eq!(config.bridge.endpoints, Endpoints::default());
        assert!(config.version.version.is_none());
    }
}
