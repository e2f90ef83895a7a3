//! YAML configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! USB connection on `/dev/ttyUSB0` at 38400 baud with auto-registration off.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rfxcom_link::{
    BridgeConfig, ConnectionConfig, DEFAULT_BAUDRATE, DEFAULT_HOST, DEFAULT_NETWORK_PORT,
    DEFAULT_PORT,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunnerError};

/// Default device list location.
pub const DEFAULT_DEVICES_FILE: &str = "rfxcom-devices.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionSettings,
    /// Append newly discovered devices to the device list.
    pub auto_registry: bool,
    /// Where the device list is persisted.
    pub devices_file: PathBuf,
    /// Optional external command bridge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            connection: ConnectionSettings::default(),
            auto_registry: false,
            devices_file: PathBuf::from(DEFAULT_DEVICES_FILE),
            bridge: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| RunnerError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&text).map_err(|e| RunnerError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse configuration from YAML text. Empty text yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Config> {
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Serial port handed to the bridge helper.
    ///
    /// `bridge.port` when set, otherwise the transceiver's USB port. A network
    /// connection without `bridge.port` has no port to offer.
    pub fn bridge_port(&self) -> Option<&str> {
        let configured = self
            .bridge
            .as_ref()
            .and_then(|bridge| bridge.port.as_deref())
            .map(str::trim)
            .filter(|port| !port.is_empty());
        match (configured, self.connection.connection_type) {
            (Some(port), _) => Some(port),
            (None, ConnectionType::Usb) => Some(self.connection.port.as_str()),
            (None, ConnectionType::Network) => None,
        }
    }

    /// Whether `protocol` should be sent through the bridge.
    pub fn bridge_handles(&self, protocol: &str) -> bool {
        self.bridge
            .as_ref()
            .is_some_and(|bridge| bridge.handles(protocol))
    }
}

/// Transport kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    Usb,
    Network,
}

/// Transport settings. Only the fields of the selected type are used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub connection_type: ConnectionType,
    pub port: String,
    pub baudrate: u32,
    pub host: String,
    pub network_port: u16,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            connection_type: ConnectionType::Usb,
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            host: DEFAULT_HOST.to_string(),
            network_port: DEFAULT_NETWORK_PORT,
        }
    }
}

impl ConnectionSettings {
    /// The transport to open.
    pub fn to_connection_config(&self) -> ConnectionConfig {
        match self.connection_type {
            ConnectionType::Usb => ConnectionConfig::Usb {
                port: self.port.clone(),
                baudrate: self.baudrate,
            },
            ConnectionType::Network => ConnectionConfig::Network {
                host: self.host.clone(),
                network_port: self.network_port,
            },
        }
    }
}

/// External bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub program: String,
    pub script: PathBuf,
    /// Serial port the helper opens. Defaults to `connection.port` for USB
    /// connections; required with a network connection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Protocols routed through the bridge.
    pub protocols: Vec<String>,
    pub response_timeout_secs: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        let defaults = BridgeConfig::default();
        BridgeSettings {
            program: defaults.program,
            script: defaults.script,
            port: None,
            protocols: vec!["AC".to_string()],
            response_timeout_secs: defaults.response_timeout.as_secs(),
        }
    }
}

impl BridgeSettings {
    /// Whether `protocol` is routed through the bridge (case-insensitive).
    pub fn handles(&self, protocol: &str) -> bool {
        let protocol = protocol.trim();
        self.protocols
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(protocol))
    }

    /// Launch parameters for the helper.
    pub fn to_bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            program: self.program.clone(),
            script: self.script.clone(),
            response_timeout: Duration::from_secs(self.response_timeout_secs),
        }
    }
}
