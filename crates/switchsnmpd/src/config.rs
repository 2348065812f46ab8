//! Configuration file support for switchsnmpd
//!
//! Loads and validates the gateway configuration from a YAML file.
//! Default location: ./config.yaml
//!
//! ```yaml
//! snmp_port: 161
//! snmp_community: public
//! switches:
//!   - name: sw1
//!     address: 192.168.0.10
//!     username: admin
//!     password: secret
//! ```

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// One managed switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Host or host:port of the web management interface
    pub address: String,

    /// Web interface user
    pub username: String,

    /// Web interface password
    pub password: String,

    /// Unique name, used as a segment of every exported identifier
    pub name: String,
}

/// Complete switchsnmpd configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Switches to poll
    pub switches: Vec<SwitchConfig>,

    /// UDP port of the SNMP agent
    pub snmp_port: u16,

    /// SNMP v2c community string
    pub snmp_community: String,

    /// Address the SNMP agent binds to
    #[serde(default = "default_snmp_listen_address")]
    pub snmp_listen_address: IpAddr,

    /// Seconds between two polls of the same switch
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound for one fetch (login + stats page) in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Prometheus endpoint, disabled when absent
    #[serde(default)]
    pub metrics_listen: Option<SocketAddr>,
}

fn default_snmp_listen_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_poll_interval() -> u64 {
    30
}

fn default_fetch_timeout() -> u64 {
    10
}

impl GatewayConfig {
    /// Load configuration from file. A missing or malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            GatewayError::Configuration(msg) => {
                GatewayError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| GatewayError::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Socket address of the SNMP agent
    pub fn snmp_listen(&self) -> SocketAddr {
        SocketAddr::new(self.snmp_listen_address, self.snmp_port)
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.switches.is_empty() {
            return Err(GatewayError::Configuration(
                "at least one switch must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for switch in &self.switches {
            validate_switch_name(&switch.name)?;

            if !seen.insert(switch.name.as_str()) {
                return Err(GatewayError::Configuration(format!(
                    "duplicate switch name '{}'",
                    switch.name
                )));
            }

            if switch.address.trim().is_empty() {
                return Err(GatewayError::Configuration(format!(
                    "switch '{}' has an empty address",
                    switch.name
                )));
            }
        }

        if self.snmp_port == 0 {
            return Err(GatewayError::Configuration(
                "snmp_port must be > 0".to_string(),
            ));
        }

        if self.snmp_community.is_empty() {
            return Err(GatewayError::Configuration(
                "snmp_community must not be empty".to_string(),
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(GatewayError::Configuration(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(GatewayError::Configuration(
                "fetch_timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Switch names become identifier segments: they must be non-empty printable
/// ASCII and must not contain the `.` separator.
fn validate_switch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GatewayError::Configuration(
            "switch name must not be empty".to_string(),
        ));
    }

    if name.contains('.') {
        return Err(GatewayError::Configuration(format!(
            "switch name '{}' must not contain '.'",
            name
        )));
    }

    if !name.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(GatewayError::Configuration(format!(
            "switch name '{}' must be printable ASCII without spaces",
            name
        )));
    }

    Ok(())
}
