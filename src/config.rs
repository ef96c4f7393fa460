//! Connection configuration.
//!
//! A [`Config`] is built once (from defaults, a JSON file, or the command
//! line) and handed to [`Nucleo`](crate::Nucleo) by value. Nothing in it
//! changes while requests are running.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::error::{NucleoError, Result};

/// Device address parsed from a `host:port` string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for Endpoint {
    type Err = NucleoError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        let (host, port) = match (parts.next(), parts.next(), parts.next()) {
            (Some(host), Some(port), None) => (host, port),
            _ => return Err(NucleoError::InvalidEndpoint(s.to_string())),
        };
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| NucleoError::InvalidPort(port.to_string()))?;
        Ok(Endpoint::new(host.trim(), port))
    }
}

impl TryFrom<String> for Endpoint {
    type Error = NucleoError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::new("192.168.137.120", 61)
    }
}

/// Connection and polling parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: Endpoint,
    pub connect_timeout_ms: u64,
    /// `None` blocks until the device replies or closes the connection
    pub read_timeout_ms: Option<u64>,
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: Endpoint::default(),
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            read_timeout_ms: Some(READ_TIMEOUT_MS),
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Default timing with the given endpoint
    pub fn new(endpoint: Endpoint) -> Self {
        Config {
            endpoint,
            ..Config::default()
        }
    }

    /// Parse a `host:port` string and use default timing
    pub fn from_endpoint_str(endpoint: &str) -> Result<Self> {
        Ok(Config::new(endpoint.parse()?))
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| NucleoError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.connect_timeout_ms == 0 {
            return Err(NucleoError::Config(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.read_timeout_ms == Some(0) {
            return Err(NucleoError::Config(
                "read_timeout_ms must be greater than 0 (use null to block)".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(NucleoError::Config(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
