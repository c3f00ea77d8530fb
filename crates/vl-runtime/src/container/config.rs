//! # Runtime Configuration
//!
//! Defaults, JSON file loading and `VL_*` environment overrides for the
//! dispatch core and the CAN bridge.
//!
//! Durations accept `"250ms"`, `"10s"`, `"2m"` or plain seconds.

use serde::{Deserialize, Serialize};
use shared_bus::DuplicatePolicy;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use vl_01_command_factory::TimeoutPolicy;
use vl_04_can_module::{CanModuleConfig, TcpBusConfig};

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub timeouts: TimeoutConfig,
    pub dispatcher: DispatcherConfig,
    pub can_module: CanModuleSettings,
}

/// Request timeouts and sweep cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for requests without an override.
    #[serde(with = "humantime_serde")]
    pub default: Duration,
    /// Per-function timeouts.
    #[serde(with = "humantime_serde::map")]
    pub overrides: HashMap<String, Duration>,
    /// How often the sweeper reclaims expired requests.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(10),
            overrides: HashMap::new(),
            sweep_interval: Duration::from_millis(100),
        }
    }
}

/// Event dispatcher settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub duplicate_policy: DuplicatePolicy,
}

/// CAN bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanModuleSettings {
    pub enabled: bool,
    /// Gateway address, `host:port`.
    pub address: String,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub max_frame_len: usize,
}

impl Default for CanModuleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:8092".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_frame_len: 64 * 1024,
        }
    }
}

impl RuntimeConfig {
    /// Parse a JSON document; missing sections keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Defaults with environment overrides applied.
    ///
    /// # Environment Variables
    ///
    /// - `VL_REQUEST_TIMEOUT_MS`: default request timeout
    /// - `VL_SWEEP_INTERVAL_MS`: sweeper interval
    /// - `VL_DUPLICATE_POLICY`: `reject` or `replace`
    /// - `VL_CAN_ENABLED`: start the CAN bridge
    /// - `VL_CAN_ADDRESS`: CAN gateway `host:port`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `VL_*` overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("VL_REQUEST_TIMEOUT_MS") {
            self.timeouts.default = Duration::from_millis(parse_value("VL_REQUEST_TIMEOUT_MS", &value)?);
        }
        if let Some(value) = lookup("VL_SWEEP_INTERVAL_MS") {
            self.timeouts.sweep_interval =
                Duration::from_millis(parse_value("VL_SWEEP_INTERVAL_MS", &value)?);
        }
        if let Some(value) = lookup("VL_DUPLICATE_POLICY") {
            self.dispatcher.duplicate_policy = match value.trim().to_lowercase().as_str() {
                "reject" => DuplicatePolicy::Reject,
                "replace" => DuplicatePolicy::Replace,
                _ => return Err(invalid_value("VL_DUPLICATE_POLICY", &value)),
            };
        }
        if let Some(value) = lookup("VL_CAN_ENABLED") {
            self.can_module.enabled = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid_value("VL_CAN_ENABLED", &value)),
            };
        }
        if let Some(value) = lookup("VL_CAN_ADDRESS") {
            self.can_module.address = value.trim().to_string();
        }
        Ok(self)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeouts.default.is_zero() {
            return Err(ConfigError::InvalidTimeout("default timeout must be non-zero".into()));
        }
        if let Some((function, _)) = self.timeouts.overrides.iter().find(|(_, t)| t.is_zero()) {
            return Err(ConfigError::InvalidTimeout(format!(
                "timeout for {function} must be non-zero"
            )));
        }
        if self.timeouts.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidSweepInterval("must be non-zero".into()));
        }
        if self.timeouts.sweep_interval > self.timeouts.default {
            return Err(ConfigError::InvalidSweepInterval(format!(
                "{:?} exceeds the default timeout {:?}",
                self.timeouts.sweep_interval, self.timeouts.default
            )));
        }
        if self.can_module.connect_timeout.is_zero() || self.can_module.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("CAN timeouts must be non-zero".into()));
        }
        if self.can_module.max_frame_len == 0 {
            return Err(ConfigError::InvalidLimit("max_frame_len must be non-zero".into()));
        }
        self.can_address()?;
        Ok(())
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        self.timeouts
            .overrides
            .iter()
            .fold(TimeoutPolicy::new(self.timeouts.default), |policy, (function, timeout)| {
                policy.with_override(function.as_str(), *timeout)
            })
    }

    pub fn can_address(&self) -> Result<SocketAddr, ConfigError> {
        self.can_module
            .address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.can_module.address.clone()))
    }

    pub fn tcp_bus_config(&self) -> Result<TcpBusConfig, ConfigError> {
        Ok(TcpBusConfig {
            address: self.can_address()?,
            connect_timeout: self.can_module.connect_timeout,
            max_frame_len: self.can_module.max_frame_len,
        })
    }

    pub fn can_module_config(&self) -> CanModuleConfig {
        CanModuleConfig {
            request_timeout: self.can_module.request_timeout,
        }
    }
}

fn parse_value(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| invalid_value(key, value))
}

fn invalid_value(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Invalid sweeper interval
    #[error("invalid sweep interval: {0}")]
    InvalidSweepInterval(String),
    /// CAN gateway address does not parse
    #[error("invalid CAN address: {0}")]
    InvalidAddress(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Environment override does not parse
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn format_duration(duration: Duration) -> String {
        if duration.subsec_nanos() == 0 {
            format!("{}s", duration.as_secs())
        } else {
            format!("{}ms", duration.as_millis())
        }
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map_err(|_| "invalid minutes")?
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or("minutes out of range")
        } else {
            // Plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }

    /// Same format for the values of a map.
    pub mod map {
        use serde::ser::SerializeMap;
        use serde::{Deserialize, Deserializer, Serializer};
        use std::collections::HashMap;
        use std::time::Duration;

        pub fn serialize<S>(map: &HashMap<String, Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut out = serializer.serialize_map(Some(map.len()))?;
            for (key, duration) in map {
                out.serialize_entry(key, &super::format_duration(*duration))?;
            }
            out.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<String, Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            HashMap::<String, String>::deserialize(deserializer)?
                .into_iter()
                .map(|(key, text)| {
                    super::parse_duration(&text)
                        .map(|duration| (key, duration))
                        .map_err(serde::de::Error::custom)
                })
                .collect()
        }
    }
}
