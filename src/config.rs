//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; an empty file yields the defaults.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{DualSenseError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which controller to open
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceConfig {
    #[serde(default)]
    pub serial_number: Option<String>,

    /// Platform HID path; wins over `serial_number`
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub force_bluetooth: bool,
}

/// Polling session configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default = "default_hold_on_open")]
    pub hold_on_open: bool,

    #[serde(default = "default_hold_timeout_ms")]
    pub hold_timeout_ms: u64,
}

/// Reconnect supervisor configuration (binary only)
#[derive(Debug, Deserialize, Clone)]
pub struct SupervisorConfig {
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_status_interval_s")]
    pub status_interval_s: u64,
}

/// Log output configuration (binary only)
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Also write a daily rolling log file here
    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

// Default value functions
fn default_read_timeout_ms() -> u64 { 1000 }
fn default_hold_on_open() -> bool { true }
fn default_hold_timeout_ms() -> u64 { 5000 }

fn default_reconnect_interval_ms() -> u64 { 1000 }
fn default_status_interval_s() -> u64 { 10 }

fn default_file_prefix() -> String { "dualsense-link.log".to_string() }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
            hold_on_open: default_hold_on_open(),
            hold_timeout_ms: default_hold_timeout_ms(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: default_reconnect_interval_ms(),
            status_interval_s: default_status_interval_s(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: default_file_prefix(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> DualSenseError {
    DualSenseError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dualsense_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.device.path {
            if path.is_empty() {
                return Err(invalid("device path cannot be empty when set"));
            }
        }

        if let Some(serial) = &self.device.serial_number {
            if serial.is_empty() {
                return Err(invalid("serial_number cannot be empty when set"));
            }
        }

        if self.session.read_timeout_ms == 0 || self.session.read_timeout_ms > 10000 {
            return Err(invalid("read_timeout_ms must be between 1 and 10000"));
        }

        if self.session.hold_timeout_ms == 0 || self.session.hold_timeout_ms > 60000 {
            return Err(invalid("hold_timeout_ms must be between 1 and 60000"));
        }

        if self.supervisor.reconnect_interval_ms == 0 || self.supervisor.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.supervisor.status_interval_s == 0 {
            return Err(invalid("status_interval_s must be greater than 0"));
        }

        if self.logging.file_prefix.is_empty() {
            return Err(invalid("logging file_prefix cannot be empty"));
        }

        Ok(())
    }
}
