//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! ```toml
//! [joystick]
//! device_id = 0
//!
//! [server]
//! host = "192.168.1.20"
//! port = 8080
//!
//! [logging]
//! file = "./logs/drone-client.log"
//! level = "info"
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{DroneError, Result};
use crate::link::codec::Framing;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "configuration.toml";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub joystick: JoystickConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

/// Joystick configuration
#[derive(Debug, Deserialize, Clone)]
pub struct JoystickConfig {
    /// Index among joystick-capable input devices, sorted by path
    pub device_id: u32,

    #[serde(default = "default_throttle_axis")]
    pub throttle_axis: u8,

    #[serde(default = "default_panic_button")]
    pub panic_button: u8,
}

/// Drone server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    #[serde(default)]
    pub framing: Framing,
}

/// Log sink configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub file: String,

    #[serde(default)]
    pub level: LogLevel,
}

/// Throttle ramp configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ThrottleConfig {
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
        }
    }
}

/// Log verbosity
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// Default value functions
fn default_throttle_axis() -> u8 { 4 }
fn default_panic_button() -> u8 { 3 }
fn default_update_interval_ms() -> u64 { 100 }

impl Config {
    /// Load configuration from a TOML file
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
    /// use drone_joystick::config::Config;
    ///
    /// let config = Config::load("configuration.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
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
        if self.server.host.trim().is_empty() {
            return Err(invalid("server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(invalid("server port must be between 1 and 65535"));
        }

        if self.logging.file.trim().is_empty() {
            return Err(invalid("logging file cannot be empty"));
        }

        if self.throttle.update_interval_ms == 0 || self.throttle.update_interval_ms > 10000 {
            return Err(invalid("update_interval_ms must be between 1 and 10000"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> DroneError {
    DroneError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[joystick]
device_id = 0

[server]
host = "127.0.0.1"
port = 8080

[logging]
file = "./logs/drone.log"
"#;

    fn create_valid_config() -> Config {
        Config::from_toml(MINIMAL).unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = create_valid_config();

        assert_eq!(config.joystick.device_id, 0);
        assert_eq!(config.joystick.throttle_axis, 4);
        assert_eq!(config.joystick.panic_button, 3);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.framing, Framing::Newline);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.throttle.update_interval_ms, 100);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[joystick]
device_id = 1
throttle_axis = 2
panic_button = 0

[server]
host = "drone.local"
port = 9000
framing = "length_prefixed"

[logging]
file = "/tmp/drone.log"
level = "debug"

[throttle]
update_interval_ms = 50
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.joystick.device_id, 1);
        assert_eq!(config.joystick.throttle_axis, 2);
        assert_eq!(config.joystick.panic_button, 0);
        assert_eq!(config.server.framing, Framing::LengthPrefixed);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.throttle.update_interval_ms, 50);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = Config::load("/nonexistent/configuration.toml");
        assert!(matches!(result, Err(DroneError::Io(_))));
    }

    #[test]
    fn test_missing_server_section_is_error() {
        let result = Config::from_toml("[joystick]\ndevice_id = 0\n[logging]\nfile = \"x.log\"\n");
        assert!(matches!(result, Err(DroneError::Config(_))));
    }

    #[test]
    fn test_unknown_log_level_is_error() {
        let toml = MINIMAL.replace("file = \"./logs/drone.log\"", "file = \"a.log\"\nlevel = \"loud\"");
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn test_empty_host() {
        let mut config = create_valid_config();
        config.server.host = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_port_zero() {
        let mut config = create_valid_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_file() {
        let mut config = create_valid_config();
        config.logging.file = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_update_interval_zero() {
        let mut config = create_valid_config();
        config.throttle.update_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_update_interval_too_high() {
        let mut config = create_valid_config();
        config.throttle.update_interval_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_throttle_axis(), 4);
        assert_eq!(default_panic_button(), 3);
        assert_eq!(default_update_interval_ms(), 100);
    }
}
