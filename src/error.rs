//! # Error Types
//!
//! Custom error types for the drone joystick daemon using `thiserror`.

use thiserror::Error;

/// Main error type for the drone joystick daemon
#[derive(Debug, Error)]
pub enum DroneError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No joystick-capable input device at the configured index
    #[error("No joystick found with device id {0}")]
    JoystickNotFound(u32),

    /// Joystick device errors
    #[error("Joystick error: {0}")]
    Joystick(String),

    /// A command was sent before the drone link came up
    #[error("Not connected to drone")]
    NotConnected,

    /// Power command serialization errors
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for the drone joystick daemon
pub type Result<T> = std::result::Result<T, DroneError>;
