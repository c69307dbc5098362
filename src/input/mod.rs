//! # Input Module
//!
//! Joystick input handling.
//!
//! This module handles:
//! - Joystick detection and connection via evdev
//! - Numbering axes and buttons the way the Linux joystick API does
//! - Normalising axis readings around a neutral 0

pub mod device;
pub mod event;
pub mod mapper;

pub use event::JoystickEvent;
