//! # Drone Joystick Library
//!
//! Fly a quadcopter's throttle from a joystick.
//!
//! This library turns joystick axis and button events into a stream of
//! four-motor power commands and sends them to the drone server over TCP.

pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod link;
pub mod logging;
