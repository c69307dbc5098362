//! # Controller Module
//!
//! Joystick-driven throttle control.
//!
//! This module handles:
//! - The four-motor power vector
//! - The throttle ramp driven by a periodic timer
//! - The panic button and its axis lock

pub mod motor;
pub mod scheduler;
pub mod throttle;

pub use motor::{MotorPower, MotorPowerVector};
pub use scheduler::{Scheduler, TimerId, TokioScheduler};
pub use throttle::{RampState, ThrottleController, ThrottleSettings};
