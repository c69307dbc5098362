//! # Throttle Controller Module
//!
//! Turns joystick events into a stream of motor power updates.
//!
//! ## Throttle Ramp
//!
//! The joystick driver only reports an axis when it changes, so holding the
//! throttle axis away from centre is a single event. While the axis is off
//! centre the controller runs a periodic timer, and every tick moves all four
//! motors one percent:
//!
//! | Axis value | Step | Effect |
//! |------------|------|--------|
//! | `> 0` | `-1` | Slow down |
//! | `< 0` | `+1` | Speed up |
//! | `0` | `0` | Hold, timer stopped |
//!
//! ## Panic Button
//!
//! Pressing the panic button stops the ramp, zeroes every motor and sends the
//! zero vector right away. If the throttle axis is still off centre at that
//! moment the axis is locked out until it passes back through centre, so a
//! held throttle cannot restart the motors on its own.
//!
//! ```text
//!            axis != 0 (unlocked)
//!   Idle  ------------------------->  Ramping
//!     ^   <-------------------------    |
//!     |        axis == 0                |
//!     |                                 | panic (axis != 0)
//!     |        axis == 0                v
//!     +------------------------------ Locked
//! ```

use std::time::Duration;

use tracing::{debug, error, info, trace};

use super::motor::MotorPowerVector;
use super::scheduler::{Scheduler, TimerId};
use crate::config::Config;
use crate::error::DroneError;
use crate::input::event::JoystickEvent;
use crate::link::CommandSink;

/// Axis number of the throttle ("T") axis on the default joystick.
pub const DEFAULT_THROTTLE_AXIS: u8 = 4;

/// Button number of the panic button on the default joystick.
pub const DEFAULT_PANIC_BUTTON: u8 = 3;

/// How often the ramp moves the motors.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Which inputs drive the controller, and how fast it ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleSettings {
    pub throttle_axis: u8,
    pub panic_button: u8,
    pub update_interval: Duration,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            throttle_axis: DEFAULT_THROTTLE_AXIS,
            panic_button: DEFAULT_PANIC_BUTTON,
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}

impl From<&Config> for ThrottleSettings {
    fn from(config: &Config) -> Self {
        Self {
            throttle_axis: config.joystick.throttle_axis,
            panic_button: config.joystick.panic_button,
            update_interval: Duration::from_millis(config.throttle.update_interval_ms),
        }
    }
}

/// Signed per-tick power delta. The ramp is running iff `step != 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleRamp {
    step: i8,
}

impl ThrottleRamp {
    /// Current step: -1, 0 or +1.
    #[must_use]
    pub fn step(&self) -> i8 {
        self.step
    }

    /// True while the ramp is moving the motors.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.step != 0
    }
}

/// Set by the panic button, cleared only by a neutral axis reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanicLock {
    locked: bool,
}

impl PanicLock {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// Observable ramp state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampState {
    /// Step 0, no timer.
    Idle,
    /// Step != 0, timer running.
    Ramping,
    /// Idle after a panic, waiting for the axis to return to centre.
    Locked,
}

/// Stateful joystick-to-motor-power controller.
///
/// Owns the motor vector, the ramp and the panic lock. Every mutation goes
/// through [`handle_axis`](Self::handle_axis),
/// [`handle_button`](Self::handle_button), [`tick`](Self::tick) or
/// [`panic`](Self::panic).
///
/// # Thread Safety
///
/// Not thread-safe. Drive it from a single task; event handlers and ticks
/// must never run concurrently.
#[derive(Debug)]
pub struct ThrottleController<S, K> {
    settings: ThrottleSettings,
    motors: MotorPowerVector,
    ramp: ThrottleRamp,
    lock: PanicLock,
    axis_value: i32,
    timer: Option<TimerId>,
    scheduler: S,
    sink: K,
}

impl<S: Scheduler, K: CommandSink> ThrottleController<S, K> {
    /// Creates a controller with all motors at 0% and the ramp idle.
    #[must_use]
    pub fn new(settings: ThrottleSettings, scheduler: S, sink: K) -> Self {
        Self {
            settings,
            motors: MotorPowerVector::new(),
            ramp: ThrottleRamp::default(),
            lock: PanicLock::default(),
            axis_value: 0,
            timer: None,
            scheduler,
            sink,
        }
    }

    /// Dispatches a joystick event to the axis or button handler.
    pub fn handle_event(&mut self, event: JoystickEvent) {
        match event {
            JoystickEvent::Axis { number, value } => self.handle_axis(number, value),
            JoystickEvent::Button { number, value } => self.handle_button(number, value),
        }
    }

    /// Handles an axis change. Only the throttle axis is used.
    pub fn handle_axis(&mut self, number: u8, value: i32) {
        if number != self.settings.throttle_axis {
            return;
        }

        self.axis_value = value;

        let mut step = 0;
        if value > 0 && !self.lock.locked {
            step = -1;
        } else if value < 0 && !self.lock.locked {
            step = 1;
        } else if value == 0 && self.lock.locked {
            self.lock.locked = false;
            debug!("Throttle axis unlocked");
        }

        self.ramp.step = step;

        if step == 0 {
            self.stop_timer();
        } else if self.timer.is_none() {
            self.timer = Some(self.scheduler.start(self.settings.update_interval));
        }
    }

    /// Handles a button change. Releases are ignored; only the panic button
    /// does anything.
    pub fn handle_button(&mut self, number: u8, value: i32) {
        if value == 0 {
            return;
        }

        if number == self.settings.panic_button {
            info!("Panic button pressed.");
            self.panic();
        }
    }

    /// Handles a fire of the scheduler timer identified by `id`.
    ///
    /// Fires from a timer that has since been cancelled are dropped.
    pub fn on_timer(&mut self, id: TimerId) {
        if self.timer == Some(id) {
            self.tick();
        } else {
            trace!("Ignoring stale timer {}", id.get());
        }
    }

    /// Moves every motor one step and sends the vector.
    ///
    /// A motor whose power would leave 0-100 is skipped for this tick. The
    /// vector is sent even if nothing changed.
    pub fn tick(&mut self) {
        self.motors.apply_step(self.ramp.step);
        self.emit();
    }

    /// Stops the ramp, zeroes every motor and sends the zero vector now.
    ///
    /// If the throttle axis is off centre it stays locked out until it reads
    /// 0 again.
    pub fn panic(&mut self) {
        if self.axis_value != 0 {
            self.lock.locked = true;
        }
        self.stop_timer();
        self.ramp.step = 0;
        self.motors.stop();
        info!("All motors stopped");

        self.emit();
    }

    fn stop_timer(&mut self) {
        if let Some(id) = self.timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn emit(&mut self) {
        debug!("Sending motor power {}", self.motors);

        match self.sink.send(&self.motors) {
            Ok(()) => {}
            Err(DroneError::NotConnected) => {
                error!("Not connected to drone! Can not send data.");
            }
            Err(e) => {
                error!("Failed to send motor power: {}", e);
            }
        }
    }

    /// Current motor powers.
    #[must_use]
    pub fn motors(&self) -> &MotorPowerVector {
        &self.motors
    }

    /// Current ramp.
    #[must_use]
    pub fn ramp(&self) -> ThrottleRamp {
        self.ramp
    }

    /// Current panic lock.
    #[must_use]
    pub fn lock(&self) -> PanicLock {
        self.lock
    }

    /// Last reading of the throttle axis.
    #[must_use]
    pub fn axis_value(&self) -> i32 {
        self.axis_value
    }

    /// The running ramp timer, if any.
    #[must_use]
    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// Ramp state as a state machine.
    #[must_use]
    pub fn state(&self) -> RampState {
        if self.ramp.is_active() {
            RampState::Ramping
        } else if self.lock.locked {
            RampState::Locked
        } else {
            RampState::Idle
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }
}
