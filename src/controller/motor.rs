//! # Motor Power Module
//!
//! The four-slot motor power vector the throttle controller maintains.
//!
//! Slot `i` always drives pin `i` (ServoBlaster numbering on the drone side).
//! Power is a percentage in `0..=100`.

use std::fmt;

use serde::Serialize;

/// Number of motors on the airframe.
pub const MOTOR_COUNT: usize = 4;

/// Lowest motor power (%).
pub const POWER_MIN: u8 = 0;

/// Highest motor power (%).
pub const POWER_MAX: u8 = 100;

/// Power setting for a single motor pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotorPower {
    /// Output pin on the drone.
    #[serde(rename = "Pin")]
    pub pin: u8,
    /// Power in percent (0-100).
    #[serde(rename = "Power")]
    pub power: u8,
}

/// Power for all four motors.
///
/// The pin of each slot is fixed at construction and never reassigned; only
/// the power values change.
///
/// # Examples
///
/// ```
/// use drone_joystick::controller::motor::MotorPowerVector;
///
/// let vector = MotorPowerVector::new();
/// assert_eq!(vector.powers(), [0, 0, 0, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MotorPowerVector {
    motors: [MotorPower; MOTOR_COUNT],
}

impl Default for MotorPowerVector {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorPowerVector {
    /// Creates a vector with every motor at 0%.
    #[must_use]
    pub fn new() -> Self {
        let mut motors = [MotorPower { pin: 0, power: POWER_MIN }; MOTOR_COUNT];
        for (pin, motor) in motors.iter_mut().enumerate() {
            motor.pin = pin as u8;
        }
        Self { motors }
    }

    /// Creates a vector with the given powers, clamped to 0-100.
    #[must_use]
    pub fn with_powers(powers: [u8; MOTOR_COUNT]) -> Self {
        let mut vector = Self::new();
        for (motor, power) in vector.motors.iter_mut().zip(powers) {
            motor.power = power.min(POWER_MAX);
        }
        vector
    }

    /// Returns the motor entries in pin order.
    #[must_use]
    pub fn motors(&self) -> &[MotorPower; MOTOR_COUNT] {
        &self.motors
    }

    /// Returns just the power values in pin order.
    #[must_use]
    pub fn powers(&self) -> [u8; MOTOR_COUNT] {
        self.motors.map(|motor| motor.power)
    }

    /// Returns true when every motor is at 0%.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.motors.iter().all(|motor| motor.power == POWER_MIN)
    }

    /// Applies `step` to every motor independently.
    ///
    /// A motor whose power would leave 0-100 keeps its current value for this
    /// step. It is skipped, not clamped to the rail, so motors that started
    /// at different powers stay apart at the boundaries.
    pub fn apply_step(&mut self, step: i8) {
        for motor in &mut self.motors {
            let next = i16::from(motor.power) + i16::from(step);
            if (i16::from(POWER_MIN)..=i16::from(POWER_MAX)).contains(&next) {
                motor.power = next as u8;
            }
        }
    }

    /// Forces every motor to 0%.
    pub fn stop(&mut self) {
        for motor in &mut self.motors {
            motor.power = POWER_MIN;
        }
    }
}

impl fmt::Display for MotorPowerVector {
    /// Writes the vector as its JSON wire form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vector_is_zeroed_with_fixed_pins() {
        let vector = MotorPowerVector::new();

        assert_eq!(vector.powers(), [0, 0, 0, 0]);
        for (i, motor) in vector.motors().iter().enumerate() {
            assert_eq!(motor.pin as usize, i, "Slot {} should drive pin {}", i, i);
        }
        assert!(vector.is_stopped());
    }

    #[test]
    fn test_with_powers_clamps_to_100() {
        let vector = MotorPowerVector::with_powers([10, 100, 101, 255]);
        assert_eq!(vector.powers(), [10, 100, 100, 100]);
    }

    #[test]
    fn test_apply_step_up_and_down() {
        let mut vector = MotorPowerVector::with_powers([50, 50, 50, 50]);

        vector.apply_step(1);
        assert_eq!(vector.powers(), [51, 51, 51, 51]);

        vector.apply_step(-1);
        vector.apply_step(-1);
        assert_eq!(vector.powers(), [49, 49, 49, 49]);
    }

    #[test]
    fn test_apply_step_skips_motor_at_lower_rail() {
        let mut vector = MotorPowerVector::with_powers([0, 1, 2, 0]);

        vector.apply_step(-1);
        assert_eq!(vector.powers(), [0, 0, 1, 0]);

        vector.apply_step(-1);
        assert_eq!(vector.powers(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_apply_step_skips_motor_at_upper_rail() {
        let mut vector = MotorPowerVector::with_powers([100, 99, 98, 100]);

        vector.apply_step(1);
        assert_eq!(vector.powers(), [100, 100, 99, 100]);
    }

    #[test]
    fn test_zero_step_is_noop() {
        let mut vector = MotorPowerVector::with_powers([3, 0, 100, 42]);
        vector.apply_step(0);
        assert_eq!(vector.powers(), [3, 0, 100, 42]);
    }

    #[test]
    fn test_stop_keeps_pins() {
        let mut vector = MotorPowerVector::with_powers([70, 60, 50, 40]);
        vector.stop();

        assert!(vector.is_stopped());
        assert_eq!(vector.motors()[3].pin, 3);
    }

    #[test]
    fn test_serializes_as_pin_power_list() {
        let vector = MotorPowerVector::with_powers([1, 2, 3, 4]);
        let json = serde_json::to_string(&vector).unwrap();

        assert_eq!(
            json,
            r#"[{"Pin":0,"Power":1},{"Pin":1,"Power":2},{"Pin":2,"Power":3},{"Pin":3,"Power":4}]"#
        );
    }

    #[test]
    fn test_display_shows_pins_and_powers() {
        let vector = MotorPowerVector::with_powers([5, 0, 100, 42]);

        assert_eq!(
            vector.to_string(),
            r#"[{"Pin":0,"Power":5},{"Pin":1,"Power":0},{"Pin":2,"Power":100},{"Pin":3,"Power":42}]"#
        );
    }
}
