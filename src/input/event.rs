//! Joystick events as the throttle controller sees them.

/// A single joystick change, numbered the way the Linux joystick API numbers
/// axes and buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickEvent {
    /// Axis moved. `value` is signed, 0 is centre.
    Axis { number: u8, value: i32 },
    /// Button changed. `value` is 1 for press, 0 for release.
    Button { number: u8, value: i32 },
}
