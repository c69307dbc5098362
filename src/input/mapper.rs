//! # Joystick Event Mapper Module
//!
//! Converts raw evdev events into numbered [`JoystickEvent`]s.
//!
//! ## Numbering
//!
//! evdev identifies inputs by code (`ABS_X`, `BTN_TRIGGER`, ...). The
//! controller works with the small dense indices of the Linux joystick API
//! instead, so the mapper numbers inputs the same way joydev does:
//!
//! | Input | Number |
//! |-------|--------|
//! | Axis | Position among the device's absolute axes, ascending code |
//! | Button | Position among the device's keys, `BTN_MISC` and up first, then lower codes |
//!
//! ## Axis Values
//!
//! Raw axis readings are rescaled to `-32767..=32767` around the centre of
//! the range the device reports. Readings inside the device's flat zone
//! become exactly 0, so a centred stick reads as neutral.
//!
//! ## Usage
//!
//! ```
//! use drone_joystick::input::mapper::{AxisRange, EventMapper};
//! use drone_joystick::input::event::JoystickEvent;
//! use evdev::{AbsoluteAxisType, EventType, InputEvent, Key};
//!
//! let mapper = EventMapper::new(
//!     vec![(AbsoluteAxisType::ABS_X, AxisRange::new(0, 255, 0))],
//!     vec![Key::BTN_TRIGGER],
//! );
//!
//! let event = InputEvent::new(EventType::KEY, Key::BTN_TRIGGER.code(), 1);
//! assert_eq!(
//!     mapper.map_event(&event),
//!     Some(JoystickEvent::Button { number: 0, value: 1 })
//! );
//! ```

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key};

use super::event::JoystickEvent;

/// Largest magnitude of a normalised axis value.
pub const AXIS_VALUE_MAX: i32 = 32767;

/// First joystick-range key code. joydev numbers these buttons first.
pub const BTN_MISC: u16 = 0x100;

/// Key event value for auto-repeat.
const KEY_REPEAT: i32 = 2;

/// Range an axis reports, as read from the device's absinfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub minimum: i32,
    pub maximum: i32,
    /// Readings within this distance of centre count as centred.
    pub flat: i32,
}

impl AxisRange {
    #[must_use]
    pub fn new(minimum: i32, maximum: i32, flat: i32) -> Self {
        Self { minimum, maximum, flat }
    }

    /// Rescales a raw reading to `-32767..=32767`, 0 at centre.
    ///
    /// # Examples
    ///
    /// ```
    /// use drone_joystick::input::mapper::AxisRange;
    ///
    /// let range = AxisRange::new(-32768, 32767, 0);
    /// assert_eq!(range.normalize(32767), 32767);
    ///
    /// let hat = AxisRange::new(-1, 1, 0);
    /// assert_eq!(hat.normalize(-1), -32767);
    /// assert_eq!(hat.normalize(0), 0);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: i32) -> i32 {
        let minimum = i64::from(self.minimum);
        let maximum = i64::from(self.maximum);
        let half = (maximum - minimum) / 2;
        if half <= 0 {
            return 0;
        }

        // Round the centre up so 0..=255 centres on 128 like the hardware does
        let center = minimum + (maximum - minimum + 1) / 2;
        let offset = i64::from(raw) - center;
        if offset.abs() <= i64::from(self.flat.max(0)) {
            return 0;
        }

        let max = i64::from(AXIS_VALUE_MAX);
        (offset * max / half).clamp(-max, max) as i32
    }
}

/// Maps evdev events from one device to [`JoystickEvent`]s.
#[derive(Debug, Clone)]
pub struct EventMapper {
    axes: Vec<(AbsoluteAxisType, AxisRange)>,
    buttons: Vec<Key>,
}

impl EventMapper {
    /// Creates a mapper from a device's absolute axes and keys.
    ///
    /// Inputs are sorted into joydev order, so callers can pass them in any
    /// order.
    #[must_use]
    pub fn new(mut axes: Vec<(AbsoluteAxisType, AxisRange)>, mut buttons: Vec<Key>) -> Self {
        axes.sort_by_key(|(axis, _)| axis.0);
        buttons.sort_by_key(|key| (key.code() < BTN_MISC, key.code()));
        Self { axes, buttons }
    }

    /// Number of axes the device exposes.
    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Number of buttons the device exposes.
    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// Maps a single evdev event.
    ///
    /// Returns `None` for sync events, key repeats, and inputs the device did
    /// not advertise.
    #[must_use]
    pub fn map_event(&self, event: &InputEvent) -> Option<JoystickEvent> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.map_axis(axis, event.value()),
            InputEventKind::Key(key) => self.map_key(key, event.value()),
            _ => None,
        }
    }

    fn map_axis(&self, axis: AbsoluteAxisType, raw: i32) -> Option<JoystickEvent> {
        let index = self.axes.iter().position(|(a, _)| *a == axis)?;
        let number = u8::try_from(index).ok()?;
        let value = self.axes[index].1.normalize(raw);
        Some(JoystickEvent::Axis { number, value })
    }

    fn map_key(&self, key: Key, raw: i32) -> Option<JoystickEvent> {
        if raw == KEY_REPEAT {
            return None;
        }
        let index = self.buttons.iter().position(|k| *k == key)?;
        let number = u8::try_from(index).ok()?;
        let value = i32::from(raw != 0);
        Some(JoystickEvent::Button { number, value })
    }
}
