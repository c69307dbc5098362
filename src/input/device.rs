//! # Joystick Device Module
//!
//! Finds and reads a joystick through the Linux evdev interface.
//!
//! ## Device Selection
//!
//! A device counts as a joystick when it reports absolute axes and at least
//! one joystick or gamepad button (`BTN_TRIGGER` or `BTN_SOUTH`). Matching
//! `/dev/input/event*` nodes are sorted by path and the configured device id
//! picks one of them, so id 0 is the first joystick plugged in.

use evdev::{Device, EventStream, Key};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::event::JoystickEvent;
use super::mapper::{AxisRange, EventMapper};
use crate::error::{DroneError, Result};

/// Directory scanned for input devices.
const INPUT_DIR: &str = "/dev/input";

/// Open joystick with an async event stream.
pub struct Joystick {
    stream: EventStream,
    mapper: EventMapper,
    device_path: String,
}

impl std::fmt::Debug for Joystick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Joystick")
            .field("device_path", &self.device_path)
            .field("mapper", &self.mapper)
            .finish_non_exhaustive()
    }
}

impl Joystick {
    /// Open the joystick with the given device id
    ///
    /// # Errors
    ///
    /// - `JoystickNotFound`: fewer than `device_id + 1` joysticks present
    /// - `Joystick`: `/dev/input` unreadable or the device could not be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use drone_joystick::input::device::Joystick;
    ///
    /// # async fn run() -> drone_joystick::error::Result<()> {
    /// let mut joystick = Joystick::open(0)?;
    /// let event = joystick.next_event().await?;
    /// println!("{:?}", event);
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(device_id: u32) -> Result<Self> {
        let paths = joystick_paths(Path::new(INPUT_DIR))?;
        let path = paths
            .get(device_id as usize)
            .ok_or(DroneError::JoystickNotFound(device_id))?;

        Self::open_path(path)
    }

    /// Open a specific evdev node as a joystick
    pub fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| {
            DroneError::Joystick(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let mapper = mapper_for(&device)?;
        let device_path = path.to_string_lossy().to_string();

        info!(
            "Opened joystick {} at {} ({} axes, {} buttons)",
            device.name().unwrap_or("<unnamed>"),
            device_path,
            mapper.axis_count(),
            mapper.button_count()
        );

        let stream = device.into_event_stream().map_err(|e| {
            DroneError::Joystick(format!("Failed to stream events from {}: {}", device_path, e))
        })?;

        Ok(Self {
            stream,
            mapper,
            device_path,
        })
    }

    /// Wait for the next axis or button event
    ///
    /// # Errors
    ///
    /// Returns `Joystick` error when reading fails (e.g. device unplugged).
    pub async fn next_event(&mut self) -> Result<JoystickEvent> {
        loop {
            let event = self
                .stream
                .next_event()
                .await
                .map_err(|e| DroneError::Joystick(format!("Failed to read event: {}", e)))?;

            if let Some(mapped) = self.mapper.map_event(&event) {
                return Ok(mapped);
            }
        }
    }

    /// Get the device path of this joystick
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

/// True when the device looks like a joystick or gamepad.
fn is_joystick(device: &Device) -> bool {
    let has_axes = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.iter().next().is_some());
    let has_buttons = device.supported_keys().map_or(false, |keys| {
        keys.contains(Key::BTN_TRIGGER) || keys.contains(Key::BTN_SOUTH)
    });
    has_axes && has_buttons
}

/// Build the joydev-style mapper from the device's capabilities.
fn mapper_for(device: &Device) -> Result<EventMapper> {
    let absinfo = device
        .get_abs_state()
        .map_err(|e| DroneError::Joystick(format!("Failed to read axis ranges: {}", e)))?;

    let axes = device
        .supported_absolute_axes()
        .map(|set| {
            set.iter()
                .filter_map(|axis| {
                    let info = absinfo.get(axis.0 as usize)?;
                    Some((axis, AxisRange::new(info.minimum, info.maximum, info.flat)))
                })
                .collect()
        })
        .unwrap_or_default();

    let buttons = device
        .supported_keys()
        .map(|set| set.iter().collect())
        .unwrap_or_default();

    Ok(EventMapper::new(axes, buttons))
}

/// List joystick device nodes under `dir`, sorted by path.
fn joystick_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| DroneError::Joystick(format!("Failed to read {}: {}", dir.display(), e)))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"))
        })
        .collect();

    // Sort for deterministic device ids
    paths.sort();

    Ok(paths
        .into_iter()
        .filter(|path| match Device::open(path) {
            Ok(device) => {
                let joystick = is_joystick(&device);
                debug!(
                    "Input device {}: {} (joystick: {})",
                    path.display(),
                    device.name().unwrap_or("<unnamed>"),
                    joystick
                );
                joystick
            }
            Err(e) => {
                // Permission denied or other errors - skip device
                debug!("Could not open {}: {}", path.display(), e);
                false
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joystick_paths_missing_dir_is_error() {
        let result = joystick_paths(Path::new("/nonexistent/input"));
        assert!(matches!(result, Err(DroneError::Joystick(_))));
    }

    #[test]
    fn test_joystick_paths_ignores_non_event_nodes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("js0"), b"").unwrap();
        std::fs::write(dir.path().join("mouse0"), b"").unwrap();
        // Not a real evdev node, so it cannot be opened as a device
        std::fs::write(dir.path().join("event0"), b"").unwrap();

        let paths = joystick_paths(dir.path()).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_open_path_nonexistent_is_error() {
        let result = Joystick::open_path(Path::new("/dev/input/nonexistent_event_device"));
        match result {
            Err(DroneError::Joystick(msg)) => {
                assert!(msg.contains("nonexistent_event_device"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Joystick error, got: {:?}", other),
        }
    }

    // Integration test - only runs with real hardware
    #[tokio::test]
    #[ignore]
    async fn test_open_with_real_hardware() {
        let joystick = Joystick::open(0).expect("No joystick found");
        assert!(joystick.device_path().starts_with("/dev/input/event"));
    }
}
