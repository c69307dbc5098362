//! # Drone Joystick
//!
//! Fly a quadcopter's throttle from a joystick.
//!
//! This daemon reads the joystick throttle axis and panic button and streams
//! motor power commands to the drone server.

use anyhow::{anyhow, Context, Result};
use std::io;
use tracing::{debug, error, info};

use drone_joystick::config::{Config, DEFAULT_CONFIG_PATH};
use drone_joystick::controller::{ThrottleController, ThrottleSettings, TokioScheduler};
use drone_joystick::input::device::Joystick;
use drone_joystick::input::JoystickEvent;
use drone_joystick::link::{DroneLink, LinkEvent};
use drone_joystick::logging;

/// Main entry point for the drone joystick daemon
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (path from the first argument, or `configuration.toml`)
///    - Set up logging to the configured file
///    - Start connecting to the drone server
///    - Open the joystick
///
/// 2. **Main Loop**
///    - Feed joystick events to the throttle controller
///    - Tick the controller on its ramp timer
///    - Watch the drone link for faults
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop all motors
///    - Flush the drone link
///
/// # Errors
///
/// Returns error if:
/// - Configuration cannot be read or is invalid
/// - The log file cannot be opened
/// - No joystick is found
/// - The drone server refuses the connection
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Can not read configuration file {}", config_path))?;

    let _log_guard = logging::init(&config.logging)
        .with_context(|| format!("Can not open log file {}", config.logging.file))?;

    info!("Drone Joystick v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Daemon configuration loaded.");
    debug!("{:?}", config);

    let (link, mut link_events) = DroneLink::connect(
        &config.server.host,
        config.server.port,
        config.server.framing,
    );

    let mut joystick = Some(
        Joystick::open(config.joystick.device_id)
            .with_context(|| format!("Can not open joystick {}", config.joystick.device_id))?,
    );

    let (scheduler, mut timer_fires) = TokioScheduler::new();
    let mut controller = ThrottleController::new(ThrottleSettings::from(&config), scheduler, link);

    info!("Press Ctrl+C to exit");

    // Main control loop
    loop {
        tokio::select! {
            event = next_joystick_event(&mut joystick) => {
                match event {
                    Ok(event) => controller.handle_event(event),
                    Err(e) => {
                        error!("Lost joystick {}: {}", joystick_label(&joystick), e);
                        joystick = None;
                        controller.panic();
                    }
                }
            }

            Some(id) = timer_fires.recv() => {
                controller.on_timer(id);
            }

            Some(event) = link_events.recv() => {
                match event {
                    LinkEvent::Connected => debug!("Drone link up"),
                    LinkEvent::Fault(e) if is_fatal_link_fault(&e) => {
                        error!("Can not connect to server.");
                        return Err(anyhow!(
                            "Drone server {}:{} refused the connection: {}",
                            config.server.host,
                            config.server.port,
                            e
                        ));
                    }
                    LinkEvent::Fault(e) => {
                        error!("Drone link fault: {}", e);
                    }
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    controller.panic();
    controller.sink_mut().close().await;

    Ok(())
}

/// Next event from the joystick, or never if it has been lost.
async fn next_joystick_event(
    joystick: &mut Option<Joystick>,
) -> drone_joystick::error::Result<JoystickEvent> {
    match joystick {
        Some(joystick) => joystick.next_event().await,
        None => std::future::pending().await,
    }
}

/// Device path of the joystick for log lines.
fn joystick_label(joystick: &Option<Joystick>) -> &str {
    joystick.as_ref().map_or("<unknown>", Joystick::device_path)
}

/// A refused connection cannot recover without a retry policy, so it ends
/// the process. Other link faults are only logged.
fn is_fatal_link_fault(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::ConnectionRefused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_refused_is_fatal() {
        let e = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(is_fatal_link_fault(&e));
    }

    #[test]
    fn test_other_link_faults_are_not_fatal() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::TimedOut,
        ] {
            assert!(!is_fatal_link_fault(&io::Error::from(kind)), "{:?} should not be fatal", kind);
        }
    }

    #[tokio::test]
    async fn test_lost_joystick_never_yields() {
        let mut joystick = None;
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            next_joystick_event(&mut joystick),
        )
        .await;
        assert!(result.is_err(), "Missing joystick should stay pending");
    }

    #[test]
    fn test_missing_joystick_label() {
        assert_eq!(joystick_label(&None), "<unknown>");
    }
}
