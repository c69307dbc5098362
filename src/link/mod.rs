//! # Drone Link Module
//!
//! Delivers motor power vectors to the drone server over TCP.
//!
//! This module handles:
//! - The [`CommandSink`] port the throttle controller sends through
//! - Connecting to the drone server in the background
//! - Encoding and writing power frames from a dedicated writer task
//! - Reporting link faults to the event loop
//!
//! There is no retry: once the connection fails or drops, sends fail with
//! [`DroneError::NotConnected`] until the process is restarted.

pub mod codec;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::controller::motor::MotorPowerVector;
use crate::error::{DroneError, Result};
use codec::{encode_power_frame, Framing};

/// How long [`DroneLink::close`] waits for queued frames to drain.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Output port for motor power vectors.
///
/// `send` must not block. When the vector cannot be delivered it returns an
/// error straight away and the vector is dropped.
#[cfg_attr(test, mockall::automock)]
pub trait CommandSink {
    fn send(&mut self, vector: &MotorPowerVector) -> Result<()>;
}

/// Link state changes reported to the event loop.
#[derive(Debug)]
pub enum LinkEvent {
    /// Connection established.
    Connected,
    /// Connecting or writing failed. The link is now disconnected.
    Fault(io::Error),
}

/// TCP connection to the drone server
///
/// Frames are handed to a writer task through an unbounded channel, so
/// [`CommandSink::send`] never waits on the socket.
pub struct DroneLink {
    framing: Framing,
    connected: Arc<AtomicBool>,
    frames: Option<mpsc::UnboundedSender<Bytes>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for DroneLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DroneLink")
            .field("framing", &self.framing)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl DroneLink {
    /// Start connecting to the drone server
    ///
    /// Returns immediately. The connection completes in the background and
    /// is reported as [`LinkEvent::Connected`] or [`LinkEvent::Fault`] on the
    /// returned receiver.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use drone_joystick::link::{DroneLink, LinkEvent};
    /// use drone_joystick::link::codec::Framing;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let (link, mut events) = DroneLink::connect("192.168.1.20", 8080, Framing::Newline);
    ///     if let Some(LinkEvent::Connected) = events.recv().await {
    ///         assert!(link.is_connected());
    ///     }
    /// }
    /// ```
    pub fn connect(
        host: &str,
        port: u16,
        framing: Framing,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        let host = host.to_string();
        let task = {
            let connected = Arc::clone(&connected);
            tokio::spawn(async move {
                debug!("Connecting to drone at {}:{}", host, port);
                match TcpStream::connect((host.as_str(), port)).await {
                    Ok(stream) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!("Failed to disable Nagle on drone link: {}", e);
                        }
                        info!("Connected to drone: host {}, port {}", host, port);
                        connected.store(true, Ordering::SeqCst);
                        let _ = events_tx.send(LinkEvent::Connected);
                        run_writer(stream, frames_rx, &connected, &events_tx).await;
                    }
                    Err(e) => {
                        let _ = events_tx.send(LinkEvent::Fault(e));
                    }
                }
            })
        };

        let link = Self {
            framing,
            connected,
            frames: Some(frames_tx),
            task: Some(task),
        };
        (link, events_rx)
    }

    /// Wrap an already connected stream
    #[cfg(test)]
    fn with_stream<W: AsyncWrite + Unpin + Send + 'static>(
        stream: W,
        framing: Framing,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        let task = {
            let connected = Arc::clone(&connected);
            tokio::spawn(async move {
                run_writer(stream, frames_rx, &connected, &events_tx).await;
            })
        };

        let link = Self {
            framing,
            connected,
            frames: Some(frames_tx),
            task: Some(task),
        };
        (link, events_rx)
    }

    /// True once the connection is up and no write has failed
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Stop accepting frames and wait for queued frames to be written
    pub async fn close(&mut self) {
        self.frames = None;

        if let Some(mut task) = self.task.take() {
            if !self.is_connected() {
                task.abort();
                return;
            }
            match tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await {
                Ok(_) => debug!("Drone link closed"),
                Err(_) => {
                    warn!("Timed out flushing drone link");
                    task.abort();
                }
            }
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl CommandSink for DroneLink {
    fn send(&mut self, vector: &MotorPowerVector) -> Result<()> {
        if !self.is_connected() {
            return Err(DroneError::NotConnected);
        }

        let frame = encode_power_frame(vector, self.framing)?;

        let frames = self.frames.as_ref().ok_or(DroneError::NotConnected)?;
        if frames.send(frame).is_err() {
            // Writer task has stopped
            self.connected.store(false, Ordering::SeqCst);
            return Err(DroneError::NotConnected);
        }
        Ok(())
    }
}

impl Drop for DroneLink {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Write queued frames until the channel closes or a write fails.
async fn run_writer<W: AsyncWrite + Unpin>(
    mut stream: W,
    mut frames: mpsc::UnboundedReceiver<Bytes>,
    connected: &AtomicBool,
    events: &mpsc::UnboundedSender<LinkEvent>,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(e) = write_frame(&mut stream, &frame).await {
            error!("Failed to write to drone link: {}", e);
            connected.store(false, Ordering::SeqCst);
            let _ = events.send(LinkEvent::Fault(e));
            return;
        }
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(stream: &mut W, frame: &[u8]) -> io::Result<()> {
    stream.write_all(frame).await?;
    stream.flush().await?;
    debug!("Sent power frame ({} bytes)", frame.len());
    Ok(())
}

#[cfg(test)]
pub mod mocks {
    use super::*;

    /// Sink that records every vector it accepts.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        connected: bool,
        attempts: usize,
        sent: Vec<MotorPowerVector>,
    }

    impl RecordingSink {
        pub fn connected() -> Self {
            Self {
                connected: true,
                ..Self::default()
            }
        }

        pub fn disconnected() -> Self {
            Self::default()
        }

        /// Vectors accepted while connected.
        pub fn sent(&self) -> &[MotorPowerVector] {
            &self.sent
        }

        pub fn last(&self) -> Option<&MotorPowerVector> {
            self.sent.last()
        }

        /// Every send call, including failed ones.
        pub fn attempts(&self) -> usize {
            self.attempts
        }
    }

    impl CommandSink for RecordingSink {
        fn send(&mut self, vector: &MotorPowerVector) -> Result<()> {
            self.attempts += 1;
            if !self.connected {
                return Err(DroneError::NotConnected);
            }
            self.sent.push(vector.clone());
            Ok(())
        }
    }
}
