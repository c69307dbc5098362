//! # Power Command Encoder
//!
//! Encodes a motor power vector into a frame for the drone server.
//!
//! The payload is always the same JSON object:
//!
//! ```text
//! {"Power":[{"Pin":0,"Power":12},{"Pin":1,"Power":12},{"Pin":2,"Power":12},{"Pin":3,"Power":12}]}
//! ```
//!
//! Two framings are supported:
//!
//! | Framing | Layout |
//! |---------|--------|
//! | `newline` | payload, `\n` |
//! | `length_prefixed` | `0xCE`, payload length (u32, big-endian), payload |

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::controller::motor::MotorPowerVector;
use crate::error::Result;

/// Signature byte that opens a length-prefixed frame.
pub const FRAME_SIGNATURE: u8 = 0xCE;

/// Signature byte plus the 4-byte length.
pub const FRAME_HEADER_LEN: usize = 5;

/// How frames are delimited on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// JSON lines.
    #[default]
    Newline,
    /// Signature byte and length header before each payload.
    LengthPrefixed,
}

#[derive(Serialize)]
struct PowerCommand<'a> {
    #[serde(rename = "Power")]
    power: &'a MotorPowerVector,
}

/// Encode the JSON payload for a power vector
///
/// # Examples
///
/// ```
/// use drone_joystick::controller::motor::MotorPowerVector;
/// use drone_joystick::link::codec::encode_power_payload;
///
/// let payload = encode_power_payload(&MotorPowerVector::new())?;
/// assert!(payload.starts_with(br#"{"Power":[{"Pin":0,"Power":0}"#));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn encode_power_payload(vector: &MotorPowerVector) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&PowerCommand { power: vector })?)
}

/// Encode a complete frame for a power vector
pub fn encode_power_frame(vector: &MotorPowerVector, framing: Framing) -> Result<Bytes> {
    let payload = encode_power_payload(vector)?;

    let frame = match framing {
        Framing::Newline => {
            let mut frame = BytesMut::with_capacity(payload.len() + 1);
            frame.put_slice(&payload);
            frame.put_u8(b'\n');
            frame
        }
        Framing::LengthPrefixed => {
            let mut frame = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
            frame.put_u8(FRAME_SIGNATURE);
            frame.put_u32(payload.len() as u32);
            frame.put_slice(&payload);
            frame
        }
    };

    Ok(frame.freeze())
}
