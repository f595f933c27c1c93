//! # Ranging Equipment Interface
//!
//! The rangefinder is a fixed-boresight serial device (TF-Luna style) that
//! streams 9-byte measurement frames continuously. This module defines the
//! [`RangingSensor`] trait used by the control loop, plus the concrete
//! [`TfLuna`] serial driver.
//!
//! Frame layout, little endian fields:
//!
//! ```text
//! 0x59 0x59 dist_lo dist_hi strength_lo strength_hi temp_lo temp_hi checksum
//! ```
//!
//! where distance is in centimetres, temperature is in units of 1/8 degree
//! offset by -256, and the checksum is the low byte of the sum of the first
//! eight bytes.
//!
//! All polls take a bounded timeout: if no valid frame is observed within it
//! the poll returns [`RangingError::Timeout`] rather than blocking the
//! caller's control loop indefinitely.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use log::warn;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::{Duration, Instant};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Frame sync byte, repeated twice at the start of every frame.
const FRAME_HEADER: u8 = 0x59;

/// Total length of a measurement frame in bytes.
const FRAME_LEN: usize = 9;

/// Baud rate of the sensor's serial link.
const BAUD_RATE: u32 = 115_200;

/// Serial read timeout for a single byte.
///
/// Short so that the poll deadline is honoured to within a few milliseconds.
const BYTE_READ_TIMEOUT: Duration = Duration::from_millis(10);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single range measurement.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct RangeSample {
    /// Measured distance in metres.
    pub range_m: f64,

    /// Signal strength value reported by the sensor.
    pub strength: u16,
}

/// Serial driver for a TF-Luna style rangefinder.
pub struct TfLuna {
    port: Option<Box<dyn serialport::SerialPort>>,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Errors that can occur on the ranging link.
#[derive(Debug, thiserror::Error)]
pub enum RangingError {
    #[error("Could not open the serial port: {0}")]
    PortOpenError(serialport::Error),

    #[error("IO error on the ranging link: {0}")]
    IoError(std::io::Error),

    #[error("No valid measurement frame observed within the timeout")]
    Timeout,

    #[error("The ranging link is not open")]
    NotOpen,
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// A source of range measurements.
pub trait RangingSensor {
    /// Poll for the next valid measurement frame.
    ///
    /// Returns [`RangingError::Timeout`] if no valid frame is observed within
    /// `timeout`. Callers treat a timeout as "no trustworthy range this
    /// tick", not as a fatal condition.
    fn poll(&mut self, timeout: Duration) -> Result<RangeSample, RangingError>;

    /// Read the sensor's internal temperature in degrees celsius.
    fn read_temperature(&mut self, timeout: Duration) -> Result<f64, RangingError>;

    /// True if the link to the sensor is open.
    fn is_open(&self) -> bool;

    /// Close the link to the sensor.
    fn disconnect(&mut self);
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl<T: RangingSensor + ?Sized> RangingSensor for Box<T> {
    fn poll(&mut self, timeout: Duration) -> Result<RangeSample, RangingError> {
        (**self).poll(timeout)
    }

    fn read_temperature(&mut self, timeout: Duration) -> Result<f64, RangingError> {
        (**self).read_temperature(timeout)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }
}

impl TfLuna {
    /// Open the serial link to the sensor on the given port.
    pub fn open(port_name: &str) -> Result<Self, RangingError> {
        let port = serialport::new(port_name, BAUD_RATE)
            .timeout(BYTE_READ_TIMEOUT)
            .open()
            .map_err(RangingError::PortOpenError)?;

        Ok(Self { port: Some(port) })
    }

    /// Read frames until one passes validation or the deadline expires.
    fn read_valid_frame(&mut self, timeout: Duration) -> Result<[u8; FRAME_LEN], RangingError> {
        let port = self.port.as_mut().ok_or(RangingError::NotOpen)?;

        let deadline = Instant::now() + timeout;
        let mut frame = [0u8; FRAME_LEN];

        while Instant::now() < deadline {
            // Sync to the double header byte
            let mut byte = [0u8; 1];
            match port.read_exact(&mut byte) {
                Ok(_) => (),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(RangingError::IoError(e)),
            }
            if byte[0] != FRAME_HEADER {
                continue;
            }

            match port.read_exact(&mut byte) {
                Ok(_) => (),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(RangingError::IoError(e)),
            }
            if byte[0] != FRAME_HEADER {
                continue;
            }

            // Read the frame body
            frame[0] = FRAME_HEADER;
            frame[1] = FRAME_HEADER;
            match port.read_exact(&mut frame[2..]) {
                Ok(_) => (),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(RangingError::IoError(e)),
            }

            if checksum_valid(&frame) {
                return Ok(frame);
            }

            warn!("Rangefinder frame rejected by checksum, resyncing");
        }

        Err(RangingError::Timeout)
    }
}

impl RangingSensor for TfLuna {
    fn poll(&mut self, timeout: Duration) -> Result<RangeSample, RangingError> {
        let frame = self.read_valid_frame(timeout)?;
        Ok(parse_range(&frame))
    }

    fn read_temperature(&mut self, timeout: Duration) -> Result<f64, RangingError> {
        let frame = self.read_valid_frame(timeout)?;
        Ok(parse_temperature(&frame))
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn disconnect(&mut self) {
        // Dropping the port closes it
        self.port = None;
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Validate the frame checksum, the low byte of the sum of the first eight
/// bytes.
fn checksum_valid(frame: &[u8; FRAME_LEN]) -> bool {
    let sum: u32 = frame[..FRAME_LEN - 1].iter().map(|&b| b as u32).sum();
    (sum & 0xFF) as u8 == frame[FRAME_LEN - 1]
}

/// Extract the range measurement from a validated frame.
fn parse_range(frame: &[u8; FRAME_LEN]) -> RangeSample {
    let dist_cm = LittleEndian::read_u16(&frame[2..4]);
    let strength = LittleEndian::read_u16(&frame[4..6]);

    RangeSample {
        range_m: dist_cm as f64 / 100.0,
        strength,
    }
}

/// Extract the temperature measurement from a validated frame.
fn parse_temperature(frame: &[u8; FRAME_LEN]) -> f64 {
    let raw = LittleEndian::read_u16(&frame[6..8]);
    (raw as f64 / 8.0) - 256.0
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Build a frame with a valid checksum from the given field values.
    fn frame(dist_cm: u16, strength: u16, temp_raw: u16) -> [u8; FRAME_LEN] {
        let mut f = [0u8; FRAME_LEN];
        f[0] = FRAME_HEADER;
        f[1] = FRAME_HEADER;
        LittleEndian::write_u16(&mut f[2..4], dist_cm);
        LittleEndian::write_u16(&mut f[4..6], strength);
        LittleEndian::write_u16(&mut f[6..8], temp_raw);

        let sum: u32 = f[..FRAME_LEN - 1].iter().map(|&b| b as u32).sum();
        f[FRAME_LEN - 1] = (sum & 0xFF) as u8;

        f
    }

    #[test]
    fn test_range_parse() {
        // 1.5 m at strength 400
        let f = frame(150, 400, 0);

        assert!(checksum_valid(&f));

        let sample = parse_range(&f);
        assert!((sample.range_m - 1.5).abs() < 1e-9);
        assert_eq!(sample.strength, 400);
    }

    #[test]
    fn test_temperature_parse() {
        // 25 degC -> raw = (25 + 256) * 8
        let f = frame(0, 0, (25 + 256) * 8);

        assert!((parse_temperature(&f) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_corrupt_checksum_rejected() {
        let mut f = frame(150, 400, 0);
        f[FRAME_LEN - 1] = f[FRAME_LEN - 1].wrapping_add(1);

        assert!(!checksum_valid(&f));
    }
}
