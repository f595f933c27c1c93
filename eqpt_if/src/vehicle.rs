//! # Vehicle Equipment Interface
//!
//! The flight controller is an external collaborator, the transport and
//! message encoding used to talk to it are outside this crate. What is
//! defined here is the command and telemetry boundary: the [`VehicleLink`]
//! trait, the [`MotionCmd`] issued once per control tick, and the
//! [`VehicleTm`] telemetry snapshot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One motion command, issued to the vehicle in a single logical step.
///
/// Yaw rate and forward velocity are independent fields of the same command,
/// not two separate round trips.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MotionCmd {
    /// Demanded yaw rate in degrees/second, sign per the flight controller's
    /// body-frame convention.
    pub yaw_rate_degs: f64,

    /// Demanded forward velocity in metres/second, in the vehicle body frame.
    pub fwd_vel_ms: f64,
}

/// A global-frame position fix.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct GlobalPos {
    pub lat_deg: f64,
    pub lon_deg: f64,

    /// Altitude above the home position in metres.
    pub alt_m: f64,
}

/// Vehicle attitude in radians.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Attitude {
    pub roll_rad: f64,
    pub pitch_rad: f64,
    pub yaw_rad: f64,
}

/// Battery state reported by the vehicle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Battery {
    pub voltage_v: f64,

    /// Remaining charge in percent, `None` if the estimator is unavailable.
    pub level_pct: Option<f64>,
}

/// A telemetry snapshot from the vehicle.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VehicleTm {
    pub position: GlobalPos,
    pub attitude: Attitude,

    /// Velocity in metres/second, NED frame.
    pub velocity_ms: Vector3<f64>,

    pub battery: Battery,

    /// Current flight mode name.
    pub mode: String,

    /// Home position, `None` before the first fix.
    pub home: Option<GlobalPos>,

    /// True if the navigation state estimator is considered reliable.
    pub ekf_ok: bool,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Errors that can occur on the vehicle link.
///
/// Vehicle link errors are fatal to the mission, there is no retry policy.
/// The system halts rather than continue uncommanded flight.
#[derive(Debug, thiserror::Error)]
pub enum VehicleError {
    #[error("Could not connect to the vehicle: {0}")]
    ConnectionError(String),

    #[error("Vehicle did not arm within the timeout")]
    ArmTimeout,

    #[error("Vehicle did not reach the target altitude within the timeout")]
    ClimbTimeout,

    #[error("The vehicle link is closed")]
    LinkClosed,
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// The command and telemetry link to the flight controller.
pub trait VehicleLink {
    /// Arm the vehicle and climb to the target altitude.
    ///
    /// Blocks the caller until the vehicle is armed and within 95% of the
    /// target altitude, or until `timeout` expires. Implementations must not
    /// spin-poll, the wait is suspended on the link's own event cadence.
    fn arm_and_climb(&mut self, target_alt_m: f64, timeout: Duration) -> Result<(), VehicleError>;

    /// Command the vehicle to enter its landing mode.
    fn land(&mut self) -> Result<(), VehicleError>;

    /// Command the vehicle to return to its launch position.
    ///
    /// Note: no obstacle avoidance.
    fn return_to_launch(&mut self) -> Result<(), VehicleError>;

    /// Issue a motion command in the vehicle body frame.
    fn send_motion(&mut self, cmd: &MotionCmd) -> Result<(), VehicleError>;

    /// Get the current telemetry snapshot.
    fn telemetry(&self) -> Result<VehicleTm, VehicleError>;
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl<T: VehicleLink + ?Sized> VehicleLink for Box<T> {
    fn arm_and_climb(&mut self, target_alt_m: f64, timeout: Duration) -> Result<(), VehicleError> {
        (**self).arm_and_climb(target_alt_m, timeout)
    }

    fn land(&mut self) -> Result<(), VehicleError> {
        (**self).land()
    }

    fn return_to_launch(&mut self) -> Result<(), VehicleError> {
        (**self).return_to_launch()
    }

    fn send_motion(&mut self, cmd: &MotionCmd) -> Result<(), VehicleError> {
        (**self).send_motion(cmd)
    }

    fn telemetry(&self) -> Result<VehicleTm, VehicleError> {
        (**self).telemetry()
    }
}

impl MotionCmd {
    /// The full-stop command, zero yaw rate and zero forward velocity.
    pub fn stop() -> Self {
        Self {
            yaw_rate_degs: 0.0,
            fwd_vel_ms: 0.0,
        }
    }
}
