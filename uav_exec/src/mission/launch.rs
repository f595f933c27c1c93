//! # Launch phase
//!
//! Arms the vehicle and climbs it to the mission height ceiling. The climb
//! call blocks on the vehicle link's own event cadence, bounded by the
//! configured timeout. Any vehicle error here is fatal, an aircraft that
//! cannot complete its launch sequence is not flown.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::time::Duration;

// Internal
use eqpt_if::{percep::PercepSource, ranging::RangingSensor, vehicle::VehicleLink};

use super::params::MissionParams;
use super::{MissionError, MissionPersistentData, PhaseTransition};
use crate::cancel::CancelSource;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The Launch phase state.
pub struct Launch;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Launch {
    pub fn new() -> Self {
        Self
    }

    /// Step the Launch phase.
    pub fn step<P, R, V, C>(
        &mut self,
        params: &MissionParams,
        persistent: &mut MissionPersistentData<P, R, V, C>,
    ) -> Result<PhaseTransition, MissionError>
    where
        P: PercepSource,
        R: RangingSensor,
        V: VehicleLink,
        C: CancelSource,
    {
        // Pre-flight status report, informational only
        match persistent.vehicle.telemetry() {
            Ok(tm) => info!(
                "Vehicle status: mode {}, battery {:.1} V, EKF ok: {}",
                tm.mode, tm.battery.voltage_v, tm.ekf_ok
            ),
            Err(e) => warn!("Could not read pre-flight telemetry: {}", e),
        }

        info!("Arming and climbing to {:.1} m", params.climb_ceiling_m);

        persistent
            .vehicle
            .arm_and_climb(
                params.climb_ceiling_m,
                Duration::from_secs_f64(params.arm_climb_timeout_s),
            )
            .map_err(MissionError::VehicleError)?;

        info!("Climb complete, starting target search");

        Ok(PhaseTransition::ToSeek)
    }
}
