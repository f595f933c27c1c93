//! # Descend phase
//!
//! The single exit path for the mission: every way of finishing (seek
//! timeout, operator cancel) funnels through here. Commands the vehicle to
//! land, then releases the perception and ranging equipment.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;

// Internal
use eqpt_if::{percep::PercepSource, ranging::RangingSensor, vehicle::VehicleLink};

use super::params::MissionParams;
use super::{MissionError, MissionPersistentData, PhaseTransition};
use crate::cancel::CancelSource;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The Descend phase state.
pub struct Descend;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Descend {
    pub fn new() -> Self {
        Self
    }

    /// Step the Descend phase.
    pub fn step<P, R, V, C>(
        &mut self,
        _params: &MissionParams,
        persistent: &mut MissionPersistentData<P, R, V, C>,
    ) -> Result<PhaseTransition, MissionError>
    where
        P: PercepSource,
        R: RangingSensor,
        V: VehicleLink,
        C: CancelSource,
    {
        info!("Landing");

        persistent
            .vehicle
            .land()
            .map_err(MissionError::VehicleError)?;

        // Equipment released after the landing command is accepted
        persistent.percep.teardown();

        if persistent.ranging.is_open() {
            persistent.ranging.disconnect();
        }

        info!("Mission complete");

        Ok(PhaseTransition::ToTerminated)
    }
}
