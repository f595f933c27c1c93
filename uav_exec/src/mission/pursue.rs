//! # Pursue phase
//!
//! Runs one pursuit control tick per step: polls the perception source and
//! hands the batch to the pursuit controller, which regulates both axes and
//! issues the tick's motion command. Losing the target drops the mission
//! back into Seek; the pursuit controller's filter state is owned by the
//! persistent data, so it survives the phase change.

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

/// The Pursue phase state.
pub struct Pursue;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pursue {
    pub fn new() -> Self {
        Self
    }

    /// Step the Pursue phase.
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
        let frame = persistent
            .percep
            .poll()
            .map_err(MissionError::PercepError)?;

        let frame_centre = persistent.frame_centre;

        let status = persistent
            .pursuit
            .proc(
                &frame,
                &frame_centre,
                &mut persistent.ranging,
                &mut persistent.vehicle,
            )
            .map_err(MissionError::PursuitError)?;

        if status.target_lost {
            info!("Target lost, returning to search");
            return Ok(PhaseTransition::ToSeek);
        }

        Ok(PhaseTransition::Stay)
    }
}
