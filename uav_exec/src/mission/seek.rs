//! # Seek phase
//!
//! Holds the vehicle stationary at the height ceiling while polling the
//! perception source for a target. The first non-empty detection batch hands
//! over to Pursue. If no target appears within the configured timeout the
//! phase gives up and hands over to Descend.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::time::Instant;

// Internal
use eqpt_if::{
    percep::PercepSource,
    ranging::RangingSensor,
    vehicle::{MotionCmd, VehicleLink},
};

use super::params::MissionParams;
use super::{MissionError, MissionPersistentData, PhaseTransition};
use crate::cancel::CancelSource;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The Seek phase state.
pub struct Seek {
    /// Time at which this phase was entered, re-entry resets the timeout.
    entered_at: Instant,

    /// True once the hold-position command has been issued.
    halted: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Seek {
    pub fn new() -> Self {
        Self {
            entered_at: Instant::now(),
            halted: false,
        }
    }

    /// Step the Seek phase.
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
        self.step_at(Instant::now(), params, persistent)
    }

    /// Step the Seek phase against an externally supplied clock.
    fn step_at<P, R, V, C>(
        &mut self,
        now: Instant,
        params: &MissionParams,
        persistent: &mut MissionPersistentData<P, R, V, C>,
    ) -> Result<PhaseTransition, MissionError>
    where
        P: PercepSource,
        R: RangingSensor,
        V: VehicleLink,
        C: CancelSource,
    {
        // Hold position while searching
        if !self.halted {
            persistent
                .vehicle
                .send_motion(&MotionCmd::stop())
                .map_err(MissionError::VehicleError)?;
            self.halted = true;
        }

        let frame = persistent
            .percep
            .poll()
            .map_err(MissionError::PercepError)?;

        if !frame.detections.is_empty() {
            info!(
                "Target acquired ({} detection(s)), starting pursuit",
                frame.detections.len()
            );
            return Ok(PhaseTransition::ToPursue);
        }

        let elapsed_s = now.saturating_duration_since(self.entered_at).as_secs_f64();

        if elapsed_s >= params.seek_timeout_s {
            info!(
                "No target found within {:.0} s, descending",
                params.seek_timeout_s
            );
            return Ok(PhaseTransition::ToDescend);
        }

        debug!(
            "Seeking target, {:.1} s remaining",
            params.seek_timeout_s - elapsed_s
        );

        Ok(PhaseTransition::Stay)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::test_util::persistent_data;
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stays_just_inside_the_timeout() {
        let mut seek = Seek::new();
        let mut persistent = persistent_data(vec![]);
        let params = MissionParams::test_defaults();

        // 39.9 s after entry with no detections the phase holds
        let now = seek.entered_at + Duration::from_millis(39_900);
        let transition = seek.step_at(now, &params, &mut persistent).unwrap();

        assert!(matches!(transition, PhaseTransition::Stay));
    }

    #[test]
    fn test_times_out_at_the_boundary() {
        let mut seek = Seek::new();
        let mut persistent = persistent_data(vec![]);
        let params = MissionParams::test_defaults();

        // Exactly 40.0 s after entry the phase gives up
        let now = seek.entered_at + Duration::from_secs(40);
        let transition = seek.step_at(now, &params, &mut persistent).unwrap();

        assert!(matches!(transition, PhaseTransition::ToDescend));
    }

    #[test]
    fn test_detection_preempts_the_timeout() {
        let mut seek = Seek::new();
        let mut persistent =
            persistent_data(vec![vec![super::super::test_util::person_detection()]]);
        let params = MissionParams::test_defaults();

        // Even at the timeout boundary a detection wins
        let now = seek.entered_at + Duration::from_secs(40);
        let transition = seek.step_at(now, &params, &mut persistent).unwrap();

        assert!(matches!(transition, PhaseTransition::ToPursue));
    }

    #[test]
    fn test_halts_motion_once_on_entry() {
        let mut seek = Seek::new();
        let mut persistent = persistent_data(vec![]);
        let params = MissionParams::test_defaults();

        seek.step(&params, &mut persistent).unwrap();
        seek.step(&params, &mut persistent).unwrap();

        // One stop command, not one per tick
        assert_eq!(persistent.vehicle.sent, vec![MotionCmd::stop()]);
    }
}
