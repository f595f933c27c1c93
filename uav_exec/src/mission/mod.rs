//! # Mission management module
//!
//! The mission manager drives the flight as a linear phase machine:
//!
//! ```text
//! Launch -> Seek <-> Pursue
//!             \       /
//!              Descend -> Terminated
//! ```
//!
//! Launch arms and climbs the vehicle, Seek searches for a target, Pursue
//! runs the pursuit control loop, and Descend lands. Seek and Pursue hand
//! control back and forth as the target is acquired and lost; every way of
//! ending the mission (seek timeout, operator cancel) goes through Descend,
//! so the vehicle always lands under command. Equipment errors and vehicle
//! link errors abort the step and are surfaced to the executable, which halts
//! rather than continue uncommanded flight.
//!
//! All mutable control state lives in [`MissionPersistentData`], one instance
//! of which is owned by the manager for the whole mission. In particular the
//! pursuit controller (and its rolling filters) survives Seek/Pursue phase
//! changes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;

mod descend;
mod launch;
mod pursue;
mod seek;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use nalgebra::Point2;
use std::fmt;

// Internal
use eqpt_if::{
    percep::{PercepError, PercepSource},
    ranging::RangingSensor,
    vehicle::{VehicleError, VehicleLink},
};
use util::session::Session;

use crate::cancel::CancelSource;
use crate::pursuit::{PursuitCtrl, PursuitError, RegMode};

pub use params::MissionParams;

use descend::Descend;
use launch::Launch;
use pursue::Pursue;
use seek::Seek;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The mission manager.
///
/// Generic over the equipment behind it so the phase logic can be exercised
/// against scripted equipment in tests.
pub struct MissionMgr<P, R, V, C>
where
    P: PercepSource,
    R: RangingSensor,
    V: VehicleLink,
    C: CancelSource,
{
    /// Parameters for the mission state machine
    params: MissionParams,

    /// Data which is persistent across phase changes
    pub persistent: MissionPersistentData<P, R, V, C>,

    /// The currently active phase
    state: PhaseState,
}

/// Data persistent between mission phases.
pub struct MissionPersistentData<P, R, V, C>
where
    P: PercepSource,
    R: RangingSensor,
    V: VehicleLink,
    C: CancelSource,
{
    /// The pursuit controller, including its rolling filter state
    pub pursuit: PursuitCtrl,

    /// Source of detection batches
    pub percep: P,

    /// The rangefinder
    pub ranging: R,

    /// The command and telemetry link to the flight controller
    pub vehicle: V,

    /// Source of operator cancel requests
    pub cancel: C,

    /// Centre of the camera frame in pixels, also the rangefinder boresight
    pub frame_centre: Point2<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The externally visible mission phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionPhase {
    Launch,
    Seek,
    Pursue,
    Descend,
    Terminated,
}

/// The active phase and its state.
enum PhaseState {
    Launch(Launch),
    Seek(Seek),
    Pursue(Pursue),
    Descend(Descend),
    Terminated,
}

/// Transition requested by a phase step.
enum PhaseTransition {
    Stay,
    ToSeek,
    ToPursue,
    ToDescend,
    ToTerminated,
}

/// Errors that can occur in mission management.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("Failed to load mission params: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Pursuit control error: {0}")]
    PursuitError(PursuitError),

    #[error("Perception source error: {0}")]
    PercepError(PercepError),

    #[error("Vehicle link error: {0}")]
    VehicleError(VehicleError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P, R, V, C> MissionMgr<P, R, V, C>
where
    P: PercepSource,
    R: RangingSensor,
    V: VehicleLink,
    C: CancelSource,
{
    /// Initialise the mission manager.
    ///
    /// Loads the mission and pursuit parameter files, sets up the perception
    /// source, and places the mission in the Launch phase.
    pub fn init(
        mission_params_path: &str,
        pursuit_params_path: &str,
        alg: RegMode,
        session: &Session,
        mut percep: P,
        ranging: R,
        vehicle: V,
        cancel: C,
    ) -> Result<Self, MissionError> {
        let params: MissionParams =
            util::params::load(mission_params_path).map_err(MissionError::ParamLoadError)?;

        let pursuit = PursuitCtrl::init(pursuit_params_path, alg, session)
            .map_err(MissionError::PursuitError)?;

        percep.setup().map_err(MissionError::PercepError)?;

        Ok(Self::from_parts(params, pursuit, percep, ranging, vehicle, cancel))
    }

    /// Assemble a manager from already-built parts, in the Launch phase.
    pub fn from_parts(
        params: MissionParams,
        pursuit: PursuitCtrl,
        percep: P,
        ranging: R,
        vehicle: V,
        cancel: C,
    ) -> Self {
        let (width, height) = percep.frame_dimensions();
        info!("Perception frame dimensions: {}x{} px", width, height);

        Self {
            params,
            persistent: MissionPersistentData {
                pursuit,
                percep,
                ranging,
                vehicle,
                cancel,
                frame_centre: Point2::new(width as f64 / 2.0, height as f64 / 2.0),
            },
            state: PhaseState::Launch(Launch::new()),
        }
    }

    /// The current mission phase.
    pub fn phase(&self) -> MissionPhase {
        match self.state {
            PhaseState::Launch(_) => MissionPhase::Launch,
            PhaseState::Seek(_) => MissionPhase::Seek,
            PhaseState::Pursue(_) => MissionPhase::Pursue,
            PhaseState::Descend(_) => MissionPhase::Descend,
            PhaseState::Terminated => MissionPhase::Terminated,
        }
    }

    /// True once the mission has run to completion.
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, PhaseState::Terminated)
    }

    /// Step the mission manager, executing one tick of the active phase.
    ///
    /// Returns the phase in force after the step.
    pub fn step(&mut self) -> Result<MissionPhase, MissionError> {
        // The operator cancel is sampled once per tick while airborne and
        // searching or pursuing, and always wins over the phase body
        let cancelled = matches!(self.state, PhaseState::Seek(_) | PhaseState::Pursue(_))
            && self.persistent.cancel.cancel_requested();

        let transition = if cancelled {
            info!("Operator cancel requested, descending");
            PhaseTransition::ToDescend
        } else {
            match &mut self.state {
                PhaseState::Launch(s) => s.step(&self.params, &mut self.persistent)?,
                PhaseState::Seek(s) => s.step(&self.params, &mut self.persistent)?,
                PhaseState::Pursue(s) => s.step(&self.params, &mut self.persistent)?,
                PhaseState::Descend(s) => s.step(&self.params, &mut self.persistent)?,
                PhaseState::Terminated => PhaseTransition::Stay,
            }
        };

        match transition {
            PhaseTransition::Stay => (),
            PhaseTransition::ToSeek => self.change_state(PhaseState::Seek(Seek::new())),
            PhaseTransition::ToPursue => self.change_state(PhaseState::Pursue(Pursue::new())),
            PhaseTransition::ToDescend => self.change_state(PhaseState::Descend(Descend::new())),
            PhaseTransition::ToTerminated => self.change_state(PhaseState::Terminated),
        }

        Ok(self.phase())
    }

    fn change_state(&mut self, new: PhaseState) {
        info!("Mission phase change: {} -> {}", self.state, new);
        self.state = new;
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PhaseState::Launch(_) => write!(f, "Launch"),
            PhaseState::Seek(_) => write!(f, "Seek"),
            PhaseState::Pursue(_) => write!(f, "Pursue"),
            PhaseState::Descend(_) => write!(f, "Descend"),
            PhaseState::Terminated => write!(f, "Terminated"),
        }
    }
}

impl fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MissionPhase::Launch => write!(f, "Launch"),
            MissionPhase::Seek => write!(f, "Seek"),
            MissionPhase::Pursue => write!(f, "Pursue"),
            MissionPhase::Descend => write!(f, "Descend"),
            MissionPhase::Terminated => write!(f, "Terminated"),
        }
    }
}

// ---------------------------------------------------------------------------
// TEST UTILITIES
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::pursuit::Params;
    use crate::test_eqpt::{MockCancel, MockPercep, MockRanging, MockVehicle};
    use eqpt_if::percep::{BBox, Detection};

    /// A person detection centred on the mock camera's frame centre, with a
    /// bounding box covering it.
    pub fn person_detection() -> Detection {
        Detection {
            class_id: 1,
            centre_px: Point2::new(640.0, 360.0),
            bbox: BBox {
                left: 440.0,
                right: 840.0,
                top: 60.0,
                bottom: 660.0,
            },
        }
    }

    fn pursuit() -> PursuitCtrl {
        PursuitCtrl::from_params(
            Params::test_defaults(),
            RegMode::Proportional,
            &std::env::temp_dir(),
        )
        .unwrap()
    }

    /// Persistent data backed by scripted equipment: the given perception
    /// script, a rangefinder holding 1.5 m, and a recording vehicle.
    pub fn persistent_data(
        percep_script: Vec<Vec<Detection>>,
    ) -> MissionPersistentData<MockPercep, MockRanging, MockVehicle, MockCancel> {
        MissionPersistentData {
            pursuit: pursuit(),
            percep: MockPercep::new(percep_script),
            ranging: MockRanging::constant(1.5, 32),
            vehicle: MockVehicle::new(),
            cancel: MockCancel::never(),
            frame_centre: Point2::new(640.0, 360.0),
        }
    }

    /// A manager in the Launch phase over scripted equipment.
    pub fn mgr(
        percep_script: Vec<Vec<Detection>>,
        cancel: MockCancel,
    ) -> MissionMgr<MockPercep, MockRanging, MockVehicle, MockCancel> {
        MissionMgr::from_parts(
            MissionParams::test_defaults(),
            pursuit(),
            MockPercep::new(percep_script),
            MockRanging::constant(1.5, 32),
            MockVehicle::new(),
            cancel,
        )
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::test_util::{mgr, person_detection};
    use super::*;
    use crate::test_eqpt::MockCancel;

    #[test]
    fn test_launch_climbs_to_the_ceiling_then_seeks() {
        let mut mgr = mgr(vec![], MockCancel::never());

        assert_eq!(mgr.phase(), MissionPhase::Launch);
        assert_eq!(mgr.step().unwrap(), MissionPhase::Seek);
        assert_eq!(mgr.persistent.vehicle.climbed_to_m, Some(1.5));
    }

    #[test]
    fn test_failed_launch_is_fatal() {
        let mut mgr = mgr(vec![], MockCancel::never());
        mgr.persistent.vehicle.fail_arm = true;

        assert!(matches!(
            mgr.step(),
            Err(MissionError::VehicleError(VehicleError::ArmTimeout))
        ));
    }

    #[test]
    fn test_target_acquired_and_lost_cycles_seek_and_pursue() {
        // One detection batch for Seek, one for Pursue, then nothing: the
        // mission acquires, pursues for a tick, loses the target and drops
        // back to searching
        let mut mgr = mgr(
            vec![vec![person_detection()], vec![person_detection()]],
            MockCancel::never(),
        );

        assert_eq!(mgr.step().unwrap(), MissionPhase::Seek);
        assert_eq!(mgr.step().unwrap(), MissionPhase::Pursue);
        assert_eq!(mgr.step().unwrap(), MissionPhase::Pursue);
        assert_eq!(mgr.step().unwrap(), MissionPhase::Seek);
    }

    #[test]
    fn test_operator_cancel_forces_descent() {
        let mut mgr = mgr(vec![], MockCancel::after(0));

        // Launch does not sample the cancel, the first Seek tick does
        assert_eq!(mgr.step().unwrap(), MissionPhase::Seek);
        assert_eq!(mgr.step().unwrap(), MissionPhase::Descend);
        assert_eq!(mgr.step().unwrap(), MissionPhase::Terminated);

        assert!(mgr.persistent.vehicle.landed);
    }

    #[test]
    fn test_descend_releases_equipment() {
        let mut mgr = mgr(vec![], MockCancel::after(0));

        mgr.step().unwrap();
        mgr.step().unwrap();
        mgr.step().unwrap();

        assert!(mgr.persistent.percep.torn_down);
        assert!(!mgr.persistent.ranging.is_open());
        assert!(mgr.is_terminated());

        // Terminated is a fixed point
        assert_eq!(mgr.step().unwrap(), MissionPhase::Terminated);
    }

    #[test]
    fn test_cancel_is_not_sampled_during_launch() {
        // A cancel pending from the very start must not abort the launch
        let mut mgr = mgr(vec![vec![person_detection()]], MockCancel::after(1));

        assert_eq!(mgr.step().unwrap(), MissionPhase::Seek);
    }
}
