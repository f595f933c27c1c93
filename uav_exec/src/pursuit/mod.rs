//! # Pursuit control module
//!
//! Pursuit control is responsible for keeping the vehicle pointed at, and at
//! a fixed standoff range from, the tracked target. Each tick it takes the
//! current detection batch, computes the horizontal bearing deviation
//! between the target centre and the frame centre, polls the rangefinder,
//! smooths both signals through rolling windows, and drives the two axis
//! regulators. The yaw-rate axis is regulated whenever the bearing window
//! holds samples. The speed axis is additionally gated: its deviation is
//! only trusted when the fixed-boresight rangefinder is actually looking at
//! the target's bounding box.
//!
//! The rolling windows are deliberately never cleared between target losses,
//! matching the observed behavior of the system this was built from.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod axis_log;
pub mod params;
pub mod regulator;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::Point2;
use std::path::Path;
use std::time::Duration;

// Internal
use eqpt_if::{
    percep::PercepFrame,
    ranging::{RangingError, RangingSensor},
    vehicle::{MotionCmd, VehicleError, VehicleLink},
};
use util::rolling::RollingWindow;
use util::session::Session;

pub use params::Params;
pub use regulator::{AxisGains, AxisRegulator, RegMode};

use axis_log::AxisLog;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pursuit controller.
///
/// Owns all mutable control state: the two rolling windows, the two axis
/// regulators and the axis log files. One instance lives for the whole
/// mission, so filter contents survive Seek/Pursue phase changes.
pub struct PursuitCtrl {
    /// Parameters for pursuit control
    params: Params,

    /// Rolling window over the horizontal bearing deviation in pixels
    bearing_window: RollingWindow<f64>,

    /// Rolling window over the measured range in metres
    range_window: RollingWindow<f64>,

    /// Yaw-rate axis regulator
    yaw_reg: AxisRegulator,

    /// Forward-speed axis regulator
    speed_reg: AxisRegulator,

    /// Log file for the yaw axis
    yaw_log: AxisLog,

    /// Log file for the speed axis
    speed_log: AxisLog,
}

/// Status report for one pursuit tick.
#[derive(Debug, Clone)]
pub struct PursuitStatus {
    /// The motion command issued this tick
    pub cmd: MotionCmd,

    /// True if the detection batch was empty this tick
    pub target_lost: bool,

    /// Horizontal deviation of the target centre from the frame centre in
    /// pixels, `None` when no target was present
    pub bearing_dev_px: Option<f64>,

    /// Vertical deviation in pixels, observational only, never regulated
    pub vert_dev_px: Option<f64>,

    /// True if the rangefinder boresight was inside the target's bounding
    /// box this tick
    pub boresight_aligned: bool,

    /// The raw range sample in metres, `None` if the poll timed out
    pub range_m: Option<f64>,

    /// Detector processing rate in frames per second
    pub net_fps: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur in pursuit control.
#[derive(Debug, thiserror::Error)]
pub enum PursuitError {
    #[error("Failed to load pursuit params: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Failed to create an axis log file: {0}")]
    LogInitError(std::io::Error),

    #[error("Vehicle link error: {0}")]
    VehicleError(VehicleError),

    #[error("Ranging link error: {0}")]
    RangingError(RangingError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PursuitCtrl {
    /// Initialise pursuit control from the given parameter file, writing the
    /// axis logs into the session directory.
    pub fn init(
        params_path: &str,
        mode: RegMode,
        session: &Session,
    ) -> Result<Self, PursuitError> {
        let params: Params =
            util::params::load(params_path).map_err(PursuitError::ParamLoadError)?;

        Self::from_params(params, mode, &session.session_root)
    }

    /// Build pursuit control from an in-memory parameter set.
    pub fn from_params(params: Params, mode: RegMode, log_dir: &Path) -> Result<Self, PursuitError> {
        let yaw_log = AxisLog::create(log_dir, "yaw_axis").map_err(PursuitError::LogInitError)?;
        let speed_log =
            AxisLog::create(log_dir, "speed_axis").map_err(PursuitError::LogInitError)?;

        Ok(Self {
            bearing_window: RollingWindow::new(params.bearing_window_capacity),
            range_window: RollingWindow::new(params.range_window_capacity),
            yaw_reg: AxisRegulator::new(&params.yaw_gains, mode, params.yaw_rate_limit_degs),
            speed_reg: AxisRegulator::new(&params.speed_gains, mode, params.fwd_vel_limit_ms),
            yaw_log,
            speed_log,
            params,
        })
    }

    /// Process one pursuit tick.
    ///
    /// Takes the detection batch polled by the caller, polls the
    /// rangefinder, and issues exactly one motion command to the vehicle.
    /// An empty batch produces a full-stop command and no regulation, the
    /// phase machine handles the Pursue to Seek transition off the returned
    /// `target_lost` flag.
    pub fn proc(
        &mut self,
        frame: &PercepFrame,
        frame_centre: &Point2<f64>,
        ranging: &mut dyn RangingSensor,
        vehicle: &mut dyn VehicleLink,
    ) -> Result<PursuitStatus, PursuitError> {
        // No detection is not the same as a zero deviation, absence of the
        // signal stops the vehicle without touching the regulators
        let target = match frame.detections.first() {
            Some(t) => t,
            None => {
                let cmd = MotionCmd::stop();
                vehicle.send_motion(&cmd).map_err(PursuitError::VehicleError)?;

                return Ok(PursuitStatus {
                    cmd,
                    target_lost: true,
                    bearing_dev_px: None,
                    vert_dev_px: None,
                    boresight_aligned: false,
                    range_m: None,
                    net_fps: frame.net_fps,
                });
            }
        };

        // Tracked target is the first reported detection, no ranking
        let bearing_dev_px = target.centre_px.x - frame_centre.x;
        let vert_dev_px = target.centre_px.y - frame_centre.y;

        // Alignment gate: is the rangefinder boresight (the frame centre)
        // inside the target's bounding box
        let aligned = target.bbox.strictly_contains(frame_centre);

        // Bounded-wait range poll. A timeout means there is no trustworthy
        // range this tick, any other ranging error is fatal.
        let timeout = Duration::from_secs_f64(self.params.range_poll_timeout_s);
        let range = match ranging.poll(timeout) {
            Ok(sample) => Some(sample),
            Err(RangingError::Timeout) => {
                warn!("Rangefinder poll timed out, skipping range regulation this tick");
                None
            }
            Err(e) => return Err(PursuitError::RangingError(e)),
        };

        // Both windows are fed unconditionally, the gate only suppresses
        // regulation, not smoothing
        if let Some(sample) = range {
            self.range_window.push(sample.range_m);
        }
        self.bearing_window.push(bearing_dev_px);

        let mut cmd = MotionCmd::stop();

        // Speed axis: regulated only when this tick's sample is present and
        // positive, the boresight is on the target, and the window holds
        // samples
        if let Some(sample) = range {
            if sample.range_m > 0.0 && aligned {
                if let Some(mean_range_m) = self.range_window.mean() {
                    let deviation_m = mean_range_m - self.params.standoff_range_m;
                    let demand_ms = self.speed_reg.update(deviation_m);
                    cmd.fwd_vel_ms = demand_ms;

                    if let Err(e) = self.speed_log.record(deviation_m, demand_ms) {
                        warn!("Could not write speed axis log record: {}", e);
                    }
                }
            }
        }

        // Yaw axis: regulated whenever the bearing window holds samples
        if let Some(mean_dev_px) = self.bearing_window.mean() {
            let demand_degs = self.yaw_reg.update(mean_dev_px);
            cmd.yaw_rate_degs = demand_degs;

            if let Err(e) = self.yaw_log.record(mean_dev_px, demand_degs) {
                warn!("Could not write yaw axis log record: {}", e);
            }
        }

        // Single logical command per tick, both axes in one send
        vehicle.send_motion(&cmd).map_err(PursuitError::VehicleError)?;

        debug!(
            "Pursuit tick: bearing {:+.1} px, vert {:+.1} px, aligned {}, range {:?}, cmd ({:+.2} deg/s, {:+.2} m/s)",
            bearing_dev_px, vert_dev_px, aligned, range, cmd.yaw_rate_degs, cmd.fwd_vel_ms
        );

        Ok(PursuitStatus {
            cmd,
            target_lost: false,
            bearing_dev_px: Some(bearing_dev_px),
            vert_dev_px: Some(vert_dev_px),
            boresight_aligned: aligned,
            range_m: range.map(|s| s.range_m),
            net_fps: frame.net_fps,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
