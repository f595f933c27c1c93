//! # Simulated equipment
//!
//! Stand-ins for the camera pipeline, rangefinder and flight controller so
//! the full mission can be exercised on a desk. The simulations are
//! deliberately simple: a single target that wanders slowly across the
//! frame, a rangefinder that tracks the commanded closure, and a vehicle
//! that climbs at a fixed rate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use nalgebra::{Point2, Vector3};
use std::thread;
use std::time::Duration;

// Internal
use eqpt_if::{
    percep::{BBox, Detection, PercepError, PercepFrame, PercepSource},
    ranging::{RangeSample, RangingError, RangingSensor},
    vehicle::{
        Attitude, Battery, GlobalPos, MotionCmd, VehicleError, VehicleLink, VehicleTm,
    },
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Simulated camera frame dimensions in pixels.
const FRAME_DIMS: (u32, u32) = (1280, 720);

/// Simulated detector frame period.
const FRAME_PERIOD: Duration = Duration::from_millis(40);

/// Number of polls before the simulated target first appears.
const TARGET_APPEARS_AFTER_POLLS: usize = 10;

/// Simulated climb rate in metres/second.
const CLIMB_RATE_MS: f64 = 0.4;

// ---------------------------------------------------------------------------
// PERCEPTION
// ---------------------------------------------------------------------------

/// A perception source that synthesises a single wandering person target.
pub struct SimPercep {
    polls: usize,
    setup: bool,
}

impl SimPercep {
    pub fn new() -> Self {
        Self {
            polls: 0,
            setup: false,
        }
    }
}

impl PercepSource for SimPercep {
    fn setup(&mut self) -> Result<(), PercepError> {
        info!("Simulated perception source ready");
        self.setup = true;
        Ok(())
    }

    fn frame_dimensions(&self) -> (u32, u32) {
        FRAME_DIMS
    }

    fn poll(&mut self) -> Result<PercepFrame, PercepError> {
        if !self.setup {
            return Err(PercepError::NotSetup);
        }

        // Pace the poll at the simulated detector's frame rate
        thread::sleep(FRAME_PERIOD);
        self.polls += 1;

        let detections = if self.polls > TARGET_APPEARS_AFTER_POLLS {
            // Slow horizontal wander about the frame centre
            let t = self.polls as f64 * FRAME_PERIOD.as_secs_f64();
            let cx = FRAME_DIMS.0 as f64 / 2.0 + 150.0 * (0.2 * t).sin();
            let cy = FRAME_DIMS.1 as f64 / 2.0 + 30.0 * (0.1 * t).sin();

            vec![Detection {
                class_id: 1,
                centre_px: Point2::new(cx, cy),
                bbox: BBox {
                    left: cx - 180.0,
                    right: cx + 180.0,
                    top: cy - 280.0,
                    bottom: cy + 280.0,
                },
            }]
        } else {
            vec![]
        };

        Ok(PercepFrame {
            timestamp: chrono::Utc::now(),
            detections,
            net_fps: 25.0,
        })
    }

    fn teardown(&mut self) {
        info!("Simulated perception source released");
        self.setup = false;
    }
}

// ---------------------------------------------------------------------------
// RANGING
// ---------------------------------------------------------------------------

/// A rangefinder that integrates the commanded forward velocity.
///
/// The executable's sim loop feeds the vehicle's last motion command into
/// [`SimRanging::advance`] each tick, so closing on the target reduces the
/// measured range and the speed regulator can settle at the standoff.
pub struct SimRanging {
    range_m: f64,
    open: bool,
}

impl SimRanging {
    /// A sensor starting at the given range to the target.
    pub fn new(initial_range_m: f64) -> Self {
        Self {
            range_m: initial_range_m,
            open: true,
        }
    }

    /// Advance the simulated range by the vehicle's motion over `dt`.
    pub fn advance(&mut self, cmd: &MotionCmd, dt: Duration) {
        // The regulator's demand is sign-inverted, a negative forward demand
        // closes on the target in this simulation's convention
        self.range_m = (self.range_m + cmd.fwd_vel_ms * dt.as_secs_f64()).max(0.0);
    }
}

impl RangingSensor for SimRanging {
    fn poll(&mut self, _timeout: Duration) -> Result<RangeSample, RangingError> {
        if !self.open {
            return Err(RangingError::NotOpen);
        }

        Ok(RangeSample {
            range_m: self.range_m,
            strength: 500,
        })
    }

    fn read_temperature(&mut self, _timeout: Duration) -> Result<f64, RangingError> {
        if !self.open {
            return Err(RangingError::NotOpen);
        }

        Ok(25.0)
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn disconnect(&mut self) {
        self.open = false;
    }
}

// ---------------------------------------------------------------------------
// VEHICLE
// ---------------------------------------------------------------------------

/// A flight controller simulation with a fixed-rate climb model.
pub struct SimVehicle {
    alt_m: f64,
    armed: bool,
    mode: String,
    last_cmd: MotionCmd,
}

impl SimVehicle {
    pub fn new() -> Self {
        Self {
            alt_m: 0.0,
            armed: false,
            mode: "GUIDED".into(),
            last_cmd: MotionCmd::stop(),
        }
    }

    /// The most recent motion command, used to drive [`SimRanging`].
    pub fn last_cmd(&self) -> MotionCmd {
        self.last_cmd
    }
}

impl VehicleLink for SimVehicle {
    fn arm_and_climb(&mut self, target_alt_m: f64, timeout: Duration) -> Result<(), VehicleError> {
        info!("Simulated vehicle arming");
        self.armed = true;

        // Model the climb as a single timed wait at the fixed climb rate,
        // succeeding once 95% of the target altitude is reached
        let climb_time = Duration::from_secs_f64(0.95 * target_alt_m / CLIMB_RATE_MS);
        if climb_time > timeout {
            return Err(VehicleError::ClimbTimeout);
        }

        thread::sleep(climb_time);
        self.alt_m = target_alt_m;
        info!("Simulated vehicle at {:.1} m", self.alt_m);

        Ok(())
    }

    fn land(&mut self) -> Result<(), VehicleError> {
        info!("Simulated vehicle landing");
        self.mode = "LAND".into();
        self.alt_m = 0.0;
        self.armed = false;

        Ok(())
    }

    fn return_to_launch(&mut self) -> Result<(), VehicleError> {
        self.mode = "RTL".into();

        Ok(())
    }

    fn send_motion(&mut self, cmd: &MotionCmd) -> Result<(), VehicleError> {
        if !self.armed {
            return Err(VehicleError::LinkClosed);
        }

        self.last_cmd = *cmd;
        debug!(
            "Simulated motion command: {:+.2} deg/s, {:+.2} m/s",
            cmd.yaw_rate_degs, cmd.fwd_vel_ms
        );

        Ok(())
    }

    fn telemetry(&self) -> Result<VehicleTm, VehicleError> {
        Ok(VehicleTm {
            position: GlobalPos {
                lat_deg: 51.0,
                lon_deg: -1.4,
                alt_m: self.alt_m,
            },
            attitude: Attitude {
                roll_rad: 0.0,
                pitch_rad: 0.0,
                yaw_rad: 0.0,
            },
            velocity_ms: Vector3::zeros(),
            battery: Battery {
                voltage_v: 12.6,
                level_pct: Some(100.0),
            },
            mode: self.mode.clone(),
            home: Some(GlobalPos {
                lat_deg: 51.0,
                lon_deg: -1.4,
                alt_m: 0.0,
            }),
            ekf_ok: true,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_vehicle_rejects_motion_before_arming() {
        let mut vehicle = SimVehicle::new();

        assert!(vehicle.send_motion(&MotionCmd::stop()).is_err());
    }

    #[test]
    fn test_sim_vehicle_climb_times_out_when_too_slow() {
        let mut vehicle = SimVehicle::new();

        // 10 m at 0.4 m/s cannot complete inside one second
        assert!(matches!(
            vehicle.arm_and_climb(10.0, Duration::from_secs(1)),
            Err(VehicleError::ClimbTimeout)
        ));
    }

    #[test]
    fn test_sim_ranging_closes_with_negative_demand() {
        let mut ranging = SimRanging::new(3.0);

        let cmd = MotionCmd {
            yaw_rate_degs: 0.0,
            fwd_vel_ms: -0.5,
        };
        ranging.advance(&cmd, Duration::from_secs(1));

        let sample = ranging.poll(Duration::from_millis(100)).unwrap();
        assert!((sample.range_m - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_sim_percep_requires_setup() {
        let mut percep = SimPercep::new();

        assert!(percep.poll().is_err());
    }
}
