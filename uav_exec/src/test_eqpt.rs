//! Scripted equipment implementations used by unit tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use std::time::Duration;

use eqpt_if::{
    percep::{Detection, PercepError, PercepFrame, PercepSource},
    ranging::{RangeSample, RangingError, RangingSensor},
    vehicle::{Attitude, Battery, GlobalPos, MotionCmd, VehicleError, VehicleLink, VehicleTm},
};
use nalgebra::Vector3;

use crate::cancel::CancelSource;

// ---------------------------------------------------------------------------
// PERCEPTION
// ---------------------------------------------------------------------------

/// A perception source that replays a scripted sequence of detection
/// batches, then reports empty batches forever.
pub struct MockPercep {
    script: VecDeque<Vec<Detection>>,
    pub polls: usize,
    pub torn_down: bool,
}

impl MockPercep {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script: script.into(),
            polls: 0,
            torn_down: false,
        }
    }
}

impl PercepSource for MockPercep {
    fn setup(&mut self) -> Result<(), PercepError> {
        Ok(())
    }

    fn frame_dimensions(&self) -> (u32, u32) {
        (1280, 720)
    }

    fn poll(&mut self) -> Result<PercepFrame, PercepError> {
        self.polls += 1;

        Ok(PercepFrame {
            timestamp: chrono::Utc::now(),
            detections: self.script.pop_front().unwrap_or_default(),
            net_fps: 25.0,
        })
    }

    fn teardown(&mut self) {
        self.torn_down = true;
    }
}

// ---------------------------------------------------------------------------
// RANGING
// ---------------------------------------------------------------------------

/// A ranging sensor that replays scripted poll results, then times out
/// forever.
pub struct MockRanging {
    script: VecDeque<Result<RangeSample, RangingError>>,
    pub polls: usize,
    pub open: bool,
}

impl MockRanging {
    pub fn new(script: Vec<Result<RangeSample, RangingError>>) -> Self {
        Self {
            script: script.into(),
            polls: 0,
            open: true,
        }
    }

    /// A sensor that reports the same range on every poll.
    pub fn constant(range_m: f64, polls: usize) -> Self {
        Self::new(
            (0..polls)
                .map(|_| {
                    Ok(RangeSample {
                        range_m,
                        strength: 400,
                    })
                })
                .collect(),
        )
    }
}

impl RangingSensor for MockRanging {
    fn poll(&mut self, _timeout: Duration) -> Result<RangeSample, RangingError> {
        self.polls += 1;
        self.script.pop_front().unwrap_or(Err(RangingError::Timeout))
    }

    fn read_temperature(&mut self, _timeout: Duration) -> Result<f64, RangingError> {
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

/// A vehicle link that records every command it is sent.
pub struct MockVehicle {
    pub sent: Vec<MotionCmd>,
    pub climbed_to_m: Option<f64>,
    pub landed: bool,
    pub fail_arm: bool,
}

impl MockVehicle {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            climbed_to_m: None,
            landed: false,
            fail_arm: false,
        }
    }
}

impl VehicleLink for MockVehicle {
    fn arm_and_climb(&mut self, target_alt_m: f64, _timeout: Duration) -> Result<(), VehicleError> {
        if self.fail_arm {
            return Err(VehicleError::ArmTimeout);
        }

        self.climbed_to_m = Some(target_alt_m);
        Ok(())
    }

    fn land(&mut self) -> Result<(), VehicleError> {
        self.landed = true;
        Ok(())
    }

    fn return_to_launch(&mut self) -> Result<(), VehicleError> {
        Ok(())
    }

    fn send_motion(&mut self, cmd: &MotionCmd) -> Result<(), VehicleError> {
        self.sent.push(*cmd);
        Ok(())
    }

    fn telemetry(&self) -> Result<VehicleTm, VehicleError> {
        Ok(VehicleTm {
            position: GlobalPos {
                lat_deg: 0.0,
                lon_deg: 0.0,
                alt_m: self.climbed_to_m.unwrap_or(0.0),
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
            mode: "GUIDED".into(),
            home: None,
            ekf_ok: true,
        })
    }
}

// ---------------------------------------------------------------------------
// CANCEL
// ---------------------------------------------------------------------------

/// A cancel source that fires after a configured number of checks.
pub struct MockCancel {
    /// Number of checks remaining before the cancel fires, `None` never
    /// fires.
    fire_after: Option<usize>,
}

impl MockCancel {
    pub fn never() -> Self {
        Self { fire_after: None }
    }

    pub fn after(checks: usize) -> Self {
        Self {
            fire_after: Some(checks),
        }
    }
}

impl CancelSource for MockCancel {
    fn cancel_requested(&mut self) -> bool {
        match self.fire_after.as_mut() {
            Some(n) if *n == 0 => true,
            Some(n) => {
                *n -= 1;
                false
            }
            None => false,
        }
    }
}
