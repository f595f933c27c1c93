//! Pursuit control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::regulator::AxisGains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for pursuit control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Yaw-rate axis gains, driven by the bearing deviation in pixels
    pub yaw_gains: AxisGains,

    /// Forward-speed axis gains, driven by the range deviation in metres
    pub speed_gains: AxisGains,

    /// Yaw-rate demand clamp in degrees/second
    pub yaw_rate_limit_degs: f64,

    /// Forward-velocity demand clamp in metres/second
    pub fwd_vel_limit_ms: f64,

    /// The target range held from the tracked target in metres
    pub standoff_range_m: f64,

    /// Capacity of the bearing-deviation rolling window
    pub bearing_window_capacity: usize,

    /// Capacity of the range rolling window
    pub range_window_capacity: usize,

    /// Bound on a single rangefinder poll in seconds. A poll that produces
    /// no valid frame within this time is treated as "no trustworthy range
    /// this tick".
    pub range_poll_timeout_s: f64,
}

#[cfg(test)]
impl Params {
    /// Parameter set used by unit tests, matching the tuned defaults.
    pub fn test_defaults() -> Self {
        Self {
            yaw_gains: AxisGains {
                k_p: 0.6,
                k_i: 0.0,
                k_d: 0.0,
            },
            speed_gains: AxisGains {
                k_p: 0.2,
                k_i: 0.0,
                k_d: 0.0,
            },
            yaw_rate_limit_degs: 20.0,
            fwd_vel_limit_ms: 3.0,
            standoff_range_m: 1.5,
            bearing_window_capacity: 5,
            range_window_capacity: 5,
            range_poll_timeout_s: 0.5,
        }
    }
}
