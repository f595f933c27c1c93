//! Mission sequencing parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the mission state machine
#[derive(Deserialize, Debug, Clone)]
pub struct MissionParams {
    /// Altitude the vehicle climbs to on launch, in metres. This is the
    /// mission-wide height ceiling.
    pub climb_ceiling_m: f64,

    /// Bound on the blocking arm-and-climb call in seconds
    pub arm_climb_timeout_s: f64,

    /// Time in seconds the Seek phase waits for a detection before falling
    /// back to a controlled descent
    pub seek_timeout_s: f64,
}

#[cfg(test)]
impl MissionParams {
    /// Parameter set used by unit tests, matching the tuned defaults.
    pub fn test_defaults() -> Self {
        Self {
            climb_ceiling_m: 1.5,
            arm_climb_timeout_s: 60.0,
            seek_timeout_s: 40.0,
        }
    }
}
