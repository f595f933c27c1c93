//! Utility library for the UAV Pursuit Software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod host;
pub mod logger;
pub mod params;
pub mod rolling;
pub mod session;
pub mod time;
