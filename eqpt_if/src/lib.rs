//! # Equipment interface crate.
//!
//! Provides the interfaces to the three external collaborators of the
//! pursuit software:
//!
//! - [`percep`] - the object detection pipeline (camera + neural network)
//! - [`ranging`] - the forward-facing rangefinder
//! - [`vehicle`] - the flight controller link

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Perception equipment: detection batches and the source trait
pub mod percep;

/// Ranging equipment: range samples and the serial rangefinder driver
pub mod ranging;

/// Vehicle equipment: motion commands, telemetry and the link trait
pub mod vehicle;
