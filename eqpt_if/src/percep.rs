//! # Perception Equipment Interface
//!
//! The perception pipeline (camera capture plus detection network) is an
//! external collaborator, only its boundary is defined here. A
//! [`PercepSource`] produces one [`PercepFrame`] per poll: the batch of
//! detections found in the most recent camera frame, along with the
//! detector's reported processing rate. Detections are not retained between
//! polls.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An axis-aligned bounding box in image-pixel coordinates.
///
/// `top < bottom` since image y grows downwards.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct BBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// A single detection reported by the perception pipeline.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Detection {
    /// Class identifier reported by the network.
    pub class_id: u32,

    /// Centre of the detection in image-pixel coordinates.
    pub centre_px: Point2<f64>,

    /// Bounding box of the detection in image-pixel coordinates.
    pub bbox: BBox,
}

/// One polled batch of detections.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PercepFrame {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// Detections in the frame, in the order reported by the network.
    pub detections: Vec<Detection>,

    /// Processing rate reported by the detector in frames per second.
    pub net_fps: f64,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Errors that can occur in a perception source.
#[derive(Debug, thiserror::Error)]
pub enum PercepError {
    #[error("The perception source is not set up")]
    NotSetup,

    #[error("Failed to capture a frame from the source: {0}")]
    CaptureFailed(String),
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// A source of detection batches.
///
/// Implementations wrap the actual capture/inference pipeline. The trait
/// exists so the control loop can be exercised against scripted sources in
/// tests.
pub trait PercepSource {
    /// Acquire the capture device and load the detection network.
    fn setup(&mut self) -> Result<(), PercepError>;

    /// Dimensions of the camera frame in pixels, `(width, height)`.
    fn frame_dimensions(&self) -> (u32, u32);

    /// Poll the source for the current detection batch.
    ///
    /// Blocks until the next camera frame has been processed, so the call
    /// cadence is bounded by the source's native frame rate.
    fn poll(&mut self) -> Result<PercepFrame, PercepError>;

    /// Release the capture device.
    fn teardown(&mut self);
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl<T: PercepSource + ?Sized> PercepSource for Box<T> {
    fn setup(&mut self) -> Result<(), PercepError> {
        (**self).setup()
    }

    fn frame_dimensions(&self) -> (u32, u32) {
        (**self).frame_dimensions()
    }

    fn poll(&mut self) -> Result<PercepFrame, PercepError> {
        (**self).poll()
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}

impl BBox {
    /// True iff `point` lies strictly inside the box on both axes.
    ///
    /// Open-interval semantics: a point exactly on any edge is outside. This
    /// is the alignment gate used to decide whether the fixed-boresight
    /// rangefinder is currently looking at the detection.
    pub fn strictly_contains(&self, point: &Point2<f64>) -> bool {
        self.left < point.x && point.x < self.right && self.top < point.y && point.y < self.bottom
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn bbox() -> BBox {
        BBox {
            left: 100.0,
            right: 200.0,
            top: 50.0,
            bottom: 250.0,
        }
    }

    #[test]
    fn test_strictly_interior_point_is_inside() {
        assert!(bbox().strictly_contains(&Point2::new(150.0, 150.0)));
    }

    #[test]
    fn test_edge_touching_points_are_outside() {
        let b = bbox();

        // Centre of each edge, exactly on the boundary
        assert!(!b.strictly_contains(&Point2::new(100.0, 150.0)));
        assert!(!b.strictly_contains(&Point2::new(200.0, 150.0)));
        assert!(!b.strictly_contains(&Point2::new(150.0, 50.0)));
        assert!(!b.strictly_contains(&Point2::new(150.0, 250.0)));

        // Corner
        assert!(!b.strictly_contains(&Point2::new(100.0, 50.0)));
    }

    #[test]
    fn test_exterior_point_is_outside() {
        assert!(!bbox().strictly_contains(&Point2::new(0.0, 0.0)));
        assert!(!bbox().strictly_contains(&Point2::new(300.0, 150.0)));
    }
}
