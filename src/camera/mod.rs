//! Calibrated pinhole devices
//!
//! Converts pixels into world-space rays: inverse intrinsics, inverse lens
//! distortion, then the calibration basis. The projector is modelled as a
//! camera looking out through its own pixels.

/// Lens distortion model and its iterative inverse
pub mod distortion;
/// Pixel to world-ray model
pub mod model;

pub use distortion::Distortion;
pub use model::{BasisConvention, CalibratedCameraModel};
