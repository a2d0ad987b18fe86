//! Plain data shared by every stage

/// Per-device calibration parameters
pub mod calibration;
/// Camera to projector pixel correspondence
pub mod correspondence;
/// Per-pixel validity flags
pub mod mask;
/// Triangulated output points
pub mod point_cloud;
/// Single-channel float images
pub mod raster;

pub use calibration::CalibrationData;
pub use correspondence::Match;
pub use mask::ValidityMask;
pub use point_cloud::PointCloud;
pub use raster::Raster;
