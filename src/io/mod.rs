//! Narrow I/O capabilities the core depends on
//!
//! - Calibration documents (`load_calibration`)
//! - Grayscale float rasters (`RasterLoader`)
//! - Correspondence text lists

/// Calibration JSON documents
pub mod calibration;
/// Correspondence text lists
pub mod correspondence;
/// Raster loading backends
pub mod raster;

pub use calibration::{load_calibration, parse_calibration};
pub use correspondence::{ParsedCorrespondences, parse_correspondences};
pub use raster::{ImageRasterLoader, RasterLoader};
