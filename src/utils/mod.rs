//! Utility functions for pixel and ray processing
//!
//! - Luma reduction of multi-channel float rasters
//! - Contrast thresholding into validity masks
//! - Cross-shaped binary erosion
//! - Ray-ray closest-point intersection

/// Contrast thresholding
pub mod binarization;
/// Ray-ray intersection
pub mod geometry;
/// Luma reduction
pub mod grayscale;
/// Mask erosion
pub mod morphology;
