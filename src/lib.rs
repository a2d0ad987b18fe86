//! metrology_recon - structured-light 3-D reconstruction
//!
//! Decodes captured Gray-code pattern sequences into camera to projector
//! pixel correspondences, casts calibrated rays from both devices and
//! triangulates them into a point cloud.
//!
//! ```no_run
//! use metrology_recon::{DecoderConfig, PipelineConfig, SequenceLayout, reconstruct_directory};
//!
//! let cloud = reconstruct_directory(
//!     "camera.json",
//!     "projector.json",
//!     "scan/",
//!     &SequenceLayout::default(),
//!     &DecoderConfig::default(),
//!     PipelineConfig::default(),
//! )?;
//! cloud.write_ply("output.ply")?;
//! # Ok::<(), metrology_recon::ReconError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Pixel to world-ray camera models
pub mod camera;
/// Decoder and pipeline settings
pub mod config;
/// Gray-code demodulation into correspondences
pub mod decoder;
/// Crate error type
pub mod error;
/// Calibration, raster and correspondence input
pub mod io;
/// Core data structures (CalibrationData, Match, PointCloud, etc.)
pub mod models;
/// Triangulation and point-cloud accumulation
pub mod pipeline;
/// Utility functions (luma, thresholding, erosion, ray geometry)
pub mod utils;

use std::path::Path;

pub use camera::{BasisConvention, CalibratedCameraModel};
pub use config::{DecoderConfig, PipelineConfig};
pub use decoder::{CenterOffsets, DirectorySource, PatternDecoder, PatternSource, SequenceLayout};
pub use error::{ReconError, Result};
pub use models::{CalibrationData, Match, PointCloud};
pub use pipeline::{ReconstructionPipeline, ReconstructionTelemetry};

/// Decode the pattern sequence in `dir` and triangulate it into a point cloud
///
/// Calibrations are read from JSON files. The projector calibration must
/// carry `width`/`height` unless `decoder_config` sets explicit center
/// offsets.
pub fn reconstruct_directory<P, Q, R>(
    camera_calibration: P,
    projector_calibration: Q,
    dir: R,
    layout: &SequenceLayout,
    decoder_config: &DecoderConfig,
    pipeline_config: PipelineConfig,
) -> Result<PointCloud>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let camera = io::load_calibration(camera_calibration)?;
    let projector = io::load_calibration(projector_calibration)?;
    let mut pipeline = ReconstructionPipeline::from_calibration(&camera, &projector, pipeline_config)?;

    let source = DirectorySource::new(dir, layout.clone());
    pipeline.process_sequence(&source, decoder_config)?;
    Ok(pipeline.into_point_cloud())
}
