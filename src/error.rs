//! Error types for decoding and reconstruction.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ReconError>;

/// Errors raised while decoding patterns or building a point cloud.
#[derive(Debug, Error)]
pub enum ReconError {
    /// Calibration document or configuration value is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A raster the decoder needs could not be loaded.
    #[error("missing asset {}: {reason}", path.display())]
    MissingAsset {
        /// Path (or logical name) of the raster.
        path: PathBuf,
        /// Why it could not be used.
        reason: String,
    },

    /// Two rays are parallel or nearly so; no unique closest point exists.
    #[error("degenerate ray geometry: determinant {determinant:e}")]
    DegenerateGeometry {
        /// Determinant of the 2x2 normal-equation system.
        determinant: f64,
    },

    /// Raster contents are inconsistent with the rest of the sequence.
    #[error("raster error: {0}")]
    Raster(String),

    /// Filesystem read or write failure.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ReconError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a missing-asset error for `path`.
    pub fn missing_asset(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MissingAsset {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for conditions the pipeline may recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateGeometry { .. })
    }
}
