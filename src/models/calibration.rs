use nalgebra::{Matrix3, Vector3};

use crate::error::{ReconError, Result};

/// Largest accepted Frobenius norm of `basisᵀ·basis - I`
///
/// Loose enough for rotations saved with a handful of decimals.
pub const ORTHONORMAL_TOLERANCE: f64 = 1e-3;

/// Pinhole calibration of one optical device (camera or projector)
///
/// Constructors run [`CalibrationData::validate`]; the builder methods do not.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationData {
    /// Intrinsics `[[fx, s, cx], [0, fy, cy], [0, 0, 1]]`
    pub intrinsics: Matrix3<f64>,
    /// Lens distortion, OpenCV ordering `k1, k2, p1, p2[, k3[, k4, k5, k6[, s1..s4]]]`
    pub distortion: Vec<f64>,
    /// Rotation basis, identity unless provided
    pub basis: Matrix3<f64>,
    /// Optical center in world space, zero unless provided
    pub origin: Vector3<f64>,
    /// Sensor (or projector) width in pixels, if known
    pub width: Option<u32>,
    /// Sensor (or projector) height in pixels, if known
    pub height: Option<u32>,
}

impl CalibrationData {
    /// Calibration with the given intrinsics and all defaults
    pub fn new(intrinsics: Matrix3<f64>) -> Result<Self> {
        let data = Self {
            intrinsics,
            distortion: Vec::new(),
            basis: Matrix3::identity(),
            origin: Vector3::zeros(),
            width: None,
            height: None,
        };
        data.validate()?;
        Ok(data)
    }

    /// Intrinsics from focal lengths and principal point
    pub fn from_focal(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Self> {
        Self::new(Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0))
    }

    /// Replace the distortion coefficients
    pub fn with_distortion(mut self, coefficients: Vec<f64>) -> Self {
        self.distortion = coefficients;
        self
    }

    /// Replace the extrinsics
    pub fn with_pose(mut self, basis: Matrix3<f64>, origin: Vector3<f64>) -> Self {
        self.basis = basis;
        self.origin = origin;
        self
    }

    /// Record the pixel resolution
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Resolution, when both dimensions are known
    pub fn size(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    /// Check the invariants: finite values, an invertible intrinsic matrix
    /// and an orthonormal basis
    pub fn validate(&self) -> Result<()> {
        if self.intrinsics.iter().any(|v| !v.is_finite()) {
            return Err(ReconError::config("intrinsic matrix contains non-finite values"));
        }
        if self.intrinsics.determinant().abs() < f64::EPSILON {
            return Err(ReconError::config("intrinsic matrix is not invertible"));
        }
        if self.distortion.iter().any(|v| !v.is_finite()) {
            return Err(ReconError::config("distortion coefficients must be finite"));
        }
        if self.basis.iter().chain(self.origin.iter()).any(|v| !v.is_finite()) {
            return Err(ReconError::config("extrinsics contain non-finite values"));
        }
        let deviation = (self.basis.transpose() * self.basis - Matrix3::identity()).norm();
        if deviation > ORTHONORMAL_TOLERANCE {
            return Err(ReconError::config(format!(
                "basis is not orthonormal (|BᵀB - I| = {deviation:.3e})"
            )));
        }
        Ok(())
    }
}
