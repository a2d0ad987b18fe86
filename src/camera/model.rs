use nalgebra::{Matrix3, Point3, Vector3};
use std::fmt;
use std::str::FromStr;

use super::distortion::Distortion;
use crate::error::{ReconError, Result};
use crate::models::CalibrationData;

/// Default iteration budget for inverting lens distortion
pub const DEFAULT_UNDISTORT_ITERATIONS: usize = 20;

/// How a calibration basis relates camera-frame and world-frame directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasisConvention {
    /// `ray_world = basis * ray_camera`
    #[default]
    CameraToWorld,
    /// `ray_world = basisᵀ * ray_camera` (basis maps world into the camera)
    WorldToCamera,
}

impl FromStr for BasisConvention {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "camera-to-world" | "direct" => Ok(Self::CameraToWorld),
            "world-to-camera" | "transposed" => Ok(Self::WorldToCamera),
            other => Err(ReconError::config(format!(
                "unknown basis convention '{other}' (expected camera-to-world or world-to-camera)"
            ))),
        }
    }
}

impl fmt::Display for BasisConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CameraToWorld => f.write_str("camera-to-world"),
            Self::WorldToCamera => f.write_str("world-to-camera"),
        }
    }
}

/// Calibrated pinhole device that turns pixels into world-space rays
///
/// Used both for the observing camera and for the projector.
#[derive(Debug, Clone)]
pub struct CalibratedCameraModel {
    intrinsics_inv: Matrix3<f64>,
    distortion: Distortion,
    to_world: Matrix3<f64>,
    convention: BasisConvention,
    origin: Point3<f64>,
    size: Option<(u32, u32)>,
    undistort_iterations: usize,
}

impl CalibratedCameraModel {
    /// Model with the default basis convention and iteration budget
    pub fn new(calibration: &CalibrationData) -> Result<Self> {
        Self::with_options(
            calibration,
            BasisConvention::default(),
            DEFAULT_UNDISTORT_ITERATIONS,
        )
    }

    /// Model with an explicit basis convention and undistortion budget
    pub fn with_options(
        calibration: &CalibrationData,
        convention: BasisConvention,
        undistort_iterations: usize,
    ) -> Result<Self> {
        calibration.validate()?;
        let intrinsics_inv = calibration
            .intrinsics
            .try_inverse()
            .ok_or_else(|| ReconError::config("intrinsic matrix is not invertible"))?;
        let to_world = match convention {
            BasisConvention::CameraToWorld => calibration.basis,
            BasisConvention::WorldToCamera => calibration.basis.transpose(),
        };
        Ok(Self {
            intrinsics_inv,
            distortion: Distortion::from_coefficients(&calibration.distortion),
            to_world,
            convention,
            origin: Point3::from(calibration.origin),
            size: calibration.size(),
            undistort_iterations: undistort_iterations.max(1),
        })
    }

    /// Normalized camera-frame coordinates `(x, y)` on the `z = 1` plane
    pub fn pixel_to_normalized(&self, u: f64, v: f64) -> (f64, f64) {
        let h = self.intrinsics_inv * Vector3::new(u, v, 1.0);
        let (xd, yd) = (h.x / h.z, h.y / h.z);
        self.distortion
            .undistort(xd, yd, self.undistort_iterations)
    }

    /// Unit direction in world space of the ray through pixel `(u, v)`
    pub fn pixel_to_ray(&self, u: f64, v: f64) -> Vector3<f64> {
        let (x, y) = self.pixel_to_normalized(u, v);
        (self.to_world * Vector3::new(x, y, 1.0)).normalize()
    }

    /// Optical center in world space
    pub fn position(&self) -> Point3<f64> {
        self.origin
    }

    /// Pixel resolution from the calibration, if recorded
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Convention the basis was read with
    pub fn convention(&self) -> BasisConvention {
        self.convention
    }

    /// Undistortion iteration budget, at least 1
    pub fn undistort_iterations(&self) -> usize {
        self.undistort_iterations
    }
}
