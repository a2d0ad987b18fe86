//! Tunable parameters for decoding and triangulation
//!
//! Both config structs start from their `Default` and can pick up overrides
//! from `RECON_*` environment variables. Values that fail to parse keep the
//! default.

use crate::camera::BasisConvention;
use crate::decoder::CenterOffsets;

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse::<T>().ok())
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Pattern decoder settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    /// Minimum white-minus-blank contrast for a pixel to be decoded
    pub signal_threshold: f32,
    /// Passes of 3x3 cross erosion applied to the contrast mask
    pub erosion_iterations: usize,
    /// Columns `[0, crop)` are masked out; 0 disables cropping
    pub crop: usize,
    /// Shifts the right crop edge to `width - crop + 2 * crop_offset`
    pub crop_offset: i64,
    /// Explicit projector center offsets; derived from the projector size when `None`
    pub center_offsets: Option<CenterOffsets>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            signal_threshold: 0.05,
            erosion_iterations: 6,
            crop: 0,
            crop_offset: 0,
            center_offsets: None,
        }
    }
}

impl DecoderConfig {
    /// Defaults overridden by `RECON_SIGNAL_THRESHOLD`, `RECON_EROSION_ITERATIONS`,
    /// `RECON_CROP` and `RECON_CROP_OFFSET`
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Defaults overridden by whatever `lookup` returns for the `RECON_*` names
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            signal_threshold: parse_var(&lookup, "RECON_SIGNAL_THRESHOLD")
                .filter(|v: &f32| v.is_finite())
                .unwrap_or(defaults.signal_threshold),
            erosion_iterations: parse_var(&lookup, "RECON_EROSION_ITERATIONS")
                .unwrap_or(defaults.erosion_iterations),
            crop: parse_var(&lookup, "RECON_CROP").unwrap_or(defaults.crop),
            crop_offset: parse_var(&lookup, "RECON_CROP_OFFSET").unwrap_or(defaults.crop_offset),
            center_offsets: defaults.center_offsets,
        }
    }

    /// Column ranges to invalidate for a raster `width` pixels wide
    ///
    /// Left band `[0, crop)`, right band `[width - crop + 2*offset, width)`,
    /// both clamped to the raster. Empty when cropping is disabled.
    pub fn crop_bands(&self, width: usize) -> Vec<(usize, usize)> {
        if self.crop == 0 {
            return Vec::new();
        }
        let right = width as i64 - self.crop as i64 + 2 * self.crop_offset;
        let right = right.clamp(0, width as i64) as usize;
        vec![(0, self.crop.min(width)), (right, width)]
    }
}

/// Triangulation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Added to both projector coordinates before casting the projector ray
    /// (e.g. 0.5 to move from pixel corners to pixel centers)
    pub projector_pixel_offset: f64,
    /// How calibration bases map camera-frame rays into the world
    pub basis_convention: BasisConvention,
    /// Iteration budget for inverting lens distortion
    pub undistort_iterations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            projector_pixel_offset: 0.0,
            basis_convention: BasisConvention::CameraToWorld,
            undistort_iterations: 20,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `RECON_PROJECTOR_PIXEL_OFFSET`,
    /// `RECON_BASIS_CONVENTION` and `RECON_UNDISTORT_ITERATIONS`
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Defaults overridden by whatever `lookup` returns for the `RECON_*` names
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            projector_pixel_offset: parse_var(&lookup, "RECON_PROJECTOR_PIXEL_OFFSET")
                .filter(|v: &f64| v.is_finite())
                .unwrap_or(defaults.projector_pixel_offset),
            basis_convention: parse_var(&lookup, "RECON_BASIS_CONVENTION")
                .unwrap_or(defaults.basis_convention),
            undistort_iterations: parse_var(&lookup, "RECON_UNDISTORT_ITERATIONS")
                .unwrap_or(defaults.undistort_iterations)
                .clamp(1, 1000),
        }
    }
}
