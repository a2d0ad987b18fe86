//! Raster loading capability
//!
//! The decoder only needs `load_grayscale_float(path) -> Raster`; the
//! `image`-backed loader here is the default implementation and handles
//! every format the crate decodes, OpenEXR included.

use std::path::Path;

use crate::error::{ReconError, Result};
use crate::models::Raster;
use crate::utils::grayscale::rgb_to_luma;

/// Anything that can produce single-channel float rasters from paths
pub trait RasterLoader: Send + Sync {
    /// Load `path` and reduce it to one luma channel
    fn load_grayscale_float(&self, path: &Path) -> Result<Raster>;
}

/// [`RasterLoader`] backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRasterLoader;

impl RasterLoader for ImageRasterLoader {
    fn load_grayscale_float(&self, path: &Path) -> Result<Raster> {
        if !path.is_file() {
            return Err(ReconError::missing_asset(path, "file not found"));
        }
        let img = image::open(path).map_err(|e| ReconError::missing_asset(path, e.to_string()))?;
        // Integer formats are normalized to [0, 1]; float formats keep their range.
        let rgb = img.to_rgb32f();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        rgb_to_luma(rgb.as_raw(), width, height)
    }
}
