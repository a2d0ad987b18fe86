use rayon::prelude::*;

use crate::error::{ReconError, Result};
use crate::models::{Raster, ValidityMask};

/// Threshold the difference of two rasters into a validity mask
///
/// A pixel is valid when `lit - unlit > threshold`; equal or lower contrast
/// (including negative differences) is invalid.
pub fn threshold_difference(lit: &Raster, unlit: &Raster, threshold: f32) -> Result<ValidityMask> {
    if lit.dimensions() != unlit.dimensions() {
        return Err(ReconError::Raster(format!(
            "reference rasters differ in size: {:?} vs {:?}",
            lit.dimensions(),
            unlit.dimensions()
        )));
    }

    let (width, height) = lit.dimensions();
    let mut flags = vec![0u8; width * height];
    if width > 0 {
        flags.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let a = lit.row(y);
            let b = unlit.row(y);
            for x in 0..width {
                row[x] = (a[x] - b[x] > threshold) as u8;
            }
        });
    }

    Ok(ValidityMask::from_raw(width, height, flags))
}
