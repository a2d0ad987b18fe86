//! Reduce interleaved floating-point pixels to single-channel luma
//! Y = 0.299*R + 0.587*G + 0.114*B
//!
//! Channel layouts:
//! - 1 channel: copied through
//! - 2 channels: luma + alpha, alpha dropped
//! - 3 channels: RGB
//! - 4 channels: RGBA, alpha dropped

use rayon::prelude::*;

use crate::error::{ReconError, Result};
use crate::models::Raster;

/// Luma weights, RGB order; they sum to 1
const COEF_R: f32 = 0.299;
const COEF_G: f32 = 0.587;
const COEF_B: f32 = 0.114;

#[inline]
fn luma(r: f32, g: f32, b: f32) -> f32 {
    COEF_R * r + COEF_G * g + COEF_B * b
}

/// Convert interleaved samples with `channels` channels into a luma raster
pub fn to_luma(samples: &[f32], width: usize, height: usize, channels: usize) -> Result<Raster> {
    let expected = width * height * channels;
    if channels == 0 || channels > 4 || samples.len() != expected {
        return Err(ReconError::Raster(format!(
            "cannot reduce {} samples as {}x{} with {} channels",
            samples.len(),
            width,
            height,
            channels
        )));
    }

    let mut gray = vec![0.0f32; width * height];
    if width > 0 {
        gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let row_start = y * width * channels;
            for (x, out) in row.iter_mut().enumerate() {
                let idx = row_start + x * channels;
                *out = match channels {
                    1 | 2 => samples[idx],
                    _ => luma(samples[idx], samples[idx + 1], samples[idx + 2]),
                };
            }
        });
    }

    Raster::from_vec(width, height, gray)
        .ok_or_else(|| ReconError::Raster("luma buffer size mismatch".to_string()))
}

/// Convert interleaved RGB floats to luma
pub fn rgb_to_luma(rgb: &[f32], width: usize, height: usize) -> Result<Raster> {
    to_luma(rgb, width, height, 3)
}
