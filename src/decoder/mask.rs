use log::debug;

use crate::config::DecoderConfig;
use crate::error::Result;
use crate::models::{Raster, ValidityMask};
use crate::utils::binarization::threshold_difference;
use crate::utils::morphology::erode_cross;

/// Pixels that receive enough projector light to be decoded
///
/// `white - blank > signal_threshold`, eroded with a 3x3 cross
/// `erosion_iterations` times, then with the configured crop bands cleared.
pub fn build_validity_mask(
    white: &Raster,
    blank: &Raster,
    config: &DecoderConfig,
) -> Result<ValidityMask> {
    let raw = threshold_difference(white, blank, config.signal_threshold)?;
    let lit = raw.count();

    let mut mask = erode_cross(&raw, config.erosion_iterations);
    debug!(
        "validity mask: {} lit, {} after {} erosion passes",
        lit,
        mask.count(),
        config.erosion_iterations
    );

    for (start, end) in config.crop_bands(mask.width()) {
        mask.clear_columns(start, end);
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_square(size: usize, lo: usize, hi: usize) -> (Raster, Raster) {
        let white = Raster::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                0.9
            } else {
                0.1
            }
        });
        (white, Raster::from_fn(size, size, |_, _| 0.1))
    }

    #[test]
    fn test_low_contrast_is_excluded() {
        let (white, blank) = lit_square(12, 2, 10);
        let config = DecoderConfig {
            erosion_iterations: 0,
            ..DecoderConfig::default()
        };
        let mask = build_validity_mask(&white, &blank, &config).unwrap();
        assert_eq!(mask.count(), 64);
        assert!(!mask.get(1, 5));
        assert!(mask.get(2, 5));
    }

    #[test]
    fn test_threshold_is_strict() {
        let white = Raster::from_fn(4, 1, |x, _| 0.25 * x as f32);
        let blank = Raster::new(4, 1);
        let config = DecoderConfig {
            signal_threshold: 0.5,
            erosion_iterations: 0,
            ..DecoderConfig::default()
        };
        let mask = build_validity_mask(&white, &blank, &config).unwrap();
        assert_eq!(mask.row(0), &[0, 0, 0, 1]);
    }

    #[test]
    fn test_erosion_then_crop() {
        let (white, blank) = lit_square(20, 0, 20);
        let config = DecoderConfig {
            erosion_iterations: 6,
            crop: 3,
            crop_offset: 1,
            ..DecoderConfig::default()
        };
        let mask = build_validity_mask(&white, &blank, &config).unwrap();
        // fully lit: erosion keeps everything, crop clears [0,3) and [19,20)
        assert!(!mask.get(2, 10));
        assert!(mask.get(3, 10));
        assert!(mask.get(18, 10));
        assert!(!mask.get(19, 10));
        assert_eq!(mask.count(), 16 * 20);
    }

    #[test]
    fn test_mismatched_references_fail() {
        let white = Raster::new(4, 4);
        let blank = Raster::new(5, 4);
        assert!(build_validity_mask(&white, &blank, &DecoderConfig::default()).is_err());
    }
}
