//! Sequence-level decoding: references, bit accumulation, match extraction

use image::{GrayImage, Luma};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

use super::bitplane::BitPlane;
use super::gray_code::gray_to_binary;
use super::layout::{Axis, CenterOffsets};
use super::mask::build_validity_mask;
use super::source::PatternSource;
use crate::config::DecoderConfig;
use crate::error::{ReconError, Result};
use crate::models::{Match, ValidityMask};

/// Counters gathered during one decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeTelemetry {
    /// Pixels left in the validity mask after erosion and cropping
    pub valid_pixels: usize,
    /// Pattern pairs that could not be loaded and were skipped
    pub skipped_pairs: usize,
    /// Matches emitted
    pub matches: usize,
}

/// Per-run decode state: the validity mask and both Gray accumulators
#[derive(Debug, Clone)]
pub struct DecodedMaps {
    /// Pixels eligible for decoding
    pub mask: ValidityMask,
    /// Gray code of the projector column
    pub vertical: BitPlane,
    /// Gray code of the projector row
    pub horizontal: BitPlane,
    /// Bit depth of the vertical code
    pub vertical_bits: usize,
    /// Bit depth of the horizontal code
    pub horizontal_bits: usize,
    /// Shifts applied when converting codes to projector coordinates
    pub offsets: CenterOffsets,
    /// Counters collected so far
    pub telemetry: DecodeTelemetry,
}

impl DecodedMaps {
    /// One match per masked pixel whose vertical and horizontal codes are
    /// both nonzero, in row-major order
    pub fn extract_matches(&self) -> Vec<Match> {
        let width = self.mask.width();
        let offsets = self.offsets;
        (0..self.mask.height())
            .into_par_iter()
            .flat_map_iter(|y| {
                let valid = self.mask.row(y);
                let v_codes = self.vertical.row(y);
                let h_codes = self.horizontal.row(y);
                (0..width).filter_map(move |x| {
                    let (v, h) = (v_codes[x], h_codes[x]);
                    if valid[x] == 0 || v == 0 || h == 0 {
                        return None;
                    }
                    Some(Match::new(
                        x as f64,
                        y as f64,
                        gray_to_binary(v) as f64 - offsets.vertical,
                        gray_to_binary(h) as f64 - offsets.horizontal,
                    ))
                })
            })
            .collect()
    }

    /// Write `mask.png`, `code_vertical.png` and `code_horizontal.png` into `dir`
    ///
    /// Codes are decoded to binary and scaled so the largest value of the
    /// axis bit depth maps to 255.
    pub fn save_debug_maps<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| ReconError::io(dir, e))?;

        let (width, height) = (self.mask.width() as u32, self.mask.height() as u32);
        let mask = GrayImage::from_fn(width, height, |x, y| {
            Luma([if self.mask.get(x as usize, y as usize) { 255 } else { 0 }])
        });
        save_png(&mask, &dir.join("mask.png"))?;

        for (plane, bits, name) in [
            (&self.vertical, self.vertical_bits, "code_vertical.png"),
            (&self.horizontal, self.horizontal_bits, "code_horizontal.png"),
        ] {
            let full_scale = ((1u64 << bits.min(32)) - 1).max(1) as f64;
            let map = GrayImage::from_fn(width, height, |x, y| {
                let code = gray_to_binary(plane.get(x as usize, y as usize)) as f64;
                Luma([(code / full_scale * 255.0).round().min(255.0) as u8])
            });
            save_png(&map, &dir.join(name))?;
        }
        debug!("debug maps written to {}", dir.display());
        Ok(())
    }
}

fn save_png(img: &GrayImage, path: &Path) -> Result<()> {
    img.save(path).map_err(|e| match e {
        image::ImageError::IoError(source) => ReconError::io(path, source),
        other => ReconError::Raster(format!("{}: {other}", path.display())),
    })
}

/// Result of a full decode
#[derive(Debug, Clone, Default)]
pub struct DecodeOutput {
    /// Camera to projector correspondences
    pub matches: Vec<Match>,
    /// Counters for the run
    pub telemetry: DecodeTelemetry,
}

/// Demodulates a captured Gray-code sequence into correspondences
///
/// Holds only configuration; every buffer lives for one call, so a single
/// decoder can serve several sequences, also concurrently.
#[derive(Debug, Clone)]
pub struct PatternDecoder {
    config: DecoderConfig,
    offsets: CenterOffsets,
}

impl PatternDecoder {
    /// Decoder with explicit center offsets
    pub fn new(config: DecoderConfig, offsets: CenterOffsets) -> Self {
        Self { config, offsets }
    }

    /// Decoder for a `width` x `height` projector with the given bit depths
    ///
    /// `config.center_offsets`, when set, wins over the derived offsets.
    pub fn for_projector(
        config: DecoderConfig,
        width: u32,
        height: u32,
        vertical_bits: usize,
        horizontal_bits: usize,
    ) -> Result<Self> {
        let offsets = match config.center_offsets {
            Some(offsets) => offsets,
            None => CenterOffsets::from_projector(width, height, vertical_bits, horizontal_bits)?,
        };
        Ok(Self::new(config, offsets))
    }

    /// Active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Offsets subtracted from decoded codes
    pub fn offsets(&self) -> CenterOffsets {
        self.offsets
    }

    /// Build the mask and both accumulators for `source`
    ///
    /// A missing white or blank reference is fatal. A pattern pair that
    /// cannot be loaded leaves its bit unset everywhere and is counted in
    /// the telemetry. The skipped pair still occupies its bit position, so
    /// the remaining pairs keep their weights and the center offsets stay
    /// valid; codes are not shifted down to close the gap.
    pub fn decode_maps(&self, source: &impl PatternSource) -> Result<DecodedMaps> {
        let white = source.white()?;
        let blank = source.blank()?;
        let (width, height) = white.dimensions();

        let mask = build_validity_mask(&white, &blank, &self.config)?;
        drop((white, blank));

        let mut telemetry = DecodeTelemetry {
            valid_pixels: mask.count(),
            ..DecodeTelemetry::default()
        };
        debug!(
            "{}: {} of {} pixels valid",
            source.describe(),
            telemetry.valid_pixels,
            width * height
        );

        let (vertical, vertical_bits) =
            self.accumulate_axis(source, Axis::Vertical, &mask, &mut telemetry)?;
        let (horizontal, horizontal_bits) =
            self.accumulate_axis(source, Axis::Horizontal, &mask, &mut telemetry)?;
        Ok(DecodedMaps {
            mask,
            vertical,
            horizontal,
            vertical_bits,
            horizontal_bits,
            offsets: self.offsets,
            telemetry,
        })
    }

    fn accumulate_axis(
        &self,
        source: &impl PatternSource,
        axis: Axis,
        mask: &ValidityMask,
        telemetry: &mut DecodeTelemetry,
    ) -> Result<(BitPlane, usize)> {
        let pairs = source.pair_count(axis);
        if pairs > u32::BITS as usize {
            return Err(ReconError::config(format!(
                "{axis} axis has {pairs} pairs; at most {} are supported",
                u32::BITS
            )));
        }

        let mut plane = BitPlane::new(mask.width(), mask.height());
        // last pair carries bit 0
        for pair in (0..pairs).rev() {
            let bit = (pairs - 1 - pair) as u32;
            match source.pair(axis, pair) {
                Ok((pattern, inverse)) => plane.accumulate(bit, &pattern, &inverse, mask)?,
                Err(err @ ReconError::MissingAsset { .. }) => {
                    warn!("skipping {axis} bit {bit}: {err}");
                    telemetry.skipped_pairs += 1;
                }
                Err(err) => return Err(err),
            }
        }
        Ok((plane, pairs))
    }

    /// Decode `source` into matches
    pub fn decode_sequence(&self, source: &impl PatternSource) -> Result<DecodeOutput> {
        let maps = self.decode_maps(source)?;
        Ok(Self::finish(maps))
    }

    /// Extract matches from already decoded maps
    pub fn finish(maps: DecodedMaps) -> DecodeOutput {
        let matches = maps.extract_matches();
        let telemetry = DecodeTelemetry {
            matches: matches.len(),
            ..maps.telemetry
        };
        info!(
            "decoded {} matches ({} valid pixels, {} pairs skipped)",
            telemetry.matches, telemetry.valid_pixels, telemetry.skipped_pairs
        );
        DecodeOutput { matches, telemetry }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::gray_code::binary_to_gray;
    use crate::decoder::source::InMemorySource;
    use crate::models::Raster;

    /// 4x2 sequence where column x encodes vertical code x+1 and row y
    /// encodes horizontal code y+1, both with 3 bits
    fn source() -> InMemorySource {
        let (w, h, bits) = (4, 2, 3);
        let pairs = |code_of: fn(usize, usize) -> u32| -> Vec<Option<(Raster, Raster)>> {
            (0..bits)
                .map(|pair| {
                    let bit = bits - 1 - pair;
                    let on = move |x: usize, y: usize| (binary_to_gray(code_of(x, y)) >> bit) & 1 == 1;
                    Some((
                        Raster::from_fn(w, h, |x, y| if on(x, y) { 0.9 } else { 0.1 }),
                        Raster::from_fn(w, h, |x, y| if on(x, y) { 0.1 } else { 0.9 }),
                    ))
                })
                .collect()
        };
        InMemorySource {
            white: Some(Raster::from_fn(w, h, |_, _| 1.0)),
            blank: Some(Raster::new(w, h)),
            vertical: pairs(|x, _| x as u32 + 1),
            horizontal: pairs(|_, y| y as u32 + 1),
        }
    }

    fn decoder() -> PatternDecoder {
        let config = DecoderConfig {
            erosion_iterations: 0,
            ..DecoderConfig::default()
        };
        PatternDecoder::new(config, CenterOffsets::new(0.5, 1.0))
    }

    #[test]
    fn test_decodes_codes_in_row_major_order() {
        let out = decoder().decode_sequence(&source()).unwrap();
        assert_eq!(out.matches.len(), 8);
        assert_eq!(out.telemetry.matches, 8);
        assert_eq!(out.telemetry.valid_pixels, 8);
        assert_eq!(out.matches[0], Match::new(0.0, 0.0, 0.5, 0.0));
        assert_eq!(out.matches[7], Match::new(3.0, 1.0, 3.5, 1.0));
    }

    #[test]
    fn test_missing_pair_leaves_bit_unset() {
        let mut src = source();
        // drop the most significant vertical pair (bit 2)
        src.vertical[0] = None;
        let out = decoder().decode_sequence(&src).unwrap();
        assert_eq!(out.telemetry.skipped_pairs, 1);

        let maps = decoder().decode_maps(&src).unwrap();
        for x in 0..4 {
            let expected = binary_to_gray(x as u32 + 1) & 0b011;
            assert_eq!(maps.vertical.get(x, 0), expected);
        }
        // column 2 has gray(3) = 0b010, still nonzero without bit 2
        assert!(out.matches.iter().any(|m| m.cam_u == 2.0));
    }

    #[test]
    fn test_missing_low_pair_keeps_higher_bit_weights() {
        let mut src = source();
        src.vertical[2] = None;
        let maps = decoder().decode_maps(&src).unwrap();
        assert_eq!(maps.telemetry.skipped_pairs, 1);
        for x in 0..4 {
            let expected = binary_to_gray(x as u32 + 1) & 0b110;
            assert_eq!(maps.vertical.get(x, 0), expected);
        }
    }

    #[test]
    fn test_missing_reference_is_fatal() {
        let mut src = source();
        src.white = None;
        let err = decoder().decode_sequence(&src).unwrap_err();
        assert!(matches!(err, ReconError::MissingAsset { .. }));
    }

    #[test]
    fn test_mismatched_pattern_size_is_fatal() {
        let mut src = source();
        src.horizontal[1] = Some((Raster::new(3, 2), Raster::new(3, 2)));
        assert!(matches!(
            decoder().decode_sequence(&src),
            Err(ReconError::Raster(_))
        ));
    }

    #[test]
    fn test_offsets_from_projector_or_override() {
        let derived =
            PatternDecoder::for_projector(DecoderConfig::default(), 1920, 1080, 11, 11).unwrap();
        assert_eq!(derived.offsets(), CenterOffsets::new(64.0, 484.0));

        let config = DecoderConfig {
            center_offsets: Some(CenterOffsets::new(1.0, 2.0)),
            ..DecoderConfig::default()
        };
        let overridden = PatternDecoder::for_projector(config, 1920, 1080, 11, 11).unwrap();
        assert_eq!(overridden.offsets(), CenterOffsets::new(1.0, 2.0));
    }

    #[test]
    fn test_debug_maps_written() {
        let maps = decoder().decode_maps(&source()).unwrap();
        let dir = std::env::temp_dir().join(format!("recon_debug_maps_{}", std::process::id()));
        maps.save_debug_maps(&dir).unwrap();

        let mask = image::open(dir.join("mask.png")).unwrap().to_luma8();
        assert_eq!(mask.dimensions(), (4, 2));
        assert_eq!(mask.get_pixel(0, 0).0[0], 255);
        let vertical = image::open(dir.join("code_vertical.png")).unwrap().to_luma8();
        // code 4 of 7 at column 3
        assert_eq!(vertical.get_pixel(3, 0).0[0], 146);
        let _ = fs::remove_dir_all(&dir);
    }
}
