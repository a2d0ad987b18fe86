use rayon::prelude::*;

use crate::error::{ReconError, Result};
use crate::models::{Raster, ValidityMask};

/// Per-pixel Gray code accumulated for one axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitPlane {
    width: usize,
    height: usize,
    codes: Vec<u32>,
}

impl BitPlane {
    /// All-zero plane
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            codes: vec![0; width * height],
        }
    }

    /// Plane width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Accumulated Gray code at (x, y)
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.codes[y * self.width + x]
    }

    /// Borrow row `y`
    pub fn row(&self, y: usize) -> &[u32] {
        let start = y * self.width;
        &self.codes[start..start + self.width]
    }

    /// Largest code in the plane
    pub fn max_code(&self) -> u32 {
        self.codes.iter().copied().max().unwrap_or(0)
    }

    /// OR `1 << bit` into every masked pixel where `pattern > inverse`
    ///
    /// Rows are processed in parallel; each worker owns whole rows, so no
    /// pixel is touched by two workers within one call.
    pub fn accumulate(
        &mut self,
        bit: u32,
        pattern: &Raster,
        inverse: &Raster,
        mask: &ValidityMask,
    ) -> Result<()> {
        if bit >= u32::BITS {
            return Err(ReconError::config(format!("bit position {bit} exceeds 31")));
        }
        let dims = (self.width, self.height);
        for (name, other) in [
            ("pattern", pattern.dimensions()),
            ("inverse", inverse.dimensions()),
            ("mask", (mask.width(), mask.height())),
        ] {
            if other != dims {
                return Err(ReconError::Raster(format!(
                    "{name} is {other:?}, expected {dims:?}"
                )));
            }
        }
        if self.width == 0 {
            return Ok(());
        }

        let flag = 1u32 << bit;
        self.codes
            .par_chunks_mut(self.width)
            .enumerate()
            .for_each(|(y, row)| {
                let valid = mask.row(y);
                let lit = pattern.row(y);
                let dark = inverse.row(y);
                for x in 0..row.len() {
                    if valid[x] != 0 && lit[x] > dark[x] {
                        row[x] |= flag;
                    }
                }
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_sets_bit_where_pattern_brighter() {
        let pattern = Raster::from_vec(3, 1, vec![0.8, 0.2, 0.5]).unwrap();
        let inverse = Raster::from_vec(3, 1, vec![0.2, 0.8, 0.5]).unwrap();
        let mask = ValidityMask::filled(3, 1);

        let mut plane = BitPlane::new(3, 1);
        plane.accumulate(2, &pattern, &inverse, &mask).unwrap();
        assert_eq!(plane.row(0), &[0b100, 0, 0]);

        plane.accumulate(0, &pattern, &inverse, &mask).unwrap();
        assert_eq!(plane.row(0), &[0b101, 0, 0]);
        assert_eq!(plane.max_code(), 5);
    }

    #[test]
    fn test_masked_pixels_untouched() {
        let pattern = Raster::from_fn(2, 2, |_, _| 1.0);
        let inverse = Raster::new(2, 2);
        let mut mask = ValidityMask::filled(2, 2);
        mask.set(1, 1, false);

        let mut plane = BitPlane::new(2, 2);
        plane.accumulate(3, &pattern, &inverse, &mask).unwrap();
        assert_eq!(plane.get(0, 0), 8);
        assert_eq!(plane.get(1, 1), 0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut plane = BitPlane::new(2, 2);
        let mask = ValidityMask::filled(2, 2);
        let err = plane
            .accumulate(0, &Raster::new(3, 2), &Raster::new(2, 2), &mask)
            .unwrap_err();
        assert!(matches!(err, ReconError::Raster(_)));
        assert!(
            plane
                .accumulate(32, &Raster::new(2, 2), &Raster::new(2, 2), &mask)
                .is_err()
        );
    }
}
