//! Binary morphology on validity masks

use rayon::prelude::*;

use crate::models::ValidityMask;

/// Erode with a 3x3 cross structuring element, `iterations` times
///
/// A pixel survives only if it and its four edge neighbours are set.
/// Neighbours outside the mask count as set, so the border itself is not
/// eaten. Each pass reads the previous pass's buffer and writes rows in
/// parallel into a fresh one.
pub fn erode_cross(mask: &ValidityMask, iterations: usize) -> ValidityMask {
    let (width, height) = (mask.width(), mask.height());
    let mut current = mask.clone();
    if width == 0 || height == 0 {
        return current;
    }

    let mut next = ValidityMask::new(width, height);
    for _ in 0..iterations {
        let src = current.as_bytes();
        next.as_bytes_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let here = &src[y * width..(y + 1) * width];
                let above = (y > 0).then(|| &src[(y - 1) * width..y * width]);
                let below = (y + 1 < height).then(|| &src[(y + 1) * width..(y + 2) * width]);
                for x in 0..width {
                    let keep = here[x] != 0
                        && (x == 0 || here[x - 1] != 0)
                        && (x + 1 == width || here[x + 1] != 0)
                        && above.is_none_or(|r| r[x] != 0)
                        && below.is_none_or(|r| r[x] != 0);
                    row[x] = keep as u8;
                }
            });
        std::mem::swap(&mut current, &mut next);
    }

    current
}
