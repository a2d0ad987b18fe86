//! Rendering of ideal pattern sequences for tests and benchmarks

use super::gray_code::binary_to_gray;
use super::source::InMemorySource;
use crate::models::Raster;

const LIT: f32 = 0.9;
const DARK: f32 = 0.1;

/// Render a complete in-memory sequence
///
/// `mapping(x, y)` gives the binary projector `(column, row)` code seen by
/// camera pixel `(x, y)`, or `None` for pixels the projector does not reach.
/// Unreached pixels get no white-over-blank contrast.
pub fn render_sequence<F>(
    width: usize,
    height: usize,
    vertical_bits: usize,
    horizontal_bits: usize,
    mapping: F,
) -> InMemorySource
where
    F: Fn(usize, usize) -> Option<(u32, u32)>,
{
    let codes: Vec<Option<(u32, u32)>> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| mapping(x, y).map(|(u, v)| (binary_to_gray(u), binary_to_gray(v))))
        .collect();
    let at = |x: usize, y: usize| codes[y * width + x];

    let white = Raster::from_fn(width, height, |x, y| if at(x, y).is_some() { LIT } else { DARK });
    let blank = Raster::from_fn(width, height, |_, _| DARK);

    let render_axis = |bits: usize, pick: fn((u32, u32)) -> u32| {
        (0..bits)
            .map(|pair| {
                let bit = bits - 1 - pair;
                let shade = |x: usize, y: usize, when_set: f32, when_clear: f32| match at(x, y) {
                    Some(code) if (pick(code) >> bit) & 1 == 1 => when_set,
                    Some(_) => when_clear,
                    None => DARK,
                };
                Some((
                    Raster::from_fn(width, height, |x, y| shade(x, y, LIT, DARK)),
                    Raster::from_fn(width, height, |x, y| shade(x, y, DARK, LIT)),
                ))
            })
            .collect::<Vec<_>>()
    };

    InMemorySource {
        white: Some(white),
        blank: Some(blank),
        vertical: render_axis(vertical_bits, |(u, _)| u),
        horizontal: render_axis(horizontal_bits, |(_, v)| v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::layout::Axis;
    use crate::decoder::source::PatternSource;

    #[test]
    fn test_rendered_sequence_shape() {
        let source = render_sequence(5, 3, 4, 2, |x, _| (x > 0).then_some((x as u32, 1)));
        assert_eq!(source.pair_count(Axis::Vertical), 4);
        assert_eq!(source.pair_count(Axis::Horizontal), 2);

        let white = source.white().unwrap();
        assert_eq!(white.get(0, 0), DARK);
        assert_eq!(white.get(1, 0), LIT);

        // column 3 -> gray 0b0010: only the third pair (bit 1) is lit
        let (pattern, inverse) = source.pair(Axis::Vertical, 2).unwrap();
        assert!(pattern.get(3, 1) > inverse.get(3, 1));
        let (pattern, inverse) = source.pair(Axis::Vertical, 3).unwrap();
        assert!(pattern.get(3, 1) < inverse.get(3, 1));
    }
}
