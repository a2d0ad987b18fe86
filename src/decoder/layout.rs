use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ReconError, Result};

/// Which projector coordinate a pattern family encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Vertical stripes; encodes the projector column
    Vertical,
    /// Horizontal stripes; encodes the projector row
    Horizontal,
}

impl Axis {
    /// Both axes in decode order
    pub const ALL: [Axis; 2] = [Axis::Vertical, Axis::Horizontal];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Vertical => f.write_str("vertical"),
            Axis::Horizontal => f.write_str("horizontal"),
        }
    }
}

/// File naming of a captured pattern sequence
///
/// Frames are `{prefix}{index:02}.{extension}`. The white and blank
/// references come first, then each axis contributes consecutive
/// `(pattern, inverse)` pairs, most significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceLayout {
    /// File name prefix
    pub prefix: String,
    /// File extension without the dot
    pub extension: String,
    /// Index of the all-on reference
    pub white_index: usize,
    /// Index of the all-off reference
    pub blank_index: usize,
    /// Index of the first vertical pattern
    pub vertical_start: usize,
    /// Number of vertical pairs (bits)
    pub vertical_pairs: usize,
    /// Index of the first horizontal pattern
    pub horizontal_start: usize,
    /// Number of horizontal pairs (bits)
    pub horizontal_pairs: usize,
}

impl Default for SequenceLayout {
    fn default() -> Self {
        Self {
            prefix: "img_".to_string(),
            extension: "exr".to_string(),
            white_index: 0,
            blank_index: 1,
            vertical_start: 2,
            vertical_pairs: 11,
            horizontal_start: 24,
            horizontal_pairs: 11,
        }
    }
}

impl SequenceLayout {
    /// Default layout with another file extension
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            ..Self::default()
        }
    }

    /// File name of frame `index`
    pub fn file_name(&self, index: usize) -> String {
        format!("{}{:02}.{}", self.prefix, index, self.extension)
    }

    /// Full path of frame `index` under `dir`
    pub fn path(&self, dir: &Path, index: usize) -> PathBuf {
        dir.join(self.file_name(index))
    }

    /// Number of pattern pairs for `axis`
    pub fn pair_count(&self, axis: Axis) -> usize {
        match axis {
            Axis::Vertical => self.vertical_pairs,
            Axis::Horizontal => self.horizontal_pairs,
        }
    }

    /// Frame indices `(pattern, inverse)` of pair `pair` on `axis`
    pub fn pair_indices(&self, axis: Axis, pair: usize) -> (usize, usize) {
        let start = match axis {
            Axis::Vertical => self.vertical_start,
            Axis::Horizontal => self.horizontal_start,
        };
        (start + 2 * pair, start + 2 * pair + 1)
    }

    /// Total number of frames in the sequence
    pub fn frame_count(&self) -> usize {
        2 + 2 * (self.vertical_pairs + self.horizontal_pairs)
    }
}

/// Shifts turning decoded code magnitudes into projector pixel coordinates
///
/// The patterns encode a symmetric code: value `2^(bits-1)` falls on the
/// projector center, so the shift per axis is `2^(bits-1) - size/2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterOffsets {
    /// Subtracted from the vertical-axis code to give the projector column
    pub vertical: f64,
    /// Subtracted from the horizontal-axis code to give the projector row
    pub horizontal: f64,
}

impl CenterOffsets {
    /// Explicit offsets
    pub fn new(vertical: f64, horizontal: f64) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    /// Offsets for a `width` x `height` projector driven by codes of the given bit depths
    pub fn from_projector(
        width: u32,
        height: u32,
        vertical_bits: usize,
        horizontal_bits: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ReconError::config("projector resolution must be non-zero"));
        }
        for bits in [vertical_bits, horizontal_bits] {
            if !(1..=31).contains(&bits) {
                return Err(ReconError::config(format!(
                    "pattern bit depth {bits} outside 1..=31"
                )));
            }
        }
        let half_code = |bits: usize| (1u64 << (bits - 1)) as f64;
        Ok(Self {
            vertical: half_code(vertical_bits) - (width / 2) as f64,
            horizontal: half_code(horizontal_bits) - (height / 2) as f64,
        })
    }

    /// Offsets for a projector under `layout`
    pub fn for_layout(width: u32, height: u32, layout: &SequenceLayout) -> Result<Self> {
        Self::from_projector(width, height, layout.vertical_pairs, layout.horizontal_pairs)
    }
}
