/// Per-pixel validity flags gating every decode read
///
/// One byte per pixel (0 or 1) so rows can be handed to separate workers
/// without sharing a storage word across a row boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ValidityMask {
    /// Create an all-invalid mask
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Create an all-valid mask
    pub fn filled(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![1; width * height],
        }
    }

    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Mask width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mask height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Flag at (x, y); out-of-bounds reads are invalid
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[y * self.width + x] != 0
    }

    /// Set flag at (x, y); out-of-bounds writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.data[y * self.width + x] = value as u8;
    }

    /// Invalidate columns `[start, end)` on every row
    pub fn clear_columns(&mut self, start: usize, end: usize) {
        let end = end.min(self.width);
        if start >= end {
            return;
        }
        for row in self.data.chunks_mut(self.width) {
            row[start..end].fill(0);
        }
    }

    /// Number of valid pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Borrow row `y` (0 = invalid)
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Raw flags, row-major
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
