use std::path::{Path, PathBuf};

use super::layout::{Axis, SequenceLayout};
use crate::error::{ReconError, Result};
use crate::io::{ImageRasterLoader, RasterLoader};
use crate::models::Raster;

/// Provider of the rasters of one captured pattern sequence
///
/// Pair `0` of an axis is its most significant bit.
pub trait PatternSource {
    /// Human-readable origin of the sequence, for log messages
    fn describe(&self) -> String;

    /// All-on reference
    fn white(&self) -> Result<Raster>;

    /// All-off reference
    fn blank(&self) -> Result<Raster>;

    /// Number of `(pattern, inverse)` pairs captured for `axis`
    fn pair_count(&self, axis: Axis) -> usize;

    /// Pair `pair` of `axis` as `(pattern, inverse)`
    fn pair(&self, axis: Axis, pair: usize) -> Result<(Raster, Raster)>;
}

/// Sequence stored as numbered files in one directory
#[derive(Debug, Clone)]
pub struct DirectorySource<L = ImageRasterLoader> {
    dir: PathBuf,
    layout: SequenceLayout,
    loader: L,
}

impl DirectorySource<ImageRasterLoader> {
    /// Directory read with the `image`-backed loader
    pub fn new<P: AsRef<Path>>(dir: P, layout: SequenceLayout) -> Self {
        Self::with_loader(dir, layout, ImageRasterLoader)
    }
}

impl<L: RasterLoader> DirectorySource<L> {
    /// Directory read through a custom loader
    pub fn with_loader<P: AsRef<Path>>(dir: P, layout: SequenceLayout, loader: L) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            layout,
            loader,
        }
    }

    /// File naming in use
    pub fn layout(&self) -> &SequenceLayout {
        &self.layout
    }

    fn load(&self, index: usize) -> Result<Raster> {
        self.loader
            .load_grayscale_float(&self.layout.path(&self.dir, index))
    }
}

impl<L: RasterLoader> PatternSource for DirectorySource<L> {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn white(&self) -> Result<Raster> {
        self.load(self.layout.white_index)
    }

    fn blank(&self) -> Result<Raster> {
        self.load(self.layout.blank_index)
    }

    fn pair_count(&self, axis: Axis) -> usize {
        self.layout.pair_count(axis)
    }

    fn pair(&self, axis: Axis, pair: usize) -> Result<(Raster, Raster)> {
        let (pattern, inverse) = self.layout.pair_indices(axis, pair);
        Ok((self.load(pattern)?, self.load(inverse)?))
    }
}

/// Sequence already held in memory
///
/// `None` entries stand for frames that were never captured.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    /// All-on reference
    pub white: Option<Raster>,
    /// All-off reference
    pub blank: Option<Raster>,
    /// Vertical pairs, most significant first
    pub vertical: Vec<Option<(Raster, Raster)>>,
    /// Horizontal pairs, most significant first
    pub horizontal: Vec<Option<(Raster, Raster)>>,
}

impl InMemorySource {
    fn pairs(&self, axis: Axis) -> &[Option<(Raster, Raster)>] {
        match axis {
            Axis::Vertical => &self.vertical,
            Axis::Horizontal => &self.horizontal,
        }
    }
}

impl PatternSource for InMemorySource {
    fn describe(&self) -> String {
        "in-memory sequence".to_string()
    }

    fn white(&self) -> Result<Raster> {
        self.white
            .clone()
            .ok_or_else(|| ReconError::missing_asset("white", "reference not captured"))
    }

    fn blank(&self) -> Result<Raster> {
        self.blank
            .clone()
            .ok_or_else(|| ReconError::missing_asset("blank", "reference not captured"))
    }

    fn pair_count(&self, axis: Axis) -> usize {
        self.pairs(axis).len()
    }

    fn pair(&self, axis: Axis, pair: usize) -> Result<(Raster, Raster)> {
        self.pairs(axis)
            .get(pair)
            .cloned()
            .flatten()
            .ok_or_else(|| {
                ReconError::missing_asset(format!("{axis} pair {pair}"), "pattern not captured")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records requested paths and serves flat rasters
    struct RecordingLoader {
        requested: Mutex<Vec<PathBuf>>,
    }

    impl RasterLoader for RecordingLoader {
        fn load_grayscale_float(&self, path: &Path) -> Result<Raster> {
            self.requested.lock().unwrap().push(path.to_path_buf());
            Ok(Raster::new(2, 2))
        }
    }

    #[test]
    fn test_directory_source_follows_layout() {
        let loader = RecordingLoader {
            requested: Mutex::new(Vec::new()),
        };
        let source = DirectorySource::with_loader("/scan", SequenceLayout::default(), loader);
        source.white().unwrap();
        source.pair(Axis::Horizontal, 3).unwrap();

        let requested = source.loader.requested.lock().unwrap().clone();
        assert_eq!(
            requested,
            vec![
                PathBuf::from("/scan/img_00.exr"),
                PathBuf::from("/scan/img_30.exr"),
                PathBuf::from("/scan/img_31.exr"),
            ]
        );
        assert_eq!(source.pair_count(Axis::Vertical), 11);
    }

    #[test]
    fn test_in_memory_missing_frames() {
        let source = InMemorySource {
            white: Some(Raster::new(1, 1)),
            blank: None,
            vertical: vec![None],
            horizontal: Vec::new(),
        };
        assert!(source.white().is_ok());
        assert!(matches!(source.blank(), Err(ReconError::MissingAsset { .. })));
        assert!(source.pair(Axis::Vertical, 0).is_err());
        assert!(source.pair(Axis::Horizontal, 0).is_err());
        assert_eq!(source.pair_count(Axis::Vertical), 1);
    }
}
