use nalgebra::Point3;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{ReconError, Result};

/// Ordered, append-only collection of triangulated points
///
/// Order follows the match list that produced the points; compare clouds as
/// sets, not sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point3<f64>>,
}

impl PointCloud {
    /// Empty cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Empty cloud with room for `capacity` points
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append one point
    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    /// Append a batch of points, keeping their order
    pub fn extend(&mut self, points: impl IntoIterator<Item = Point3<f64>>) {
        self.points.extend(points);
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point has been added
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Borrow the points in insertion order
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Iterate the points
    pub fn iter(&self) -> std::slice::Iter<'_, Point3<f64>> {
        self.points.iter()
    }

    /// Drop points with any non-finite coordinate; returns how many were removed
    pub fn retain_finite(&mut self) -> usize {
        let before = self.points.len();
        self.points
            .retain(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
        before - self.points.len()
    }

    /// Keep only points with `min <= z <= max`; returns how many were removed
    pub fn retain_z_range(&mut self, min: f64, max: f64) -> usize {
        let before = self.points.len();
        self.points.retain(|p| p.z >= min && p.z <= max);
        before - self.points.len()
    }

    /// Render as ASCII PLY (`x y z` per vertex, single-precision)
    pub fn to_ply_string(&self) -> String {
        let mut out = String::with_capacity(128 + self.points.len() * 32);
        out.push_str("ply\n");
        out.push_str("format ascii 1.0\n");
        let _ = writeln!(out, "element vertex {}", self.points.len());
        out.push_str("property float x\n");
        out.push_str("property float y\n");
        out.push_str("property float z\n");
        out.push_str("end_header\n");
        for p in &self.points {
            let _ = writeln!(out, "{} {} {}", p.x as f32, p.y as f32, p.z as f32);
        }
        out
    }

    /// Write ASCII PLY to `path`
    pub fn write_ply<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_ply_string()).map_err(|e| ReconError::io(path, e))
    }

    /// Parse ASCII PLY vertices written by [`PointCloud::write_ply`]
    ///
    /// Everything up to `end_header` is skipped; rows with fewer than three
    /// numeric fields are ignored.
    pub fn parse_ply(text: &str) -> Self {
        let mut cloud = Self::new();
        let mut lines = text.lines();
        for line in lines.by_ref() {
            if line.trim() == "end_header" {
                break;
            }
        }
        for line in lines {
            let mut fields = line.split_whitespace().map(str::parse::<f64>);
            if let (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) =
                (fields.next(), fields.next(), fields.next())
            {
                cloud.push(Point3::new(x, y, z));
            }
        }
        cloud
    }

    /// Load an ASCII PLY file
    pub fn read_ply<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?;
        Ok(Self::parse_ply(&text))
    }
}

impl FromIterator<Point3<f64>> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3<f64>;
    type IntoIter = std::slice::Iter<'a, Point3<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
