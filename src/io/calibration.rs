//! Calibration document loading
//!
//! JSON object with optional keys `mtx` (3x3, row-major), `dist` (any
//! length), `basis` (3x3), `origin` (3), `width`, `height`. `basis`
//! defaults to identity and `origin` to zero; `mtx` is required.

use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{ReconError, Result};
use crate::models::CalibrationData;

#[derive(Debug, Deserialize)]
struct CalibrationDocument {
    mtx: Option<[[f64; 3]; 3]>,
    dist: Option<DistortionField>,
    basis: Option<[[f64; 3]; 3]>,
    origin: Option<[f64; 3]>,
    width: Option<u32>,
    height: Option<u32>,
}

/// OpenCV tools save `dist` either flat or as a single-row matrix
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DistortionField {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

impl DistortionField {
    fn into_coefficients(self) -> Vec<f64> {
        match self {
            Self::Flat(v) => v,
            Self::Nested(rows) => rows.into_iter().flatten().collect(),
        }
    }
}

fn matrix_from_rows(rows: [[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_fn(|r, c| rows[r][c])
}

/// Parse a calibration document from JSON text
pub fn parse_calibration(json: &str) -> Result<CalibrationData> {
    let doc: CalibrationDocument = serde_json::from_str(json)
        .map_err(|e| ReconError::config(format!("malformed calibration document: {e}")))?;

    let intrinsics = doc
        .mtx
        .map(matrix_from_rows)
        .ok_or_else(|| ReconError::config("calibration document has no 'mtx' intrinsic matrix"))?;

    let data = CalibrationData {
        intrinsics,
        distortion: doc
            .dist
            .map(DistortionField::into_coefficients)
            .unwrap_or_default(),
        basis: doc.basis.map(matrix_from_rows).unwrap_or_else(Matrix3::identity),
        origin: doc.origin.map(Vector3::from).unwrap_or_else(Vector3::zeros),
        width: doc.width,
        height: doc.height,
    };
    data.validate()?;
    Ok(data)
}

/// Read and parse a calibration file
///
/// Unreadable files are reported as [`ReconError::Config`] since the run
/// cannot proceed without them.
pub fn load_calibration<P: AsRef<Path>>(path: P) -> Result<CalibrationData> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        ReconError::config(format!("cannot read calibration {}: {e}", path.display()))
    })?;
    parse_calibration(&text).map_err(|e| match e {
        ReconError::Config(msg) => ReconError::config(format!("{}: {msg}", path.display())),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_document() {
        let json = r#"{
            "mtx": [[1000.0, 0.0, 960.0], [0.0, 1010.0, 540.0], [0.0, 0.0, 1.0]],
            "dist": [0.1, -0.02, 0.0, 0.0, 0.003],
            "basis": [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]],
            "origin": [1.0, 2.0, 3.0],
            "width": 1920,
            "height": 1080
        }"#;
        let calib = parse_calibration(json).unwrap();
        assert_eq!(calib.intrinsics[(0, 2)], 960.0);
        assert_eq!(calib.intrinsics[(1, 1)], 1010.0);
        assert_eq!(calib.distortion.len(), 5);
        assert_eq!(calib.basis[(0, 2)], 1.0);
        assert_eq!(calib.basis[(2, 0)], -1.0);
        assert_eq!(calib.origin, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(calib.size(), Some((1920, 1080)));
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let json = r#"{"mtx": [[500, 0, 320], [0, 500, 240], [0, 0, 1]], "dist": [[0.1, 0.2, 0.0, 0.0]]}"#;
        let calib = parse_calibration(json).unwrap();
        assert_eq!(calib.basis, Matrix3::identity());
        assert_eq!(calib.origin, Vector3::zeros());
        assert_eq!(calib.distortion, vec![0.1, 0.2, 0.0, 0.0]);
        assert_eq!(calib.size(), None);
    }

    #[test]
    fn test_missing_or_singular_intrinsics() {
        assert!(matches!(
            parse_calibration(r#"{"origin": [0, 0, 0]}"#),
            Err(ReconError::Config(_))
        ));
        assert!(matches!(
            parse_calibration(r#"{"mtx": [[0, 0, 0], [0, 0, 0], [0, 0, 1]]}"#),
            Err(ReconError::Config(_))
        ));
        assert!(matches!(
            parse_calibration("{not json"),
            Err(ReconError::Config(_))
        ));
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let err = load_calibration("/nonexistent/camera.json").unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
        assert!(err.to_string().contains("camera.json"));
    }
}
