//! Ray geometry for triangulation

use nalgebra::{Point3, Vector3};

use crate::error::{ReconError, Result};

/// Below this determinant the two rays are treated as parallel
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// Closest point between two rays `o1 + t1*d1` and `o2 + t2*d2`
///
/// Solves the 2x2 normal equations for `t1`, `t2` and returns the midpoint of
/// the two closest points. Fails with [`ReconError::DegenerateGeometry`] when
/// `|det| < PARALLEL_EPSILON`.
pub fn try_intersect_rays(
    o1: &Point3<f64>,
    d1: &Vector3<f64>,
    o2: &Point3<f64>,
    d2: &Vector3<f64>,
) -> Result<Point3<f64>> {
    let c = o2 - o1;

    let d1_dot_d2 = d1.dot(d2);
    let d1_dot_d1 = d1.dot(d1);
    let d2_dot_d2 = d2.dot(d2);

    let det = d1_dot_d1 * d2_dot_d2 - d1_dot_d2 * d1_dot_d2;
    if det.abs() < PARALLEL_EPSILON {
        return Err(ReconError::DegenerateGeometry { determinant: det });
    }

    let c_dot_d1 = c.dot(d1);
    let c_dot_d2 = c.dot(d2);

    let t1 = (c_dot_d1 * d2_dot_d2 - c_dot_d2 * d1_dot_d2) / det;
    let t2 = (c_dot_d1 * d1_dot_d2 - c_dot_d2 * d1_dot_d1) / det;

    let p1 = o1 + d1 * t1;
    let p2 = o2 + d2 * t2;
    Ok(nalgebra::center(&p1, &p2))
}

/// Like [`try_intersect_rays`], falling back to the midpoint of the origins
/// for parallel rays
pub fn intersect_rays(
    o1: &Point3<f64>,
    d1: &Vector3<f64>,
    o2: &Point3<f64>,
    d2: &Vector3<f64>,
) -> Point3<f64> {
    try_intersect_rays(o1, d1, o2, d2).unwrap_or_else(|_| nalgebra::center(o1, o2))
}
