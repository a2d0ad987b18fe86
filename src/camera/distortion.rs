//! Radial/tangential lens distortion in the OpenCV coefficient layout
//!
//! Coefficients: `k1, k2, p1, p2[, k3[, k4, k5, k6[, s1, s2, s3, s4]]]`.
//! Missing trailing terms are zero. Anything past the twelfth term (tilted
//! sensor models) is ignored.

use log::warn;

/// Number of coefficients the model understands
pub const MAX_COEFFICIENTS: usize = 12;

/// Residual at which the inverse iteration stops early
const CONVERGENCE_EPSILON: f64 = 1e-12;

/// Lens distortion model
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Distortion {
    k: [f64; 6],
    p: [f64; 2],
    s: [f64; 4],
}

impl Distortion {
    /// Build from a coefficient list of any length
    pub fn from_coefficients(coefficients: &[f64]) -> Self {
        if coefficients.len() > MAX_COEFFICIENTS {
            warn!(
                "ignoring {} distortion coefficients beyond the first {}",
                coefficients.len() - MAX_COEFFICIENTS,
                MAX_COEFFICIENTS
            );
        }
        let c = |i: usize| coefficients.get(i).copied().unwrap_or(0.0);
        Self {
            k: [c(0), c(1), c(4), c(5), c(6), c(7)],
            p: [c(2), c(3)],
            s: [c(8), c(9), c(10), c(11)],
        }
    }

    /// True when every coefficient is zero
    pub fn is_identity(&self) -> bool {
        self.k.iter().chain(&self.p).chain(&self.s).all(|&v| v == 0.0)
    }

    /// Ratio `(1 + k1 r² + k2 r⁴ + k3 r⁶) / (1 + k4 r² + k5 r⁴ + k6 r⁶)`
    fn radial(&self, r2: f64) -> (f64, f64) {
        let [k1, k2, k3, k4, k5, k6] = self.k;
        let num = 1.0 + ((k3 * r2 + k2) * r2 + k1) * r2;
        let den = 1.0 + ((k6 * r2 + k5) * r2 + k4) * r2;
        (num, den)
    }

    fn tangential(&self, x: f64, y: f64, r2: f64) -> (f64, f64) {
        let [p1, p2] = self.p;
        let [s1, s2, s3, s4] = self.s;
        let r4 = r2 * r2;
        let dx = 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x) + s1 * r2 + s2 * r4;
        let dy = p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y + s3 * r2 + s4 * r4;
        (dx, dy)
    }

    /// Map an ideal normalized point to its distorted position
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let (num, den) = self.radial(r2);
        let (dx, dy) = self.tangential(x, y, r2);
        let scale = num / den;
        (x * scale + dx, y * scale + dy)
    }

    /// Recover the ideal normalized point from a distorted one
    ///
    /// Fixed-point iteration `x = (x_d - Δx(x)) / radial(x)`, at most
    /// `max_iterations` steps, stopping once re-distorting the estimate lands
    /// within 1e-12 of the input. Strong distortion may not converge; the
    /// last estimate is returned. If the radial ratio turns negative the
    /// iteration is abandoned and the distorted point is returned unchanged.
    pub fn undistort(&self, xd: f64, yd: f64, max_iterations: usize) -> (f64, f64) {
        if self.is_identity() {
            return (xd, yd);
        }

        let (mut x, mut y) = (xd, yd);
        for _ in 0..max_iterations {
            let r2 = x * x + y * y;
            let (num, den) = self.radial(r2);
            let inv_scale = den / num;
            if !inv_scale.is_finite() || inv_scale < 0.0 {
                return (xd, yd);
            }
            let (dx, dy) = self.tangential(x, y, r2);
            x = (xd - dx) * inv_scale;
            y = (yd - dy) * inv_scale;

            let (rx, ry) = self.distort(x, y);
            if (rx - xd).abs() < CONVERGENCE_EPSILON && (ry - yd).abs() < CONVERGENCE_EPSILON {
                break;
            }
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficient_layout() {
        let d = Distortion::from_coefficients(&[0.1, 0.2, 0.01, 0.02, 0.3]);
        assert_eq!(d.k, [0.1, 0.2, 0.3, 0.0, 0.0, 0.0]);
        assert_eq!(d.p, [0.01, 0.02]);
        assert!(Distortion::from_coefficients(&[]).is_identity());
        assert!(Distortion::from_coefficients(&[0.0; 14]).is_identity());
    }

    #[test]
    fn test_undistort_inverts_distort() {
        let d = Distortion::from_coefficients(&[0.12, -0.05, 0.001, -0.0007, 0.01]);
        for &(x, y) in &[(0.0, 0.0), (0.2, -0.1), (-0.35, 0.25), (0.4, 0.3)] {
            let (xd, yd) = d.distort(x, y);
            let (ux, uy) = d.undistort(xd, yd, 50);
            assert!((ux - x).abs() < 1e-9, "x: {ux} vs {x}");
            assert!((uy - y).abs() < 1e-9, "y: {uy} vs {y}");
        }
    }

    #[test]
    fn test_rational_and_thin_prism_terms() {
        let coeffs = [
            0.05, 0.01, 0.0005, 0.0003, 0.0, 0.02, 0.001, 0.0, 0.001, 0.0, -0.001, 0.0,
        ];
        let d = Distortion::from_coefficients(&coeffs);
        let (xd, yd) = d.distort(0.15, 0.1);
        let (ux, uy) = d.undistort(xd, yd, 50);
        assert!((ux - 0.15).abs() < 1e-9);
        assert!((uy - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_negative_radial_ratio_returns_input() {
        // 1 + k1 * r^2 = -9 at r = 1
        let d = Distortion::from_coefficients(&[-10.0]);
        assert_eq!(d.undistort(0.8, 0.6, 20), (0.8, 0.6));
    }

    #[test]
    fn test_non_convergence_returns_last_estimate() {
        let d = Distortion::from_coefficients(&[0.9, 2.0, 0.1, 0.1]);
        let (x, y) = d.undistort(2.0, 1.5, 20);
        assert!(x.is_finite() && y.is_finite());
        assert_ne!((x, y), (2.0, 1.5));
        let (first_x, first_y) = d.undistort(2.0, 1.5, 1);
        assert!(first_x.is_finite() && first_y.is_finite());
        assert!(first_x.abs() < 2.0 && first_y.abs() < 1.5);
    }

    #[test]
    fn test_identity_is_passthrough() {
        let d = Distortion::default();
        assert_eq!(d.undistort(0.3, -0.2, 0), (0.3, -0.2));
        assert_eq!(d.distort(0.3, -0.2), (0.3, -0.2));
    }
}
