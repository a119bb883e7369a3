//! 2×2 complex linear algebra for per-bin wave decomposition.

use tubemat_core::Complex64;

/// A 2×2 complex matrix, row major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat2 {
    /// `[[m00, m01], [m10, m11]]`.
    pub m: [[Complex64; 2]; 2],
}

impl Mat2 {
    /// Build from rows.
    pub fn new(m00: Complex64, m01: Complex64, m10: Complex64, m11: Complex64) -> Self {
        Self {
            m: [[m00, m01], [m10, m11]],
        }
    }

    /// Determinant.
    pub fn determinant(&self) -> Complex64 {
        self.m[0][0] * self.m[1][1] - self.m[0][1] * self.m[1][0]
    }

    /// Squared Frobenius norm, the sum of squared singular values.
    pub fn frobenius_norm_sqr(&self) -> f64 {
        self.m.iter().flatten().map(|z| z.norm_sqr()).sum()
    }

    /// Spectral condition number σ_max/σ_min; infinite for a singular matrix.
    ///
    /// With `F = ‖M‖²_F` and `δ = |det M|`, `σ²_max = (F + √(F² − 4δ²))/2` and
    /// `σ_max·σ_min = δ`, so the ratio is `σ²_max / δ`.
    pub fn condition_number(&self) -> f64 {
        let det = self.determinant().norm();
        if det == 0.0 || !det.is_finite() {
            return f64::INFINITY;
        }
        let f = self.frobenius_norm_sqr();
        let disc = (f * f - 4.0 * det * det).max(0.0).sqrt();
        0.5 * (f + disc) / det
    }

    /// Solve `M·x = rhs` by Cramer's rule; `None` when singular.
    pub fn solve(&self, rhs: [Complex64; 2]) -> Option<[Complex64; 2]> {
        let det = self.determinant();
        if det.norm() == 0.0 {
            return None;
        }
        let [[a, b], [c, d]] = self.m;
        Some([
            (rhs[0] * d - b * rhs[1]) / det,
            (a * rhs[1] - c * rhs[0]) / det,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn solve_recovers_vector() {
        let m = Mat2::new(c(1.0, 2.0), c(-0.5, 0.0), c(0.3, -1.0), c(2.0, 1.0));
        let x = [c(0.7, -0.2), c(-1.5, 3.0)];
        let rhs = [
            m.m[0][0] * x[0] + m.m[0][1] * x[1],
            m.m[1][0] * x[0] + m.m[1][1] * x[1],
        ];
        let solved = m.solve(rhs).unwrap();
        for (a, b) in solved.iter().zip(x) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn condition_of_diagonal() {
        let m = Mat2::new(c(10.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, -0.5));
        assert!((m.condition_number() - 20.0).abs() < 1e-12);
        let unitary = Mat2::new(c(0.0, 1.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0));
        assert!((unitary.condition_number() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn singular_matrix() {
        let m = Mat2::new(c(1.0, 1.0), c(2.0, 2.0), c(0.5, 0.5), c(1.0, 1.0));
        assert_eq!(m.condition_number(), f64::INFINITY);
        assert!(m.solve([c(1.0, 0.0), c(0.0, 0.0)]).is_none());
    }
}
