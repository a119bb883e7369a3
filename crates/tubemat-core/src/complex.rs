//! Complex helpers with explicit branch selection.

pub use num_complex::Complex64;

/// The imaginary unit.
pub const J: Complex64 = Complex64::new(0.0, 1.0);

/// A square root with the branch that was selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareRoot {
    /// The selected root.
    pub value: Complex64,
    /// Both roots had zero real part and the tie-break rule picked one.
    pub tie_broken: bool,
}

/// Square root on the branch with non-negative real part.
///
/// The two roots of `z` are `w` and `-w`. The root with positive real part is
/// returned. When both roots have a real part of exactly zero (`z` is a
/// negative real number), the root with non-negative imaginary part is
/// returned and `tie_broken` is set. Zero and NaN inputs are returned
/// unchanged without a tie.
///
/// This does not rely on the library's principal-branch convention, which
/// for negative reals depends on the sign of a zero imaginary part.
pub fn sqrt_non_negative_real(z: Complex64) -> SquareRoot {
    let w = z.sqrt();
    if w.re.is_nan() || w.im.is_nan() || (w.re == 0.0 && w.im == 0.0) {
        return SquareRoot {
            value: w,
            tie_broken: false,
        };
    }
    if w.re > 0.0 {
        return SquareRoot {
            value: w,
            tie_broken: false,
        };
    }
    if w.re < 0.0 {
        return SquareRoot {
            value: -w,
            tie_broken: false,
        };
    }
    // Purely imaginary root: keep the one with non-negative imaginary part and
    // normalize a negative zero real part.
    SquareRoot {
        value: Complex64::new(0.0, w.im.abs()),
        tie_broken: true,
    }
}

/// Whether both parts are finite.
pub fn is_finite(z: Complex64) -> bool {
    z.re.is_finite() && z.im.is_finite()
}

/// Complex NaN, used for values of bins flagged unreliable.
pub fn nan() -> Complex64 {
    Complex64::new(f64::NAN, f64::NAN)
}

/// `e^{jθ}`.
pub fn expj(theta: f64) -> Complex64 {
    Complex64::from_polar(1.0, theta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Complex64, b: Complex64) {
        assert!((a - b).norm() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn positive_real_part_selected() {
        let root = sqrt_non_negative_real(Complex64::new(3.0, 4.0));
        assert_close(root.value, Complex64::new(2.0, 1.0));
        assert!(!root.tie_broken);

        let root = sqrt_non_negative_real(Complex64::new(3.0, -4.0));
        assert_close(root.value, Complex64::new(2.0, -1.0));
        assert!(root.value.re > 0.0);
    }

    #[test]
    fn negative_real_axis_takes_positive_imaginary_root() {
        // Both signed zeros of the imaginary part land on the same root.
        for z in [Complex64::new(-4.0, 0.0), Complex64::new(-4.0, -0.0)] {
            let root = sqrt_non_negative_real(z);
            assert!(root.tie_broken, "z = {z}");
            assert_eq!(root.value.re, 0.0);
            assert!(root.value.re.is_sign_positive());
            assert_close(root.value, Complex64::new(0.0, 2.0));
        }
    }

    #[test]
    fn squares_back_to_input() {
        for z in [
            Complex64::new(-1.0, 1e-3),
            Complex64::new(-1.0, -1e-3),
            Complex64::new(0.5, -2.0),
            Complex64::new(-7.0, 0.0),
        ] {
            let root = sqrt_non_negative_real(z).value;
            assert_close(root * root, z);
            assert!(root.re >= 0.0);
        }
    }

    #[test]
    fn just_below_negative_axis_still_positive_real() {
        // Principal sqrt of -1 - 0.001j has a tiny positive real part and
        // negative imaginary part; the selected root must keep Re >= 0.
        let root = sqrt_non_negative_real(Complex64::new(-1.0, -1e-3));
        assert!(root.value.re > 0.0);
        assert!(root.value.im < 0.0);
        assert!(!root.tie_broken);
    }

    #[test]
    fn zero_and_nan_pass_through() {
        let root = sqrt_non_negative_real(Complex64::new(0.0, 0.0));
        assert_eq!(root.value, Complex64::new(0.0, 0.0));
        assert!(!root.tie_broken);

        let root = sqrt_non_negative_real(nan());
        assert!(!is_finite(root.value));
        assert!(!root.tie_broken);
    }

    #[test]
    fn expj_is_unit_phasor() {
        let z = expj(std::f64::consts::FRAC_PI_2);
        assert_close(z, J);
    }
}
