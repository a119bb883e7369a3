//! Two-port transfer matrix from calibrated transfer functions.
//!
//! Each straight section carries `p(x) = A·e^{−jkx} + B·e^{jkx}`. Two
//! microphones per section give a 2×2 system for the wave amplitudes; the
//! amplitudes then give pressure and normalized particle velocity
//! `u' = Z₀·u = A·e^{−jkx} − B·e^{jkx}` on both faces of the sample, and the
//! symmetric, reciprocal single-load formulas turn those into T11, T12/Z₀ and
//! T21·Z₀.

use tracing::{debug, warn};
use tubemat_core::{
    AirProperties, BinStatus, Complex64, Error, Position, Result, TransferFunctionSet,
    TransferMatrix, TubeGeometry, TwoPortElements, expj, is_finite, nan,
};

use crate::linalg::Mat2;

/// Default largest acceptable wave-decomposition condition number.
///
/// For a section with microphone spacing `s` the condition number is
/// `max(cot(ks/2), tan(ks/2))` folded over half wavelengths; 40 flags
/// `ks < 0.05` and bins within 0.05 rad of a half-wavelength multiple.
pub const DEFAULT_MAX_CONDITION: f64 = 40.0;

/// Relative size below which the single-load denominator counts as zero.
const DEGENERATE_TOLERANCE: f64 = 1e-9;

/// Forward and backward plane-wave amplitudes in one section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveAmplitudes {
    /// Amplitude of the wave travelling towards +x.
    pub forward: Complex64,
    /// Amplitude of the wave travelling towards −x.
    pub backward: Complex64,
}

impl WaveAmplitudes {
    /// Pressure at `x`.
    pub fn pressure(&self, k: f64, x: Position) -> Complex64 {
        self.forward * expj(-k * x) + self.backward * expj(k * x)
    }

    /// Normalized particle velocity Z₀·u at `x`.
    pub fn velocity(&self, k: f64, x: Position) -> Complex64 {
        self.forward * expj(-k * x) - self.backward * expj(k * x)
    }
}

/// The 2×2 system mapping wave amplitudes to pressures at two positions.
pub fn wave_matrix(k: f64, positions: [Position; 2]) -> Mat2 {
    let [xa, xb] = positions;
    Mat2::new(expj(-k * xa), expj(k * xa), expj(-k * xb), expj(k * xb))
}

/// Result of analysing one frequency bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSolution {
    /// Matrix elements (NaN unless the bin is reliable).
    pub elements: TwoPortElements,
    /// Larger of the two section condition numbers.
    pub condition: f64,
    /// Reliability of the bin.
    pub status: BinStatus,
}

/// Builds a [`TransferMatrix`] for one tube layout and ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferMatrixBuilder {
    geometry: TubeGeometry,
    air: AirProperties,
    max_condition: f64,
}

impl TransferMatrixBuilder {
    /// Builder with the default condition threshold.
    pub fn new(geometry: TubeGeometry, air: AirProperties) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            air,
            max_condition: DEFAULT_MAX_CONDITION,
        })
    }

    /// Largest acceptable condition number of either section's solve.
    pub fn with_max_condition(mut self, max_condition: f64) -> Result<Self> {
        if max_condition.is_nan() || max_condition < 1.0 {
            return Err(Error::invalid(
                "max_condition",
                format!("must be at least 1, got {max_condition}"),
            ));
        }
        self.max_condition = max_condition;
        Ok(self)
    }

    /// Tube layout.
    pub fn geometry(&self) -> &TubeGeometry {
        &self.geometry
    }

    /// Ambient air.
    pub fn air(&self) -> &AirProperties {
        &self.air
    }

    /// Condition threshold.
    pub fn max_condition(&self) -> f64 {
        self.max_condition
    }

    /// Condition numbers of the upstream and downstream decompositions.
    pub fn section_conditions(&self, freq_hz: f64) -> (f64, f64) {
        let k = self.air.wavenumber(freq_hz);
        let [x1, x2, x3, x4] = self.geometry.mic_positions();
        (
            wave_matrix(k, [x1, x2]).condition_number(),
            wave_matrix(k, [x3, x4]).condition_number(),
        )
    }

    /// Analyse one bin given `[H21, H31, H41]` (pressures relative to mic 1).
    pub fn solve_bin(&self, freq_hz: f64, h: [Complex64; 3]) -> BinSolution {
        let k = self.air.wavenumber(freq_hz);
        let [x1, x2, x3, x4] = self.geometry.mic_positions();
        let upstream = wave_matrix(k, [x1, x2]);
        let downstream = wave_matrix(k, [x3, x4]);
        let cond_up = upstream.condition_number();
        let cond_down = downstream.condition_number();
        let condition = cond_up.max(cond_down);

        let flagged = |status| BinSolution {
            elements: TwoPortElements {
                t11: nan(),
                t12_norm: nan(),
                t21_norm: nan(),
            },
            condition,
            status,
        };

        if !h.iter().all(|&z| is_finite(z)) {
            return flagged(BinStatus::MissingData);
        }
        if cond_up > self.max_condition {
            return flagged(BinStatus::UpstreamIllConditioned);
        }
        if cond_down > self.max_condition {
            return flagged(BinStatus::DownstreamIllConditioned);
        }

        let one = Complex64::new(1.0, 0.0);
        let (Some([a, b]), Some([c, d])) =
            (upstream.solve([one, h[0]]), downstream.solve([h[1], h[2]]))
        else {
            return flagged(BinStatus::Degenerate);
        };
        let up = WaveAmplitudes {
            forward: a,
            backward: b,
        };
        let down = WaveAmplitudes {
            forward: c,
            backward: d,
        };

        let thickness = self.geometry.thickness;
        let p0 = up.pressure(k, 0.0);
        let u0 = up.velocity(k, 0.0);
        let pd = down.pressure(k, thickness);
        let ud = down.velocity(k, thickness) * self.geometry.area_ratio();

        let den = p0 * ud + pd * u0;
        let scale = p0.norm() * ud.norm() + pd.norm() * u0.norm();
        let magnitude = den.norm();
        if magnitude.is_nan() || magnitude <= DEGENERATE_TOLERANCE * scale {
            return flagged(BinStatus::Degenerate);
        }

        BinSolution {
            elements: TwoPortElements {
                t11: (pd * ud + p0 * u0) / den,
                t12_norm: (p0 * p0 - pd * pd) / den,
                t21_norm: (u0 * u0 - ud * ud) / den,
            },
            condition,
            status: BinStatus::Reliable,
        }
    }

    /// Build the transfer matrix over the transfer functions' grid.
    ///
    /// Ill-conditioned, degenerate and unexcited bins are annotated and hold
    /// NaN; the remaining bins are unaffected.
    pub fn build(&self, transfer_functions: &TransferFunctionSet) -> Result<TransferMatrix> {
        transfer_functions.validate()?;
        let frequencies = transfer_functions.frequencies.clone();
        let n = frequencies.len();
        let mut matrix = TransferMatrix {
            frequencies,
            t11: Vec::with_capacity(n),
            t12_norm: Vec::with_capacity(n),
            t21_norm: Vec::with_capacity(n),
            condition: Vec::with_capacity(n),
            status: Vec::with_capacity(n),
        };

        let mut counts = [0usize; 5];
        for i in 0..n {
            let freq = matrix.frequencies.frequency(i);
            let bin = self.solve_bin(freq, transfer_functions.at(i));
            counts[status_index(bin.status)] += 1;
            matrix.t11.push(bin.elements.t11);
            matrix.t12_norm.push(bin.elements.t12_norm);
            matrix.t21_norm.push(bin.elements.t21_norm);
            matrix.condition.push(bin.condition);
            matrix.status.push(bin.status);
        }

        let [reliable, upstream, downstream, degenerate, missing] = counts;
        debug!(bins = n, reliable, missing, "built transfer matrix");
        if upstream + downstream + degenerate > 0 {
            warn!(
                upstream,
                downstream,
                degenerate,
                max_condition = self.max_condition,
                "excited bins flagged unreliable"
            );
        }
        Ok(matrix)
    }
}

fn status_index(status: BinStatus) -> usize {
    match status {
        BinStatus::Reliable => 0,
        BinStatus::UpstreamIllConditioned => 1,
        BinStatus::DownstreamIllConditioned => 2,
        BinStatus::Degenerate => 3,
        BinStatus::MissingData => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use tubemat_core::FrequencySet;

    fn builder() -> TransferMatrixBuilder {
        TransferMatrixBuilder::new(TubeGeometry::default(), AirProperties::default()).unwrap()
    }

    /// Pressures of an empty tube carrying only a forward wave.
    fn empty_tube(b: &TransferMatrixBuilder, freq: f64) -> [Complex64; 3] {
        let k = b.air().wavenumber(freq);
        let [x1, x2, x3, x4] = b.geometry().mic_positions();
        let p = |x: f64| expj(-k * x);
        [p(x2) / p(x1), p(x3) / p(x1), p(x4) / p(x1)]
    }

    #[test]
    fn wave_matrix_condition_matches_closed_form() {
        let k = 20.0;
        let s = 0.045;
        let m = wave_matrix(k, [-0.08, -0.08 + s]);
        let c = (k * s).cos().abs();
        let expected = ((1.0 + c) / (1.0 - c)).sqrt();
        assert!((m.condition_number() - expected).abs() < 1e-9 * expected);
        assert!((m.determinant() - 2.0 * tubemat_core::J * (k * s).sin()).norm() < 1e-12);
    }

    #[test]
    fn empty_tube_is_air_slab() {
        let b = builder();
        let d = b.geometry().thickness;
        for freq in [200.0, 1000.0, 2500.0] {
            let bin = b.solve_bin(freq, empty_tube(&b, freq));
            assert_eq!(bin.status, BinStatus::Reliable);
            let kd = b.air().wavenumber(freq) * d;
            let e = bin.elements;
            assert!((e.t11 - kd.cos()).norm() < 1e-10);
            assert!((e.t12_norm - tubemat_core::J * kd.sin()).norm() < 1e-10);
            assert!((e.t21_norm - tubemat_core::J * kd.sin()).norm() < 1e-10);
        }
    }

    #[test]
    fn low_frequencies_are_ill_conditioned() {
        let b = builder();
        let bin = b.solve_bin(20.0, empty_tube(&b, 20.0));
        assert_eq!(bin.status, BinStatus::UpstreamIllConditioned);
        assert!(bin.condition > DEFAULT_MAX_CONDITION);
        assert!(bin.elements.t11.re.is_nan());
    }

    #[test]
    fn half_wavelength_of_downstream_spacing_is_flagged() {
        let geometry = TubeGeometry {
            spacing_downstream: 0.03,
            ..TubeGeometry::default()
        };
        let b = TransferMatrixBuilder::new(geometry, AirProperties::default()).unwrap();
        let c = b.air().speed_of_sound;
        let freq = c / (2.0 * 0.03);
        let (up, down) = b.section_conditions(freq);
        assert!(up < 10.0);
        assert!(down > 1e6);
        let bin = b.solve_bin(freq, empty_tube(&b, freq));
        assert_eq!(bin.status, BinStatus::DownstreamIllConditioned);
    }

    #[test]
    fn missing_data_wins() {
        let b = builder();
        let h = [nan(), Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)];
        assert_eq!(b.solve_bin(20.0, h).status, BinStatus::MissingData);
    }

    #[test]
    fn build_flags_per_bin_and_keeps_others() {
        let b = builder();
        let grid = FrequencySet::new(48000.0, 4800).unwrap();
        let n = grid.len();
        let mut h = [Vec::new(), Vec::new(), Vec::new()];
        for f in grid.iter() {
            let bin = empty_tube(&b, f);
            for (dst, v) in h.iter_mut().zip(bin) {
                dst.push(v);
            }
        }
        let [h21, h31, h41] = h;
        let tf = TransferFunctionSet::new(grid, h21, h31, h41).unwrap();
        let matrix = b.build(&tf).unwrap();
        assert_eq!(matrix.len(), n);
        assert!(matrix.validate().is_ok());
        // DC is singular, 10 Hz too low; 1 kHz reliable
        assert!(!matrix.status[0].is_reliable());
        assert!(!matrix.status[1].is_reliable());
        assert!(matrix.status[100].is_reliable());
        let kd = 2.0 * PI * 1000.0 / b.air().speed_of_sound * b.geometry().thickness;
        assert!((matrix.t11[100] - kd.cos()).norm() < 1e-10);
    }

    #[test]
    fn rejects_bad_threshold() {
        assert!(builder().with_max_condition(0.5).is_err());
        assert!(builder().with_max_condition(f64::NAN).is_err());
        assert_eq!(builder().with_max_condition(100.0).unwrap().max_condition(), 100.0);
    }
}
