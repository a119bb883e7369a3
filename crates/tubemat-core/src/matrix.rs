//! Two-port transfer matrix of a sample.

use serde::{Deserialize, Serialize};

use crate::air::AirProperties;
use crate::complex::Complex64;
use crate::error::Result;
use crate::frequency::FrequencySet;

/// Reliability of one frequency bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinStatus {
    /// All solves were well conditioned.
    Reliable,
    /// The upstream wave decomposition exceeded the condition threshold.
    UpstreamIllConditioned,
    /// The downstream wave decomposition exceeded the condition threshold.
    DownstreamIllConditioned,
    /// The interface quantities made the matrix expressions singular.
    Degenerate,
    /// An input transfer function was not finite (no excitation in this bin).
    MissingData,
}

impl BinStatus {
    /// Whether values in this bin can be trusted.
    pub fn is_reliable(self) -> bool {
        self == BinStatus::Reliable
    }

    /// Snake-case label, as used in persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            BinStatus::Reliable => "reliable",
            BinStatus::UpstreamIllConditioned => "upstream_ill_conditioned",
            BinStatus::DownstreamIllConditioned => "downstream_ill_conditioned",
            BinStatus::Degenerate => "degenerate",
            BinStatus::MissingData => "missing_data",
        }
    }
}

impl std::fmt::Display for BinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized elements of a symmetric, reciprocal two-port at one frequency.
///
/// `[p₀, u₀]ᵀ = T·[p_d, u_d]ᵀ` relates pressure and particle velocity at the
/// sample's front face to those at its rear face. T22 equals T11.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPortElements {
    /// T11 (dimensionless).
    pub t11: Complex64,
    /// T12 / Z₀.
    pub t12_norm: Complex64,
    /// T21 · Z₀.
    pub t21_norm: Complex64,
}

/// A sample whose transfer matrix is known analytically.
pub trait TwoPort {
    /// Normalized matrix elements at `freq_hz` in air `air`.
    fn elements(&self, freq_hz: f64, air: &AirProperties) -> TwoPortElements;
}

/// Transfer matrix of a sample over a frequency grid.
///
/// Bins whose status is not [`BinStatus::Reliable`] hold NaN elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferMatrix {
    /// Analysis grid.
    pub frequencies: FrequencySet,
    /// T11.
    pub t11: Vec<Complex64>,
    /// T12 / Z₀.
    pub t12_norm: Vec<Complex64>,
    /// T21 · Z₀.
    pub t21_norm: Vec<Complex64>,
    /// Larger of the two wave-decomposition condition numbers per bin.
    pub condition: Vec<f64>,
    /// Reliability per bin.
    pub status: Vec<BinStatus>,
}

impl TransferMatrix {
    /// Evaluate an analytic two-port on `frequencies`.
    pub fn from_two_port(
        frequencies: FrequencySet,
        sample: &impl TwoPort,
        air: &AirProperties,
    ) -> Self {
        let n = frequencies.len();
        let mut t11 = Vec::with_capacity(n);
        let mut t12_norm = Vec::with_capacity(n);
        let mut t21_norm = Vec::with_capacity(n);
        for freq in frequencies.iter() {
            let e = sample.elements(freq, air);
            t11.push(e.t11);
            t12_norm.push(e.t12_norm);
            t21_norm.push(e.t21_norm);
        }
        Self {
            frequencies,
            t11,
            t12_norm,
            t21_norm,
            condition: vec![1.0; n],
            status: vec![BinStatus::Reliable; n],
        }
    }

    /// Check that every array has one entry per bin.
    pub fn validate(&self) -> Result<()> {
        self.frequencies.ensure_len(self.t11.len(), "T11")?;
        self.frequencies.ensure_len(self.t12_norm.len(), "T12")?;
        self.frequencies.ensure_len(self.t21_norm.len(), "T21")?;
        self.frequencies.ensure_len(self.condition.len(), "condition")?;
        self.frequencies.ensure_len(self.status.len(), "status")?;
        Ok(())
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the matrix has no bins.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Elements at bin `index`.
    pub fn at(&self, index: usize) -> TwoPortElements {
        TwoPortElements {
            t11: self.t11[index],
            t12_norm: self.t12_norm[index],
            t21_norm: self.t21_norm[index],
        }
    }

    /// Number of reliable bins.
    pub fn reliable_count(&self) -> usize {
        self.status.iter().filter(|s| s.is_reliable()).count()
    }

    /// Determinant T11·T22 − T12·T21 at bin `index`; unity for a reciprocal sample.
    pub fn determinant(&self, index: usize) -> Complex64 {
        let e = self.at(index);
        e.t11 * e.t11 - e.t12_norm * e.t21_norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::J;

    /// A slab of the tube's own air: T11 = cos kd, T12/Z₀ = T21·Z₀ = j sin kd.
    struct AirSlab(f64);

    impl TwoPort for AirSlab {
        fn elements(&self, freq_hz: f64, air: &AirProperties) -> TwoPortElements {
            let kd = air.wavenumber(freq_hz) * self.0;
            TwoPortElements {
                t11: Complex64::new(kd.cos(), 0.0),
                t12_norm: J * kd.sin(),
                t21_norm: J * kd.sin(),
            }
        }
    }

    #[test]
    fn analytic_matrix_is_reciprocal() {
        let grid = FrequencySet::new(48000.0, 480).unwrap();
        let matrix = TransferMatrix::from_two_port(grid, &AirSlab(0.05), &AirProperties::default());
        assert!(matrix.validate().is_ok());
        assert_eq!(matrix.reliable_count(), matrix.len());
        for i in 0..matrix.len() {
            assert!((matrix.determinant(i) - 1.0).norm() < 1e-12);
        }
    }

    #[test]
    fn only_reliable_status_is_trusted() {
        assert!(BinStatus::Reliable.is_reliable());
        assert!(!BinStatus::UpstreamIllConditioned.is_reliable());
    }
}
