//! Acoustic properties derived from a transfer matrix.

use serde::{Deserialize, Serialize};

use crate::complex::Complex64;
use crate::error::Result;
use crate::frequency::FrequencySet;
use crate::matrix::BinStatus;

/// Per-bin acoustic properties of a sample.
///
/// Impedances are normalized by the characteristic impedance of air `z0`.
/// Bins whose status is not reliable hold NaN values. The record is built
/// once by the analysis stage and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticProperties {
    /// Analysis grid.
    pub frequencies: FrequencySet,
    /// Characteristic impedance of the ambient air ρ₀c₀ (Pa·s/m).
    pub z0: f64,
    /// Reflection coefficient with rigid backing.
    pub reflection: Vec<Complex64>,
    /// Absorption coefficient with rigid backing, 1 − |R|².
    pub absorption: Vec<f64>,
    /// Transmission coefficient with anechoic termination.
    pub transmission: Vec<Complex64>,
    /// Transmission loss −20·log₁₀|t| (dB).
    pub transmission_loss_db: Vec<f64>,
    /// Normalized characteristic impedance z = Z/Z₀ (Re z ≥ 0).
    pub impedance: Vec<Complex64>,
    /// The impedance branch was picked by the zero-real-part tie-break.
    pub impedance_tie: Vec<bool>,
    /// Propagation wavenumber in the sample (rad/m), NaN for zero thickness.
    pub wavenumber: Vec<Complex64>,
    /// Effective density of the sample (kg/m³).
    pub effective_density: Vec<Complex64>,
    /// Effective bulk modulus of the sample (Pa).
    pub effective_bulk_modulus: Vec<Complex64>,
    /// Reliability per bin, carried over from the transfer matrix.
    pub status: Vec<BinStatus>,
}

impl AcousticProperties {
    /// Check that every array has one entry per bin.
    pub fn validate(&self) -> Result<()> {
        let grid = &self.frequencies;
        grid.ensure_len(self.reflection.len(), "reflection")?;
        grid.ensure_len(self.absorption.len(), "absorption")?;
        grid.ensure_len(self.transmission.len(), "transmission")?;
        grid.ensure_len(self.transmission_loss_db.len(), "transmission loss")?;
        grid.ensure_len(self.impedance.len(), "impedance")?;
        grid.ensure_len(self.impedance_tie.len(), "impedance tie")?;
        grid.ensure_len(self.wavenumber.len(), "wavenumber")?;
        grid.ensure_len(self.effective_density.len(), "effective density")?;
        grid.ensure_len(self.effective_bulk_modulus.len(), "effective bulk modulus")?;
        grid.ensure_len(self.status.len(), "status")?;
        Ok(())
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the record has no bins.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Characteristic impedance of bin `index` in Pa·s/m.
    pub fn impedance_absolute(&self, index: usize) -> Complex64 {
        self.impedance[index] * self.z0
    }

    /// Indices of reliable bins violating passivity (α outside [0, 1] or Re z < 0).
    ///
    /// `tolerance` absorbs estimation noise on the bounds.
    pub fn passivity_violations(&self, tolerance: f64) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.status[i].is_reliable())
            .filter(|&i| {
                let alpha = self.absorption[i];
                alpha < -tolerance
                    || alpha > 1.0 + tolerance
                    || self.impedance[i].re < -tolerance
            })
            .collect()
    }

    /// Indices of bins where the impedance branch tie-break applied.
    pub fn tie_bins(&self) -> Vec<usize> {
        self.impedance_tie
            .iter()
            .enumerate()
            .filter_map(|(i, &tie)| tie.then_some(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(absorption: Vec<f64>, impedance: Vec<Complex64>) -> AcousticProperties {
        let frequencies = FrequencySet::new(100.0, 4).unwrap();
        let n = frequencies.len();
        let one = Complex64::new(1.0, 0.0);
        AcousticProperties {
            frequencies,
            z0: 410.0,
            reflection: vec![one; n],
            absorption,
            transmission: vec![one; n],
            transmission_loss_db: vec![0.0; n],
            impedance,
            impedance_tie: vec![false, true, false],
            wavenumber: vec![one; n],
            effective_density: vec![one; n],
            effective_bulk_modulus: vec![one; n],
            status: vec![BinStatus::Reliable; n],
        }
    }

    #[test]
    fn passivity_violations_found() {
        let z = Complex64::new(1.0, -2.0);
        let props = record(vec![0.5, 1.2, 0.3], vec![z, z, Complex64::new(-0.1, 0.0)]);
        assert!(props.validate().is_ok());
        assert_eq!(props.passivity_violations(1e-6), vec![1, 2]);
        assert_eq!(props.passivity_violations(0.5), Vec::<usize>::new());
    }

    #[test]
    fn flagged_bins_are_not_diagnosed() {
        let z = Complex64::new(1.0, 0.0);
        let mut props = record(vec![0.5, 1.2, 0.3], vec![z; 3]);
        props.status[1] = BinStatus::UpstreamIllConditioned;
        assert!(props.passivity_violations(1e-6).is_empty());
    }

    #[test]
    fn tie_bins_and_absolute_impedance() {
        let z = Complex64::new(2.0, -1.0);
        let props = record(vec![0.5; 3], vec![z; 3]);
        assert_eq!(props.tie_bins(), vec![1]);
        assert_eq!(props.impedance_absolute(0), Complex64::new(820.0, -410.0));
    }

    #[test]
    fn validate_names_short_array() {
        let z = Complex64::new(1.0, 0.0);
        let mut props = record(vec![0.5; 3], vec![z; 3]);
        props.transmission_loss_db.pop();
        let err = props.validate().unwrap_err();
        assert!(err.to_string().contains("transmission loss"), "got: {err}");
    }
}
