//! Inter-microphone transfer functions and their calibration factors.

use serde::{Deserialize, Serialize};

use crate::complex::Complex64;
use crate::error::Result;
use crate::frequency::FrequencySet;

/// Frequency responses of mics 2, 3 and 4 relative to mic 1.
///
/// `H11` is unity by definition and not stored. Coherence is the
/// magnitude-squared coherence of each pair (1.0 when unknown).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFunctionSet {
    /// Analysis grid.
    pub frequencies: FrequencySet,
    /// H21 = P2/P1.
    pub h21: Vec<Complex64>,
    /// H31 = P3/P1.
    pub h31: Vec<Complex64>,
    /// H41 = P4/P1.
    pub h41: Vec<Complex64>,
    /// Coherence of pairs (2,1), (3,1), (4,1).
    pub coherence: [Vec<f64>; 3],
}

impl TransferFunctionSet {
    /// Build from three responses on `frequencies`, with unit coherence.
    pub fn new(
        frequencies: FrequencySet,
        h21: Vec<Complex64>,
        h31: Vec<Complex64>,
        h41: Vec<Complex64>,
    ) -> Result<Self> {
        let ones = vec![1.0; frequencies.len()];
        let set = Self {
            frequencies,
            h21,
            h31,
            h41,
            coherence: [ones.clone(), ones.clone(), ones],
        };
        set.validate()?;
        Ok(set)
    }

    /// Replace the coherence estimates.
    pub fn with_coherence(mut self, coherence: [Vec<f64>; 3]) -> Result<Self> {
        self.coherence = coherence;
        self.validate()?;
        Ok(self)
    }

    /// Check that every array has one entry per bin.
    pub fn validate(&self) -> Result<()> {
        self.frequencies.ensure_len(self.h21.len(), "H21")?;
        self.frequencies.ensure_len(self.h31.len(), "H31")?;
        self.frequencies.ensure_len(self.h41.len(), "H41")?;
        for coherence in &self.coherence {
            self.frequencies.ensure_len(coherence.len(), "coherence")?;
        }
        Ok(())
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the set has no bins.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// `[H21, H31, H41]` at bin `index`.
    pub fn at(&self, index: usize) -> [Complex64; 3] {
        [self.h21[index], self.h31[index], self.h41[index]]
    }

    /// Lowest coherence of the three pairs at bin `index`.
    pub fn min_coherence(&self, index: usize) -> f64 {
        self.coherence
            .iter()
            .map(|c| c[index])
            .fold(f64::INFINITY, f64::min)
    }
}

/// Complex correction factors from a "through" calibration measurement.
///
/// A measured transfer function is corrected by dividing it by the matching
/// factor. The record is only usable with a measurement on the same grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Grid the factors were measured on.
    pub frequencies: FrequencySet,
    /// Correction for H21.
    pub c21: Vec<Complex64>,
    /// Correction for H31.
    pub c31: Vec<Complex64>,
    /// Correction for H41.
    pub c41: Vec<Complex64>,
}

impl CalibrationRecord {
    /// A record of all-ones factors; applying it changes nothing.
    pub fn unity(frequencies: FrequencySet) -> Self {
        let ones = vec![Complex64::new(1.0, 0.0); frequencies.len()];
        Self {
            frequencies,
            c21: ones.clone(),
            c31: ones.clone(),
            c41: ones,
        }
    }

    /// Take the raw transfer functions of a through measurement as factors.
    ///
    /// In a through measurement every microphone sees the same sound field,
    /// so any deviation of `H_i1` from unity is channel mismatch.
    pub fn from_transfer_functions(through: &TransferFunctionSet) -> Self {
        Self {
            frequencies: through.frequencies.clone(),
            c21: through.h21.clone(),
            c31: through.h31.clone(),
            c41: through.h41.clone(),
        }
    }

    /// Check that every array has one entry per bin.
    pub fn validate(&self) -> Result<()> {
        self.frequencies.ensure_len(self.c21.len(), "calibration C21")?;
        self.frequencies.ensure_len(self.c31.len(), "calibration C31")?;
        self.frequencies.ensure_len(self.c41.len(), "calibration C41")?;
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn grid() -> FrequencySet {
        FrequencySet::new(1000.0, 8).unwrap()
    }

    #[test]
    fn new_rejects_short_arrays() {
        let one = Complex64::new(1.0, 0.0);
        let err = TransferFunctionSet::new(grid(), vec![one; 5], vec![one; 4], vec![one; 5])
            .unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                what: "H31",
                expected: 5,
                found: 4
            }
        );
    }

    #[test]
    fn min_coherence_picks_worst_pair() {
        let one = Complex64::new(1.0, 0.0);
        let set = TransferFunctionSet::new(grid(), vec![one; 5], vec![one; 5], vec![one; 5])
            .unwrap()
            .with_coherence([vec![0.9; 5], vec![0.5; 5], vec![0.99; 5]])
            .unwrap();
        assert_eq!(set.min_coherence(2), 0.5);
    }

    #[test]
    fn unity_record_is_all_ones() {
        let record = CalibrationRecord::unity(grid());
        assert_eq!(record.len(), 5);
        assert!(record.c41.iter().all(|c| *c == Complex64::new(1.0, 0.0)));
        assert!(record.validate().is_ok());
    }
}
