//! Analysis frequency grid shared by every per-frequency array.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ordered analysis frequencies of a block-averaged spectrum.
///
/// Bin `i` sits at `i * sample_rate / block_len` Hz, from DC up to Nyquist
/// (`block_len / 2 + 1` bins). Every transfer function, calibration record,
/// transfer matrix and property array of one measurement is indexed against
/// the same grid.
///
/// Serialized as its sample rate and block length only; the bins are rebuilt
/// (and the parameters re-validated) on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridParams", into = "GridParams")]
pub struct FrequencySet {
    sample_rate: f64,
    block_len: usize,
    frequencies: Vec<f64>,
}

impl FrequencySet {
    /// Build the one-sided grid for a block length and sample rate.
    pub fn new(sample_rate: f64, block_len: usize) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::invalid(
                "sample_rate",
                format!("must be positive, got {sample_rate}"),
            ));
        }
        if block_len < 2 {
            return Err(Error::invalid(
                "block_len",
                format!("must be at least 2, got {block_len}"),
            ));
        }
        let resolution = sample_rate / block_len as f64;
        let frequencies = (0..=block_len / 2)
            .map(|i| i as f64 * resolution)
            .collect();
        Ok(Self {
            sample_rate,
            block_len,
            frequencies,
        })
    }

    /// Sample rate of the underlying time series (Hz).
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Block length used for the spectral estimate.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Bin spacing (Hz).
    pub fn resolution(&self) -> f64 {
        self.sample_rate / self.block_len as f64
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the grid has no bins.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency of bin `index` (Hz).
    pub fn frequency(&self, index: usize) -> f64 {
        self.frequencies[index]
    }

    /// All bin frequencies.
    pub fn as_slice(&self) -> &[f64] {
        &self.frequencies
    }

    /// Iterate over bin frequencies.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.frequencies.iter().copied()
    }

    /// Index of the bin nearest to `freq_hz`, if it lies on the grid's span.
    pub fn nearest_bin(&self, freq_hz: f64) -> Option<usize> {
        if !(0.0..=self.sample_rate / 2.0).contains(&freq_hz) {
            return None;
        }
        let index = (freq_hz / self.resolution()).round() as usize;
        (index < self.len()).then_some(index)
    }

    /// Bin index range covering `[f_low, f_high]`, clamped to the grid.
    pub fn band(&self, f_low: f64, f_high: f64) -> std::ops::Range<usize> {
        let resolution = self.resolution();
        let start = (f_low.max(0.0) / resolution).ceil() as usize;
        let end = ((f_high / resolution).floor() as usize + 1).min(self.len());
        start.min(end)..end
    }

    /// Check that `other` has the same number of bins and the same spacing.
    ///
    /// `what` names the other grid's owner for the error message.
    pub fn ensure_matches(&self, other: &FrequencySet, what: &'static str) -> Result<()> {
        if other.len() != self.len() {
            return Err(Error::length_mismatch(what, self.len(), other.len()));
        }
        let expected = self.resolution();
        let found = other.resolution();
        if (expected - found).abs() > 1e-9 * expected {
            return Err(Error::GridMismatch {
                expected_hz: expected,
                found_hz: found,
            });
        }
        Ok(())
    }

    /// Check that a per-bin array has one entry per bin.
    pub fn ensure_len(&self, len: usize, what: &'static str) -> Result<()> {
        if len == self.len() {
            Ok(())
        } else {
            Err(Error::length_mismatch(what, self.len(), len))
        }
    }
}

/// Persisted form of a [`FrequencySet`].
#[derive(Serialize, Deserialize)]
struct GridParams {
    sample_rate: f64,
    block_len: usize,
}

impl TryFrom<GridParams> for FrequencySet {
    type Error = Error;

    fn try_from(params: GridParams) -> Result<Self> {
        FrequencySet::new(params.sample_rate, params.block_len)
    }
}

impl From<FrequencySet> for GridParams {
    fn from(grid: FrequencySet) -> Self {
        Self {
            sample_rate: grid.sample_rate,
            block_len: grid.block_len,
        }
    }
}
