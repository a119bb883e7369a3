//! Error types for the measurement pipeline.
//!
//! Only fatal conditions are errors. Numerically singular bins and impedance
//! branch ties are recorded per bin in [`BinStatus`](crate::BinStatus) and the
//! derived property record instead, so a measurement always completes once its
//! inputs are structurally valid.

use thiserror::Error;

/// Errors that abort a measurement.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Two sequences that must be index-aligned have different lengths.
    #[error("{what} length mismatch: expected {expected}, found {found}")]
    LengthMismatch {
        /// Which sequences disagree (e.g. "channel 3", "calibration record").
        what: &'static str,
        /// Length of the reference sequence.
        expected: usize,
        /// Length of the offending sequence.
        found: usize,
    },

    /// Two frequency grids have the same length but different bin spacing.
    #[error("frequency grid mismatch: expected {expected_hz} Hz spacing, found {found_hz} Hz")]
    GridMismatch {
        /// Bin spacing of the measurement grid.
        expected_hz: f64,
        /// Bin spacing of the offending grid.
        found_hz: f64,
    },

    /// The signal is shorter than a single analysis block.
    #[error("insufficient data: {len} samples, block length {block_len}")]
    InsufficientData {
        /// Available samples per channel.
        len: usize,
        /// Required block length.
        block_len: usize,
    },

    /// A construction parameter is outside its valid range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the problem.
        reason: String,
    },
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Create a length mismatch error.
    pub fn length_mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        Error::LengthMismatch {
            what,
            expected,
            found,
        }
    }

    /// Whether this error belongs to the index-alignment family
    /// (unequal channel lengths or disagreeing frequency grids).
    pub fn is_length_mismatch(&self) -> bool {
        matches!(
            self,
            Error::LengthMismatch { .. } | Error::GridMismatch { .. }
        )
    }
}

/// Convenience result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
