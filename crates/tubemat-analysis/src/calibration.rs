//! Channel mismatch correction.

use tracing::debug;
use tubemat_core::{CalibrationRecord, Complex64, Result, TransferFunctionSet};

/// Divide each raw transfer function by its calibration factor.
///
/// The record must have been measured on the same grid: a different bin count
/// or bin spacing is rejected rather than truncated or resampled. Coherence is
/// carried over unchanged.
pub fn calibrate(
    raw: &TransferFunctionSet,
    record: &CalibrationRecord,
) -> Result<TransferFunctionSet> {
    raw.validate()?;
    record.validate()?;
    raw.frequencies
        .ensure_matches(&record.frequencies, "calibration record")?;

    let divide = |h: &[Complex64], c: &[Complex64]| -> Vec<Complex64> {
        h.iter().zip(c).map(|(h, c)| h / c).collect()
    };
    let calibrated = TransferFunctionSet {
        frequencies: raw.frequencies.clone(),
        h21: divide(&raw.h21, &record.c21),
        h31: divide(&raw.h31, &record.c31),
        h41: divide(&raw.h41, &record.c41),
        coherence: raw.coherence.clone(),
    };
    debug!(bins = calibrated.len(), "applied calibration");
    Ok(calibrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubemat_core::{Error, FrequencySet};

    fn raw(grid: &FrequencySet) -> TransferFunctionSet {
        let n = grid.len();
        let h = |k: f64| {
            (0..n)
                .map(|i| Complex64::from_polar(1.0 + 0.1 * i as f64, k * i as f64))
                .collect()
        };
        TransferFunctionSet::new(grid.clone(), h(0.1), h(-0.2), h(0.3)).unwrap()
    }

    #[test]
    fn unity_record_is_identity() {
        let grid = FrequencySet::new(1000.0, 64).unwrap();
        let tf = raw(&grid);
        let out = calibrate(&tf, &CalibrationRecord::unity(grid)).unwrap();
        assert_eq!(out, tf);
    }

    #[test]
    fn divides_out_channel_gain() {
        let grid = FrequencySet::new(1000.0, 16).unwrap();
        let tf = raw(&grid);
        let mut record = CalibrationRecord::unity(grid);
        record.c31 = vec![Complex64::new(0.0, 2.0); record.len()];
        let out = calibrate(&tf, &record).unwrap();
        for i in 0..tf.len() {
            assert!((out.h31[i] * Complex64::new(0.0, 2.0) - tf.h31[i]).norm() < 1e-12);
            assert_eq!(out.h21[i], tf.h21[i]);
        }
    }

    #[test]
    fn one_bin_short_record_is_rejected() {
        let grid = FrequencySet::new(48000.0, 4800).unwrap();
        let record = CalibrationRecord::unity(FrequencySet::new(48000.0, 4798).unwrap());
        let err = calibrate(&raw(&grid), &record).unwrap_err();
        assert!(err.is_length_mismatch());
        assert!(matches!(
            err,
            Error::LengthMismatch {
                what: "calibration record",
                expected: 2401,
                found: 2400
            }
        ));
    }

    #[test]
    fn truncated_factor_array_is_rejected() {
        let grid = FrequencySet::new(1000.0, 16).unwrap();
        let mut record = CalibrationRecord::unity(grid.clone());
        record.c41.pop();
        let err = calibrate(&raw(&grid), &record).unwrap_err();
        assert!(err.is_length_mismatch());
    }
}
