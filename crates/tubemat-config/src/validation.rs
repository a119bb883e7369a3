//! Range and consistency checks for measurement configurations.
//!
//! Checks accumulate into a [`Validator`] so a user editing a file sees every
//! problem at once instead of one per run.

use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted name of the parameter (e.g. `excitation.f_high`).
        param: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Parameters that are individually fine but inconsistent together.
    #[error("invalid format for parameter '{param}': {reason}")]
    InvalidFormat {
        /// Dotted name of the parameter.
        param: String,
        /// Description of the problem.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Collects validation failures.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    /// Empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `min <= value <= max`. NaN always fails.
    pub fn range(&mut self, param: &str, value: f64, min: f64, max: f64) -> &mut Self {
        if !(min..=max).contains(&value) {
            self.errors.push(ValidationError::OutOfRange {
                param: param.to_string(),
                value,
                min,
                max,
            });
        }
        self
    }

    /// Require `condition`, reporting `reason` otherwise.
    pub fn check(&mut self, param: &str, condition: bool, reason: impl Into<String>) -> &mut Self {
        if !condition {
            self.errors.push(ValidationError::InvalidFormat {
                param: param.to_string(),
                reason: reason.into(),
            });
        }
        self
    }

    /// Whether no check has failed so far.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish: one error is returned as is, several as [`ValidationError::Multiple`].
    pub fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_validator_passes() {
        assert_eq!(Validator::new().finish(), Ok(()));
    }

    #[test]
    fn single_failure_is_not_wrapped() {
        let mut v = Validator::new();
        v.range("analysis.overlap", 0.99, 0.0, 0.95);
        assert!(matches!(
            v.finish(),
            Err(ValidationError::OutOfRange { ref param, .. }) if param == "analysis.overlap"
        ));
    }

    #[test]
    fn failures_accumulate() {
        let mut v = Validator::new();
        v.range("a", f64::NAN, 0.0, 1.0)
            .check("b", false, "bad")
            .range("c", 0.5, 0.0, 1.0);
        let err = v.finish().unwrap_err();
        let ValidationError::Multiple(errors) = &err else {
            panic!("expected Multiple, got {err:?}");
        };
        assert_eq!(errors.len(), 2);
        assert!(err.to_string().contains("'b': bad"));
    }
}
