//! Complete result of one measurement.

use serde::{Deserialize, Serialize};

use crate::air::AirProperties;
use crate::error::Result;
use crate::frequency::FrequencySet;
use crate::geometry::TubeGeometry;
use crate::matrix::TransferMatrix;
use crate::properties::AcousticProperties;
use crate::transfer::TransferFunctionSet;

/// Everything a measurement produces, ready to persist.
///
/// All per-frequency members are indexed against `frequencies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Analysis grid shared by every member.
    pub frequencies: FrequencySet,
    /// Tube layout the measurement was taken with.
    pub geometry: TubeGeometry,
    /// Ambient air at measurement time.
    pub air: AirProperties,
    /// Calibrated transfer functions.
    pub transfer_functions: TransferFunctionSet,
    /// Sample transfer matrix.
    pub matrix: TransferMatrix,
    /// Derived acoustic properties.
    pub properties: AcousticProperties,
}

impl MeasurementRecord {
    /// Check that every member is well formed and shares the record's grid.
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        self.frequencies
            .ensure_matches(&self.transfer_functions.frequencies, "transfer functions")?;
        self.frequencies
            .ensure_matches(&self.matrix.frequencies, "transfer matrix")?;
        self.frequencies
            .ensure_matches(&self.properties.frequencies, "acoustic properties")?;
        self.transfer_functions.validate()?;
        self.matrix.validate()?;
        self.properties.validate()
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
