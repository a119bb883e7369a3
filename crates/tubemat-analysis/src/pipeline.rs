//! Single-pass measurement pipeline.

use tracing::{debug, info, warn};
use tubemat_core::{
    AirProperties, CalibrationRecord, ChannelSet, MeasurementRecord, Result, TubeGeometry,
};

use crate::calibration::calibrate;
use crate::properties::derive_properties;
use crate::spectral::SpectralEstimator;
use crate::transfer_matrix::TransferMatrixBuilder;

/// Coherence below which an excited bin is reported.
pub const DEFAULT_COHERENCE_WARNING: f64 = 0.9;

/// Estimate → calibrate → build matrix → derive properties.
///
/// Fatal conditions (misaligned channels, a calibration record on another
/// grid) abort the run with no record. Numerical trouble in individual bins
/// only annotates those bins.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPipeline {
    estimator: SpectralEstimator,
    builder: TransferMatrixBuilder,
    coherence_warning: f64,
}

impl MeasurementPipeline {
    /// Pipeline over an estimator and a matrix builder.
    pub fn new(estimator: SpectralEstimator, builder: TransferMatrixBuilder) -> Self {
        Self {
            estimator,
            builder,
            coherence_warning: DEFAULT_COHERENCE_WARNING,
        }
    }

    /// Report excited bins whose lowest pair coherence falls below `threshold`.
    pub fn with_coherence_warning(mut self, threshold: f64) -> Self {
        self.coherence_warning = threshold;
        self
    }

    /// Spectral estimator.
    pub fn estimator(&self) -> &SpectralEstimator {
        &self.estimator
    }

    /// Transfer matrix builder.
    pub fn builder(&self) -> &TransferMatrixBuilder {
        &self.builder
    }

    /// Tube layout.
    pub fn geometry(&self) -> &TubeGeometry {
        self.builder.geometry()
    }

    /// Ambient air.
    pub fn air(&self) -> &AirProperties {
        self.builder.air()
    }

    /// Turn a through measurement into a calibration record.
    pub fn calibration_record(&self, through: &ChannelSet) -> Result<CalibrationRecord> {
        let raw = self.estimator.estimate(through)?;
        let record = CalibrationRecord::from_transfer_functions(&raw);
        info!(bins = record.len(), "calibration record built");
        Ok(record)
    }

    /// Process one sample measurement.
    pub fn run(
        &self,
        channels: &ChannelSet,
        calibration: &CalibrationRecord,
    ) -> Result<MeasurementRecord> {
        let raw = self.estimator.estimate(channels)?;
        let transfer_functions = calibrate(&raw, calibration)?;

        let incoherent = (0..transfer_functions.len())
            .filter(|&i| transfer_functions.h21[i].re.is_finite())
            .filter(|&i| transfer_functions.min_coherence(i) < self.coherence_warning)
            .count();
        if incoherent > 0 {
            warn!(
                bins = incoherent,
                threshold = self.coherence_warning,
                "low coherence in excited bins"
            );
        }

        let matrix = self.builder.build(&transfer_functions)?;
        let geometry = *self.builder.geometry();
        let air = *self.builder.air();
        let properties = derive_properties(&matrix, &air, &geometry)?;

        let record = MeasurementRecord {
            frequencies: transfer_functions.frequencies.clone(),
            geometry,
            air,
            transfer_functions,
            matrix,
            properties,
        };
        record.validate()?;
        debug!(
            bins = record.len(),
            reliable = record.matrix.reliable_count(),
            "measurement processed"
        );
        Ok(record)
    }
}
