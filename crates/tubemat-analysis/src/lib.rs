//! Tubemat Analysis - four-microphone transfer-matrix processing
//!
//! This crate turns synchronized microphone recordings into acoustic
//! properties of a sample:
//!
//! - [`multitone`] - Random-phase multitone excitation
//! - [`spectral`] - Block-averaged H1 transfer function and coherence estimation
//! - [`calibration`] - Channel mismatch correction from a through measurement
//! - [`transfer_matrix`] - Wave decomposition and two-port matrix per bin
//! - [`properties`] - Transmission loss, reflection, absorption, impedance
//! - [`pipeline`] - The stages chained into one call
//! - [`simulate`] - Synthetic recordings of an analytic sample
//! - [`fft`] - FFT wrapper with windowing functions
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use tubemat_analysis::{MeasurementPipeline, Multitone, SpectralEstimator, TransferMatrixBuilder};
//!
//! // 1. Generate the excitation
//! let stimulus = Multitone::new(48000.0, 50.0, 3000.0, 10.0)?.generate(seed)?;
//!
//! // 2. Acquire four channels (external)
//!
//! // 3. Process against a stored calibration
//! let pipeline = MeasurementPipeline::new(
//!     SpectralEstimator::new(48000)?,
//!     TransferMatrixBuilder::new(geometry, air)?,
//! );
//! let record = pipeline.run(&channels, &calibration)?;
//! ```

pub mod calibration;
pub mod fft;
pub mod linalg;
pub mod multitone;
pub mod pipeline;
pub mod properties;
pub mod simulate;
pub mod spectral;
pub mod transfer_matrix;

pub use calibration::calibrate;
pub use fft::{Fft, Window};
pub use linalg::Mat2;
pub use multitone::{Multitone, ToneSpacing};
pub use pipeline::{DEFAULT_COHERENCE_WARNING, MeasurementPipeline};
pub use properties::{
    PASSIVITY_TOLERANCE, absorption_coefficient, characteristic_impedance, derive_properties,
    reflection_coefficient, sample_wavenumber, transmission_coefficient, transmission_loss_db,
};
pub use simulate::SyntheticTube;
pub use spectral::{REFERENCE_FLOOR, SpectralEstimator};
pub use transfer_matrix::{
    BinSolution, DEFAULT_MAX_CONDITION, TransferMatrixBuilder, WaveAmplitudes, wave_matrix,
};
