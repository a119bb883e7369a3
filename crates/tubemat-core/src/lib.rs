//! Tubemat Core - data model for four-microphone impedance tube analysis
//!
//! This crate holds the values that flow through a transfer-matrix
//! measurement, plus the physical primitives needed to interpret them. The
//! numeric stages themselves live in `tubemat-analysis`.
//!
//! # Data Model
//!
//! - [`ChannelSet`] / [`TimeSeries`] - Four synchronized microphone signals
//! - [`FrequencySet`] - Analysis grid shared by every per-frequency array
//! - [`TransferFunctionSet`] - H21, H31, H41 with coherence
//! - [`CalibrationRecord`] - Correction factors from a through measurement
//! - [`TransferMatrix`] - Normalized two-port elements with per-bin [`BinStatus`]
//! - [`AcousticProperties`] - Reflection, absorption, transmission, impedance
//! - [`MeasurementRecord`] - The complete persisted result
//!
//! # Physics
//!
//! - [`AirProperties`] - Ambient air (dry-air ideal gas)
//! - [`TubeGeometry`] - Microphone and sample positions, section areas
//! - [`EquivalentFluid`], [`CylindricalPores`], [`Layer`] - Analytic materials
//! - [`sqrt_non_negative_real`] - Impedance branch selection with explicit tie-break
//!
//! # Conventions
//!
//! Time dependence is `e^{jωt}`; a wave travelling towards the sample is
//! `A·e^{−jkx}`. T12 is stored divided by Z₀ and T21 multiplied by Z₀, so all
//! matrix elements are dimensionless.
//!
//! # Errors
//!
//! Only fatal conditions (misaligned lengths or grids, invalid parameters)
//! are [`Error`]s. Ill-conditioned bins are annotated, not rejected.

pub mod air;
pub mod channels;
pub mod complex;
pub mod error;
pub mod frequency;
pub mod geometry;
pub mod material;
pub mod matrix;
pub mod properties;
pub mod record;
pub mod transfer;

// Re-export main types at crate root
pub use air::{AirProperties, DRY_AIR_GAS_CONSTANT, STANDARD_PRESSURE, ZERO_CELSIUS_K};
pub use channels::{ChannelSet, MIC_COUNT, TimeSeries};
pub use complex::{Complex64, J, SquareRoot, expj, is_finite, nan, sqrt_non_negative_real};
pub use error::{Error, Result};
pub use frequency::FrequencySet;
pub use geometry::{Position, TubeGeometry};
pub use material::{CylindricalPores, EquivalentFluid, FluidModel, Layer, bessel_j1_over_j0};
pub use matrix::{BinStatus, TransferMatrix, TwoPort, TwoPortElements};
pub use properties::AcousticProperties;
pub use record::MeasurementRecord;
pub use transfer::{CalibrationRecord, TransferFunctionSet};
