//! Measurement configuration for tubemat.
//!
//! A run is described by one TOML file with four sections:
//!
//! - **`[excitation]`**: stimulus band, duration, settle time, tone spacing, seed
//! - **`[analysis]`**: block length, overlap, window, condition threshold
//! - **`[tube]`**: bores, microphone spacings and gaps, sample thickness
//! - **`[ambient]`**: temperature and static pressure
//!
//! Missing fields take the reference apparatus defaults. After
//! [`MeasurementConfig::validate`], the accessors build the analysis
//! components directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use tubemat_config::MeasurementConfig;
//!
//! let config = MeasurementConfig::load("measurement.toml").unwrap();
//! config.validate().unwrap();
//! let pipeline = config.pipeline().unwrap();
//! let stimulus = config.multitone().unwrap().generate(config.excitation.seed).unwrap();
//! ```

mod error;
mod measurement;

/// Range and consistency checks.
pub mod validation;

pub use error::ConfigError;
pub use measurement::{
    AmbientConfig, AnalysisConfig, ExcitationConfig, MeasurementConfig, TubeConfig,
};
pub use validation::{ValidationError, ValidationResult, Validator};
