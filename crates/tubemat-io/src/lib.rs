//! I/O layer for tubemat measurements.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_channels`] and [`write_channels`] for four-channel
//!   scans, [`write_wav`] for the stimulus
//! - **Persistence**: calibration records and result records as TOML
//!   ([`save_calibration`], [`load_calibration_for`], [`save_result`], [`load_result`])
//! - **Export**: [`export_csv`] for plotting tools
//! - **Acquisition**: the [`Acquisition`] trait, a deadline-bound
//!   [`ScanMonitor`], and [`WavReplay`] which replays a recorded scan
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tubemat_io::{Acquisition, ScanControl, WavReplay, load_calibration_for, save_result};
//!
//! let control = ScanControl::new(Duration::from_secs(30));
//! let channels = WavReplay::new("scan.wav").with_settle(1.0).acquire(&stimulus, &control)?;
//! let calibration = load_calibration_for("calibration.toml", &grid)?;
//! let record = pipeline.run(&channels, &calibration)?;
//! save_result("result.toml", &record)?;
//! ```

mod acquisition;
mod export;
mod store;
mod wav;

pub use acquisition::{
    Acquisition, AcquisitionError, ScanControl, ScanMonitor, ScanState, WavReplay,
};
pub use export::{CSV_HEADER, export_csv, write_csv};
pub use store::{
    load_calibration, load_calibration_for, load_result, save_calibration, save_result,
};
pub use wav::{
    WavFormat, WavInfo, WavSpec, read_channels, read_wav, read_wav_info, write_channels,
    write_wav,
};

use std::path::PathBuf;

/// Error types for tubemat I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read or write a record file.
    #[error("failed to access '{path}': {source}")]
    File {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a TOML record.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize a TOML record.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A scan file does not hold the expected number of channels.
    #[error("expected {expected} channels, found {found}")]
    ChannelCount {
        /// Required channel count.
        expected: u16,
        /// Channel count in the file.
        found: u16,
    },

    /// The acquisition did not deliver a complete scan.
    #[error("acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// A loaded or acquired value violates a data-model invariant.
    #[error(transparent)]
    Core(#[from] tubemat_core::Error),
}

impl Error {
    /// Create a file access error.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
