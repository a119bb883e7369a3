//! Calibration store and result records as TOML.
//!
//! Complex values are written as `[re, im]` pairs and the frequency grid as
//! its sample rate and block length, so a reloaded record rebuilds the exact
//! same grid. Floats use shortest round-trip formatting; unreliable bins keep
//! their NaN values as `nan`.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use tubemat_core::{CalibrationRecord, FrequencySet, MeasurementRecord};

use crate::{Error, Result};

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::file(parent, e))?;
    }
    let content = toml::to_string(value)?;
    std::fs::write(path, content).map_err(|e| Error::file(path, e))
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
    Ok(toml::from_str(&content)?)
}

/// Save a calibration record.
pub fn save_calibration(path: impl AsRef<Path>, record: &CalibrationRecord) -> Result<()> {
    let path = path.as_ref();
    record.validate()?;
    write_toml(path, record)?;
    debug!(path = %path.display(), bins = record.len(), "saved calibration record");
    Ok(())
}

/// Load a calibration record and check its internal consistency.
pub fn load_calibration(path: impl AsRef<Path>) -> Result<CalibrationRecord> {
    let record: CalibrationRecord = read_toml(path.as_ref())?;
    record.validate()?;
    Ok(record)
}

/// Load a calibration record for use on `grid`.
///
/// A record measured with another block length or sample rate is rejected
/// here, before any division takes place.
pub fn load_calibration_for(
    path: impl AsRef<Path>,
    grid: &FrequencySet,
) -> Result<CalibrationRecord> {
    let record = load_calibration(path)?;
    grid.ensure_matches(&record.frequencies, "calibration record")?;
    Ok(record)
}

/// Save a measurement result.
pub fn save_result(path: impl AsRef<Path>, record: &MeasurementRecord) -> Result<()> {
    let path = path.as_ref();
    record.validate()?;
    write_toml(path, record)?;
    debug!(path = %path.display(), bins = record.len(), "saved measurement record");
    Ok(())
}

/// Load a measurement result and check that all arrays share its grid.
pub fn load_result(path: impl AsRef<Path>) -> Result<MeasurementRecord> {
    let record: MeasurementRecord = read_toml(path.as_ref())?;
    record.validate()?;
    Ok(record)
}
