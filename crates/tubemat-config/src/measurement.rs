//! Measurement configuration file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tubemat_analysis::{
    DEFAULT_COHERENCE_WARNING, DEFAULT_MAX_CONDITION, MeasurementPipeline, Multitone,
    SpectralEstimator, ToneSpacing, TransferMatrixBuilder, Window,
};
use tubemat_core::{AirProperties, FrequencySet, TubeGeometry};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, Validator};

/// Stimulus and scan settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcitationConfig {
    /// Sample rate of playback and recording (Hz).
    pub sample_rate: u32,
    /// Lowest tone (Hz).
    pub f_low: f64,
    /// Highest tone (Hz).
    pub f_high: f64,
    /// Analysed duration (s), excluding the settle time.
    pub duration_secs: f64,
    /// Leading part of the scan discarded before analysis (s).
    pub settle_secs: f64,
    /// Raised-cosine fade-in (s).
    pub fade_in_secs: f64,
    /// Raised-cosine fade-out (s).
    pub fade_out_secs: f64,
    /// Tone distribution.
    pub spacing: ToneSpacing,
    /// Seed of the phase draw.
    pub seed: u64,
    /// Time allowed for one scan beyond its nominal length (s).
    pub scan_margin_secs: f64,
}

impl Default for ExcitationConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            f_low: 50.0,
            f_high: 3000.0,
            duration_secs: 10.0,
            settle_secs: 1.0,
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
            spacing: ToneSpacing::Linear { step_hz: 1.0 },
            seed: 0,
            scan_margin_secs: 10.0,
        }
    }
}

/// Spectral estimation and matrix solve settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples per analysis block; also the stimulus period.
    pub block_len: usize,
    /// Fraction of overlap between consecutive blocks.
    pub overlap: f64,
    /// Block window.
    pub window: Window,
    /// Wave-matrix condition number above which a bin is flagged.
    pub max_condition: f64,
    /// Coherence below which excited bins are reported.
    pub coherence_warning: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            block_len: 48000,
            overlap: 0.0,
            window: Window::Rectangular,
            max_condition: DEFAULT_MAX_CONDITION,
            coherence_warning: DEFAULT_COHERENCE_WARNING,
        }
    }
}

/// Tube layout. Lengths in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeConfig {
    /// Bore of the upstream section.
    pub bore_upstream: f64,
    /// Bore of the downstream section.
    pub bore_downstream: f64,
    /// Distance between mics 1 and 2.
    pub spacing_upstream: f64,
    /// Distance between mics 3 and 4.
    pub spacing_downstream: f64,
    /// Distance from mic 2 to the sample's front face.
    pub gap_upstream: f64,
    /// Distance from the sample's rear face to mic 3.
    pub gap_downstream: f64,
    /// Sample thickness.
    pub thickness: f64,
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            bore_upstream: 0.030,
            bore_downstream: 0.030,
            spacing_upstream: 0.045,
            spacing_downstream: 0.045,
            gap_upstream: 0.0365,
            gap_downstream: 0.0995,
            thickness: 0.0235,
        }
    }
}

/// Ambient conditions during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    /// Air temperature (°C).
    pub temperature_c: f64,
    /// Static pressure (Pa).
    pub pressure_pa: f64,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            temperature_c: 23.0,
            pressure_pa: 101_300.0,
        }
    }
}

/// Everything needed to run a measurement.
///
/// Every field has a default; a file only needs to list what differs.
///
/// ```toml
/// [excitation]
/// f_high = 2500.0
/// spacing = { kind = "logarithmic", count = 400 }
///
/// [tube]
/// thickness = 0.040
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    /// Stimulus and scan settings.
    pub excitation: ExcitationConfig,
    /// Spectral estimation and matrix solve settings.
    pub analysis: AnalysisConfig,
    /// Tube layout.
    pub tube: TubeConfig,
    /// Ambient conditions.
    pub ambient: AmbientConfig,
}

impl MeasurementConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check ranges and cross-field consistency.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut v = Validator::new();
        let e = &self.excitation;
        let fs = f64::from(e.sample_rate);
        let nyquist = fs / 2.0;

        v.range("excitation.sample_rate", fs, 1000.0, 384_000.0)
            .range("excitation.f_low", e.f_low, f64::MIN_POSITIVE, nyquist)
            .range("excitation.f_high", e.f_high, f64::MIN_POSITIVE, nyquist)
            .check(
                "excitation.f_high",
                e.f_low < e.f_high,
                format!("must exceed f_low ({} Hz)", e.f_low),
            )
            .range("excitation.duration_secs", e.duration_secs, 1e-3, 3600.0)
            .range("excitation.settle_secs", e.settle_secs, 0.0, 600.0)
            .range("excitation.fade_in_secs", e.fade_in_secs, 0.0, f64::MAX)
            .range("excitation.fade_out_secs", e.fade_out_secs, 0.0, f64::MAX)
            .check(
                "excitation.fade_in_secs",
                e.fade_in_secs + e.fade_out_secs <= e.duration_secs + e.settle_secs,
                "fades must fit in the stimulus",
            )
            .range("excitation.scan_margin_secs", e.scan_margin_secs, 0.0, 3600.0);
        match e.spacing {
            ToneSpacing::Linear { step_hz } => {
                v.range("excitation.spacing.step_hz", step_hz, f64::MIN_POSITIVE, nyquist);
            }
            ToneSpacing::Logarithmic { count } => {
                v.range("excitation.spacing.count", count as f64, 2.0, f64::MAX);
            }
        }

        let a = &self.analysis;
        v.range("analysis.block_len", a.block_len as f64, 4.0, 1e7)
            .check(
                "analysis.block_len",
                a.block_len as f64 <= fs * e.duration_secs,
                "a block must fit in the analysed duration",
            )
            .range("analysis.overlap", a.overlap, 0.0, 0.95)
            .range("analysis.max_condition", a.max_condition, 1.0, f64::MAX)
            .range("analysis.coherence_warning", a.coherence_warning, 0.0, 1.0);

        let t = &self.tube;
        for (param, value) in [
            ("tube.bore_upstream", t.bore_upstream),
            ("tube.bore_downstream", t.bore_downstream),
            ("tube.spacing_upstream", t.spacing_upstream),
            ("tube.spacing_downstream", t.spacing_downstream),
        ] {
            v.range(param, value, 1e-4, 10.0);
        }
        for (param, value) in [
            ("tube.gap_upstream", t.gap_upstream),
            ("tube.gap_downstream", t.gap_downstream),
            ("tube.thickness", t.thickness),
        ] {
            v.range(param, value, 0.0, 10.0);
        }

        v.range("ambient.temperature_c", self.ambient.temperature_c, -40.0, 60.0)
            .range("ambient.pressure_pa", self.ambient.pressure_pa, 50_000.0, 120_000.0);

        v.finish()
    }

    /// Sample rate as `f64`.
    pub fn sample_rate(&self) -> f64 {
        f64::from(self.excitation.sample_rate)
    }

    /// Stimulus generator. The period equals the analysis block so every
    /// tone falls on an analysis bin.
    pub fn multitone(&self) -> Result<Multitone, ConfigError> {
        let e = &self.excitation;
        Ok(Multitone::new(
            self.sample_rate(),
            e.f_low,
            e.f_high,
            e.duration_secs + e.settle_secs,
        )?
        .with_period_len(self.analysis.block_len)?
        .with_spacing(e.spacing)?
        .with_fade(e.fade_in_secs, e.fade_out_secs)?)
    }

    /// Spectral estimator.
    pub fn estimator(&self) -> Result<SpectralEstimator, ConfigError> {
        Ok(SpectralEstimator::new(self.analysis.block_len)?
            .with_overlap(self.analysis.overlap)?
            .with_window(self.analysis.window))
    }

    /// Analysis grid.
    pub fn frequencies(&self) -> Result<FrequencySet, ConfigError> {
        Ok(FrequencySet::new(
            self.sample_rate(),
            self.analysis.block_len,
        )?)
    }

    /// Tube layout with circular cross-sections.
    pub fn geometry(&self) -> Result<TubeGeometry, ConfigError> {
        let t = &self.tube;
        let area = |bore: f64| std::f64::consts::PI * bore * bore / 4.0;
        let geometry = TubeGeometry {
            area_upstream: area(t.bore_upstream),
            area_downstream: area(t.bore_downstream),
            spacing_upstream: t.spacing_upstream,
            spacing_downstream: t.spacing_downstream,
            gap_upstream: t.gap_upstream,
            gap_downstream: t.gap_downstream,
            thickness: t.thickness,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Air at the configured conditions.
    pub fn air(&self) -> Result<AirProperties, ConfigError> {
        Ok(AirProperties::from_conditions(
            self.ambient.temperature_c,
            self.ambient.pressure_pa,
        )?)
    }

    /// Transfer matrix builder.
    pub fn builder(&self) -> Result<TransferMatrixBuilder, ConfigError> {
        Ok(TransferMatrixBuilder::new(self.geometry()?, self.air()?)?
            .with_max_condition(self.analysis.max_condition)?)
    }

    /// Full processing pipeline.
    pub fn pipeline(&self) -> Result<MeasurementPipeline, ConfigError> {
        Ok(MeasurementPipeline::new(self.estimator()?, self.builder()?)
            .with_coherence_warning(self.analysis.coherence_warning))
    }

    /// Time allowed for one scan: stimulus length plus margin.
    pub fn scan_timeout(&self) -> Duration {
        let e = &self.excitation;
        Duration::from_secs_f64(e.duration_secs + e.settle_secs + e.scan_margin_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn defaults_are_valid() {
        let config = MeasurementConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.analysis.max_condition, 40.0);
        assert_eq!(config.scan_timeout(), Duration::from_secs(21));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config = MeasurementConfig::from_toml(
            r#"
            [excitation]
            f_high = 2500.0
            spacing = { kind = "logarithmic", count = 400 }

            [analysis]
            window = "hann"
            "#,
        )
        .unwrap();
        assert_eq!(config.excitation.f_high, 2500.0);
        assert_eq!(config.excitation.f_low, 50.0);
        assert_eq!(
            config.excitation.spacing,
            ToneSpacing::Logarithmic { count: 400 }
        );
        assert_eq!(config.analysis.window, Window::Hann);
        assert_eq!(config.tube, TubeConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = MeasurementConfig::default();
        config.tube.thickness = 0.04;
        config.ambient.temperature_c = 19.5;
        let parsed = MeasurementConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn reports_all_problems() {
        let mut config = MeasurementConfig::default();
        config.excitation.f_high = 30_000.0;
        config.analysis.overlap = 0.99;
        config.tube.thickness = -0.01;
        let Err(ValidationError::Multiple(errors)) = config.validate() else {
            panic!("expected several errors");
        };
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn block_longer_than_recording_is_rejected() {
        let mut config = MeasurementConfig::default();
        config.excitation.duration_secs = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn components_follow_config() {
        let mut config = MeasurementConfig::default();
        config.analysis.block_len = 4800;
        config.excitation.spacing = ToneSpacing::Linear { step_hz: 10.0 };

        let multitone = config.multitone().unwrap();
        assert_eq!(multitone.period_len(), 4800);
        assert_eq!(multitone.num_samples(), 11 * 48000);
        assert!(multitone.tone_frequencies().iter().all(|f| f % 10.0 == 0.0));

        let pipeline = config.pipeline().unwrap();
        assert_eq!(pipeline.estimator().block_len(), 4800);
        assert_eq!(pipeline.builder().max_condition(), 40.0);
        assert_eq!(config.frequencies().unwrap().resolution(), 10.0);

        let geometry = config.geometry().unwrap();
        assert_eq!(geometry, TubeGeometry::default());
    }
}
