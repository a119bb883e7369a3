//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;
use tubemat_config::MeasurementConfig;
use tubemat_core::{ChannelSet, TimeSeries};
use tubemat_io::{Acquisition, ScanControl, WavReplay};

/// `--config` option shared by every measurement command.
#[derive(Args, Debug, Clone)]
pub struct ConfigArg {
    /// Measurement configuration (TOML); defaults apply when omitted
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigArg {
    /// Load and validate the configuration.
    pub fn load(&self) -> anyhow::Result<MeasurementConfig> {
        let config = match &self.config {
            Some(path) => {
                info!(path = %path.display(), "loading configuration");
                MeasurementConfig::load(path)?
            }
            None => MeasurementConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parse a WAV bit depth for clap's `value_parser`.
pub fn parse_bit_depth(s: &str) -> Result<u16, String> {
    match s.parse::<u16>() {
        Ok(bits @ (16 | 24 | 32)) => Ok(bits),
        _ => Err(format!("Invalid bit depth: '{s}' (expected 16, 24 or 32)")),
    }
}

/// The stimulus described by `config`.
pub fn stimulus(config: &MeasurementConfig) -> anyhow::Result<TimeSeries> {
    let multitone = config.multitone()?;
    let samples = multitone.generate(config.excitation.seed)?;
    info!(
        tones = multitone.tone_bins().len(),
        samples = samples.len(),
        "stimulus generated"
    );
    Ok(TimeSeries::new(config.sample_rate(), samples)?)
}

/// Acquire a scan by replaying `recording`.
///
/// The scan is bounded by the configured timeout and can be cancelled with
/// Ctrl+C; either way no partial data is returned.
pub fn acquire(config: &MeasurementConfig, recording: &Path) -> anyhow::Result<ChannelSet> {
    let stimulus = stimulus(config)?;
    let control = ScanControl::new(config.scan_timeout());
    let monitor = control.monitor().clone();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling scan...");
        monitor.cancel();
    })?;

    let mut replay = WavReplay::new(recording).with_settle(config.excitation.settle_secs);
    println!("Acquiring {}...", recording.display());
    let channels = replay.acquire(&stimulus, &control)?;
    println!(
        "  {} frames per channel, {:.2}s analysed",
        channels.len(),
        channels.duration_secs()
    );
    Ok(channels)
}
