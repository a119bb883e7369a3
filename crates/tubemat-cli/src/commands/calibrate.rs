//! Calibration command.

use std::path::PathBuf;

use clap::Args;
use tracing::{info, warn};
use tubemat_io::save_calibration;

use super::common::{ConfigArg, acquire};

#[derive(Args)]
pub struct CalibrateArgs {
    /// Through measurement (four-channel WAV)
    #[arg(value_name = "THROUGH")]
    input: PathBuf,

    /// Calibration record to write (TOML)
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    config: ConfigArg,
}

pub fn run(args: CalibrateArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let pipeline = config.pipeline()?;
    let through = acquire(&config, &args.input)?;

    let record = pipeline.calibration_record(&through)?;
    let band = record
        .frequencies
        .band(config.excitation.f_low, config.excitation.f_high);
    let excited = band
        .clone()
        .filter(|&i| record.c21[i].re.is_finite())
        .count();
    if excited == 0 {
        warn!("no excited bin in the configured band");
    }
    let worst_db = band
        .filter(|&i| record.c21[i].re.is_finite())
        .flat_map(|i| [record.c21[i], record.c31[i], record.c41[i]])
        .map(|c| 20.0 * c.norm().log10())
        .fold(0.0f64, |worst, db| if db.abs() > worst.abs() { db } else { worst });
    info!(excited, worst_db, "channel mismatch measured");

    save_calibration(&args.output, &record)?;
    println!(
        "Wrote calibration ({} bins, {excited} excited, largest mismatch {worst_db:+.2} dB) to {}",
        record.len(),
        args.output.display()
    );
    Ok(())
}
