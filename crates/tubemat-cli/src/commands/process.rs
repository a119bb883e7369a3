//! Measurement processing command.

use std::path::PathBuf;

use clap::Args;
use tracing::info;
use tubemat_core::BinStatus;
use tubemat_io::{export_csv, load_calibration_for, save_result};

use super::common::{ConfigArg, acquire};

/// Frequencies listed in the summary table.
const SUMMARY_HZ: [f64; 6] = [125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0];

#[derive(Args)]
pub struct ProcessArgs {
    /// Sample measurement (four-channel WAV)
    #[arg(value_name = "RECORDING")]
    input: PathBuf,

    /// Calibration record (TOML) from `tubemat calibrate`
    #[arg(long, value_name = "CALIBRATION")]
    calibration: PathBuf,

    /// Result record to write (TOML)
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Also export the result as CSV
    #[arg(long, value_name = "CSV")]
    csv: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArg,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let pipeline = config.pipeline()?;
    let grid = config.frequencies()?;
    let calibration = load_calibration_for(&args.calibration, &grid)?;
    let channels = acquire(&config, &args.input)?;

    let record = pipeline.run(&channels, &calibration)?;
    let flagged = record
        .properties
        .status
        .iter()
        .filter(|s| !s.is_reliable() && **s != BinStatus::MissingData)
        .count();
    info!(
        bins = record.len(),
        reliable = record.matrix.reliable_count(),
        flagged,
        "measurement processed"
    );

    save_result(&args.output, &record)?;
    println!("Wrote result to {}", args.output.display());
    if let Some(csv) = &args.csv {
        export_csv(&record, csv)?;
        println!("Wrote CSV to {}", csv.display());
    }

    println!("\n{:>8}  {:>8}  {:>8}  {:>10}  status", "f (Hz)", "alpha", "|R|", "TL (dB)");
    let props = &record.properties;
    for freq in SUMMARY_HZ {
        if freq < config.excitation.f_low || freq > config.excitation.f_high {
            continue;
        }
        let Some(i) = record.frequencies.nearest_bin(freq) else {
            continue;
        };
        println!(
            "{:>8.0}  {:>8.3}  {:>8.3}  {:>10.2}  {}",
            record.frequencies.frequency(i),
            props.absorption[i],
            props.reflection[i].norm(),
            props.transmission_loss_db[i],
            props.status[i]
        );
    }
    Ok(())
}
