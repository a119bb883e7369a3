//! Stimulus generation command.

use std::path::PathBuf;

use clap::Args;
use tubemat_io::{WavSpec, write_wav};

use super::common::{ConfigArg, parse_bit_depth, stimulus};

#[derive(Args)]
pub struct GenerateArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    config: ConfigArg,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32", value_parser = parse_bit_depth)]
    bit_depth: u16,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let stimulus = stimulus(&config)?;

    let spec = WavSpec {
        channels: 1,
        sample_rate: config.excitation.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    write_wav(&args.output, stimulus.samples(), spec)?;

    println!(
        "Wrote {:.2}s multitone ({:.0}-{:.0} Hz) to {}",
        stimulus.duration_secs(),
        config.excitation.f_low,
        config.excitation.f_high,
        args.output.display()
    );
    Ok(())
}
