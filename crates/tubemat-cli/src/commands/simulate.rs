//! Synthetic recording command.

use std::path::PathBuf;

use clap::Args;
use tubemat_analysis::SyntheticTube;
use tubemat_config::MeasurementConfig;
use tubemat_core::{Complex64, CylindricalPores, EquivalentFluid, Layer, TwoPort};
use tubemat_io::write_channels;

use super::common::ConfigArg;

/// Channel gains applied with `--mismatch`: a plausible spread of
/// microphone sensitivities and phase errors.
const MISMATCHED_GAINS: [(f64, f64); 4] = [(1.0, 0.0), (1.2, 0.1), (0.8, -0.15), (1.1, 0.3)];

#[derive(Args)]
pub struct SimulateArgs {
    /// Output four-channel WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    config: ConfigArg,

    /// Pore radius in metres of a cylindrical-pore sample (empty tube if omitted)
    #[arg(long)]
    pore_radius: Option<f64>,

    /// Porosity of the cylindrical-pore sample
    #[arg(long, default_value = "0.5")]
    porosity: f64,

    /// Record a through measurement (all microphones see the same field)
    #[arg(long)]
    through: bool,

    /// Apply unequal microphone gains
    #[arg(long)]
    mismatch: bool,
}

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let geometry = config.geometry()?;
    let air = config.air()?;

    match args.pore_radius {
        Some(radius) => {
            if !(radius > 0.0 && args.porosity > 0.0 && args.porosity <= 1.0) {
                anyhow::bail!(
                    "need pore radius > 0 and porosity in (0, 1], got {radius} and {}",
                    args.porosity
                );
            }
            let model = CylindricalPores {
                radius,
                porosity: args.porosity,
            };
            println!(
                "Simulating {:.1} mm sample, pore radius {:.3} mm, porosity {}",
                geometry.thickness * 1e3,
                radius * 1e3,
                args.porosity
            );
            render(&args, &config, Layer::new(model, geometry.thickness))
        }
        None => {
            println!("Simulating empty tube");
            render(
                &args,
                &config,
                Layer::new(EquivalentFluid::of_air(&air), geometry.thickness),
            )
        }
    }
}

fn render<S: TwoPort>(
    args: &SimulateArgs,
    config: &MeasurementConfig,
    sample: S,
) -> anyhow::Result<()> {
    let mut tube = SyntheticTube::new(sample, config.geometry()?, config.air()?)?;
    if args.mismatch {
        tube = tube.with_channel_gains(
            MISMATCHED_GAINS.map(|(gain, phase)| Complex64::from_polar(gain, phase)),
        );
    }

    let stimulus = config.multitone()?;
    let phases = stimulus.random_phases(config.excitation.seed);
    let channels = if args.through {
        tube.render_through(&stimulus, &phases)?
    } else {
        tube.render(&stimulus, &phases)?
    };
    write_channels(&args.output, &channels, 32)?;

    println!(
        "Wrote {:.2}s four-channel {} recording to {}",
        channels.duration_secs(),
        if args.through { "through" } else { "sample" },
        args.output.display()
    );
    Ok(())
}
