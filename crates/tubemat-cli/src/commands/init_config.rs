//! Default configuration command.

use std::path::PathBuf;

use clap::Args;
use tubemat_config::MeasurementConfig;

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output TOML file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "'{}' already exists (use --force to overwrite)",
            args.output.display()
        );
    }
    MeasurementConfig::default().save(&args.output)?;
    println!("Wrote default configuration to {}", args.output.display());
    Ok(())
}
