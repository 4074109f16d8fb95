mod build;
mod cli;
mod constants;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Test { features, filter } => {
            build::test(features.as_deref(), filter.as_deref())?;
        }
        Commands::Check { target, release } => {
            build::check_all(target.as_deref(), *release)?;
            println!("All targets build!");
        }
        Commands::Doc { open } => {
            build::doc(*open)?;
        }
    }

    Ok(())
}
