use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the host test suite
    Test {
        #[arg(long)]
        features: Option<String>,

        /// Only run tests whose name contains this string
        filter: Option<String>,
    },
    /// Build the library for every bare-metal target and feature set
    Check {
        /// Check a single target instead of all of them
        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        release: bool,
    },
    /// Build the API documentation
    Doc {
        #[arg(long)]
        open: bool,
    },
}
