//! # Chainsim node
//!
//! Binary entry point for the deterministic consensus simulator. Run with
//! `--help` to see available command-line arguments.

mod cli;
pub mod config;

use structopt::StructOpt;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    // Parse CLI args and run the selected subcommand. A non-zero exit code
    // signals either a fatal configuration error or a run in which the
    // configured blocks did not reach majority finality.
    let opts = Cli::from_args();
    opts.run()
}
