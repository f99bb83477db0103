//! Command-line option parsing.
//!
//! All tuning happens via the TOML configuration file (see
//! [`config`](../config/index.html)); the command line only selects what to
//! do with it.

use std::path::PathBuf;

use anyhow::bail;
use structopt::StructOpt;
use tracing::info;

use chainsim_node::{logging, Config, Simulation};

use crate::config;

/// Deterministic validator-network consensus simulator.
#[derive(Debug, StructOpt)]
pub enum Cli {
    /// Runs the simulation described by the given configuration file.
    ///
    /// Exits with 0 iff every configured block was finalized by a strict
    /// majority of nodes.
    Run {
        /// Path to the TOML configuration file.
        config: PathBuf,

        /// Write the JSON event log to this path after the run.
        #[structopt(short, long)]
        log_file: Option<PathBuf>,
    },
    /// Runs the configured simulation twice and verifies that both runs
    /// produce byte-identical event logs and final states.
    Verify {
        /// Path to the TOML configuration file.
        config: PathBuf,
    },
    /// Prints a default configuration file to stdout.
    GenerateConfig,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Cli::Run { config, log_file } => {
                let config: Config = config::load_from_file(config)?;
                logging::init_with_config(&config.logging)?;

                let mut simulation = Simulation::new(config)?;
                let report = simulation.run();
                if let Some(path) = log_file {
                    simulation.events().write_json(&path)?;
                    info!(path = %path.display(), "event log written");
                }

                println!("{}", report);
                if !report.succeeded() {
                    bail!("not every block was finalized by a majority of nodes");
                }
                Ok(())
            }
            Cli::Verify { config } => {
                let config: Config = config::load_from_file(config)?;
                logging::init_with_config(&config.logging)?;

                let first = run_once(config.clone())?;
                let second = run_once(config)?;

                if first.log_digest != second.log_digest {
                    bail!(
                        "determinism violated: log digests differ ({} vs {})",
                        first.log_digest.to_hex(),
                        second.log_digest.to_hex()
                    );
                }
                if first.node_heights != second.node_heights
                    || first.state_commitments != second.state_commitments
                {
                    bail!("determinism violated: final per-height states differ");
                }
                println!(
                    "deterministic: two runs produced identical logs ({})",
                    first.log_digest.to_hex()
                );
                Ok(())
            }
            Cli::GenerateConfig => {
                println!("{}", config::to_string(&Config::default())?);
                Ok(())
            }
        }
    }
}

fn run_once(config: Config) -> anyhow::Result<chainsim_node::SimulationReport> {
    let mut simulation = Simulation::new(config)?;
    Ok(simulation.run())
}
