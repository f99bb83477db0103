//! Simulation configuration.
//!
//! Loaded from a TOML file; every value has a sensible default, so a partial
//! (or empty) configuration file is valid. Validation failures are fatal at
//! startup: a simulation never runs on a malformed configuration.

use datasize::DataSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{components::network, logging::LoggingConfig};

/// Errors detected while validating a configuration.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The chain id is empty.
    #[error("chain_id must not be empty")]
    EmptyChainId,

    /// No validators configured.
    #[error("num_nodes must be at least 1")]
    NoNodes,

    /// No blocks to finalize.
    #[error("num_blocks must be at least 1")]
    NoBlocks,

    /// The per-height step budget is zero.
    #[error("step_budget must be at least 1 tick")]
    ZeroStepBudget,

    /// Deliveries cannot be instantaneous.
    #[error("network.min_delay must be at least 1 tick")]
    ZeroMinDelay,

    /// The delay interval is empty.
    #[error("network.min_delay {min} exceeds network.max_delay {max}")]
    DelayBoundsInverted {
        /// Configured minimum delay.
        min: u64,
        /// Configured maximum delay.
        max: u64,
    },

    /// The drop rate is not a probability.
    #[error("network.drop_rate {0} is not a probability in [0, 1]")]
    InvalidDropRate(f64),

    /// The duplicate rate is not a probability.
    #[error("network.duplicate_rate {0} is not a probability in [0, 1]")]
    InvalidDuplicateRate(f64),

    /// The rate limit would block all deliveries.
    #[error("network.rate_limit must be at least 1")]
    ZeroRateLimit,
}

/// Root configuration of a simulation run.
#[derive(Clone, Debug, Deserialize, Serialize, DataSize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// The chain identifier; part of every signing domain.
    pub chain_id: String,
    /// Number of validator nodes.
    pub num_nodes: u8,
    /// Number of blocks the run tries to finalize.
    pub num_blocks: u64,
    /// Number of transactions created and distributed at startup.
    pub num_transactions: u32,
    /// The seed of the single RNG all randomness is drawn from.
    pub seed: u64,
    /// Ticks allotted per height before unfinished nodes are reported stalled.
    pub step_budget: u64,
    /// The network medium.
    pub network: network::Config,
    /// Logging output.
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chain_id: "mainnet".to_string(),
            num_nodes: 4,
            num_blocks: 3,
            num_transactions: 5,
            seed: 0,
            step_budget: 40,
            network: network::Config::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Checks all invariants; any violation is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id.is_empty() {
            return Err(ConfigError::EmptyChainId);
        }
        if self.num_nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        if self.num_blocks == 0 {
            return Err(ConfigError::NoBlocks);
        }
        if self.step_budget == 0 {
            return Err(ConfigError::ZeroStepBudget);
        }
        let network = &self.network;
        if network.min_delay == 0 {
            return Err(ConfigError::ZeroMinDelay);
        }
        if network.min_delay > network.max_delay {
            return Err(ConfigError::DelayBoundsInverted {
                min: network.min_delay,
                max: network.max_delay,
            });
        }
        if !(0.0..=1.0).contains(&network.drop_rate) {
            return Err(ConfigError::InvalidDropRate(network.drop_rate));
        }
        if !(0.0..=1.0).contains(&network.duplicate_rate) {
            return Err(ConfigError::InvalidDuplicateRate(network.duplicate_rate));
        }
        if network.rate_limit == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        Ok(())
    }
}
