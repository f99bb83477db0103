//! # Chainsim node
//!
//! A deterministic discrete-event simulator of a small validator network
//! running a two-phase voting protocol (prevote, precommit) over an
//! unreliable medium that delays, drops, duplicates and rate-limits
//! messages.
//!
//! The core guarantee is safety: finalization requires a strict majority
//! (`2 * count > N`) of precommits for one block hash, so no two conflicting
//! blocks can ever be finalized at the same height, on any pair of nodes.
//! Liveness is best-effort under the configured network conditions; a height
//! that fails to finalize within its step budget is reported as stalled, not
//! as an error.
//!
//! All randomness is drawn from a single seeded generator in a fixed order,
//! so identical (seed, configuration) pairs reproduce byte-identical event
//! logs; the `verify` subcommand checks exactly that.

#![warn(missing_docs)]

pub mod components;
pub mod config;
pub mod crypto;
pub mod event;
pub mod logging;
pub mod simulation;
pub mod types;

pub use config::{Config, ConfigError};
pub use simulation::{Simulation, SimulationReport};
pub use types::NodeRng;
