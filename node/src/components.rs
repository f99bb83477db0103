//! Components of the simulated chain.
//!
//! Each component exclusively owns its mutable state: the network owns the
//! pending-delivery queue, every validator owns its vote sets and chain.
//! Components never reach into each other; the simulation driver moves data
//! between them.

pub mod consensus;
pub mod execution;
pub mod network;
