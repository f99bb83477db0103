//! Common types used throughout the simulator.

mod block;
mod node_id;
mod timestamp;
mod transaction;
mod vote;

use rand_chacha::ChaCha20Rng;

pub use block::{Block, BlockHeader};
pub use node_id::NodeId;
pub use timestamp::Timestamp;
pub use transaction::{Transaction, TransactionError};
pub use vote::{Vote, VoteKind};

/// The RNG used throughout the simulation.
///
/// Always constructed from the configured seed and threaded explicitly into
/// every component that needs randomness; nothing in the simulator draws from
/// an ambient source.
pub type NodeRng = ChaCha20Rng;
