use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use serde::{Deserialize, Serialize};

/// The identifier of a validator node, unique within a simulation.
///
/// Nodes are processed in `NodeId` order wherever an ordering matters, so the
/// identifier doubles as the deterministic tie-breaker of the whole system.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, DataSize,
)]
pub struct NodeId(pub u8);

impl NodeId {
    /// Returns the underlying index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

impl From<u8> for NodeId {
    fn from(id: u8) -> Self {
        NodeId(id)
    }
}
