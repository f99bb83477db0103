use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use serde::{Deserialize, Serialize};

use chainsim_hashing::{hash_canonical, Digest};

use super::{NodeId, Timestamp, Transaction};

/// The header of a block. Immutable once created; its canonical hash is the
/// block's identity, the value prevotes and precommits refer to.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, DataSize)]
pub struct BlockHeader {
    height: u64,
    parent_hash: Digest,
    state_root: Digest,
    tx_root: Digest,
    proposer: NodeId,
    timestamp: Timestamp,
}

impl BlockHeader {
    /// The canonical hash of this header, and thereby of the block.
    pub fn hash(&self) -> Digest {
        hash_canonical(self).expect("failed to serialize block header")
    }

    /// The block's position in the chain.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// The hash of the preceding block, or [`Digest::GENESIS`] at height 1.
    pub fn parent_hash(&self) -> Digest {
        self.parent_hash
    }

    /// The state commitment after applying this block's transactions.
    pub fn state_root(&self) -> Digest {
        self.state_root
    }

    /// The root over the ordered transaction hashes.
    pub fn tx_root(&self) -> Digest {
        self.tx_root
    }

    /// The validator that proposed this block.
    pub fn proposer(&self) -> NodeId {
        self.proposer
    }

    /// The tick at which this block was proposed.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// A proposed block: header plus the ordered transaction batch.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, DataSize)]
pub struct Block {
    header: BlockHeader,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Assembles a new block; the transaction root is computed from the batch.
    pub fn new(
        height: u64,
        parent_hash: Digest,
        state_root: Digest,
        proposer: NodeId,
        timestamp: Timestamp,
        transactions: Vec<Transaction>,
    ) -> Self {
        let tx_root = Block::compute_tx_root(&transactions);
        Block {
            header: BlockHeader {
                height,
                parent_hash,
                state_root,
                tx_root,
                proposer,
                timestamp,
            },
            transactions,
        }
    }

    /// The root over an ordered transaction batch: the canonical hash of the
    /// list of transaction hashes. Order matters.
    pub fn compute_tx_root(transactions: &[Transaction]) -> Digest {
        let hashes: Vec<Digest> = transactions.iter().map(Transaction::hash).collect();
        hash_canonical(&hashes).expect("failed to serialize transaction hashes")
    }

    /// True iff the header's transaction root matches the carried batch.
    pub fn has_valid_tx_root(&self) -> bool {
        self.header.tx_root == Block::compute_tx_root(&self.transactions)
    }

    /// The block's identity: the canonical hash of its header.
    pub fn hash(&self) -> Digest {
        self.header.hash()
    }

    /// The block header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// The block's position in the chain.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// The ordered transaction batch.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "block(height={}, hash={}, {} transactions)",
            self.header.height,
            self.hash(),
            self.transactions.len()
        )
    }
}
