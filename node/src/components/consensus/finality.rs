//! The append-only finality ledger: one record per height, never mutated.

use std::collections::BTreeMap;

use datasize::DataSize;
use thiserror::Error;

use chainsim_hashing::Digest;

use crate::types::Block;

/// A second, different hash was recorded at an already finalized height.
/// This can only happen if the strict-majority safety argument was broken;
/// it is never a recoverable protocol condition.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("conflicting finality record at height {height}: {recorded} vs {conflicting}")]
pub(crate) struct SafetyViolation {
    pub(crate) height: u64,
    pub(crate) recorded: Digest,
    pub(crate) conflicting: Digest,
}

/// A node's finalized chain: the ground truth it has committed to.
#[derive(Clone, Debug, Default, DataSize)]
pub(crate) struct FinalityLedger {
    /// Height to finalized block hash; written exactly once per height.
    records: BTreeMap<u64, Digest>,
    /// The finalized blocks, in height order.
    blocks: Vec<Block>,
}

impl FinalityLedger {
    /// The height this node expects to finalize next.
    pub(crate) fn expected_height(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }

    /// The number of finalized blocks.
    pub(crate) fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// The hash of the latest finalized block, or [`Digest::GENESIS`] if the
    /// chain is empty.
    pub(crate) fn head_hash(&self) -> Digest {
        self.blocks
            .last()
            .map(Block::hash)
            .unwrap_or(Digest::GENESIS)
    }

    /// The recorded hash at a height, if that height is finalized.
    pub(crate) fn finalized_hash(&self, height: u64) -> Option<Digest> {
        self.records.get(&height).copied()
    }

    /// The finalized blocks in height order.
    pub(crate) fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a finality record. Recording the same hash again is a no-op;
    /// recording a different hash at a finalized height is a safety violation
    /// and leaves the ledger untouched.
    pub(crate) fn record(&mut self, block: Block) -> Result<(), SafetyViolation> {
        let height = block.height();
        let block_hash = block.hash();
        if let Some(recorded) = self.records.get(&height) {
            if *recorded != block_hash {
                return Err(SafetyViolation {
                    height,
                    recorded: *recorded,
                    conflicting: block_hash,
                });
            }
            return Ok(());
        }
        debug_assert_eq!(height, self.expected_height());
        self.records.insert(height, block_hash);
        self.blocks.push(block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chainsim_hashing::Digest;

    use super::FinalityLedger;
    use crate::types::{Block, NodeId, Timestamp};

    fn block(height: u64, parent_hash: Digest, marker: &[u8]) -> Block {
        Block::new(
            height,
            parent_hash,
            Digest::hash(marker),
            NodeId(0),
            Timestamp::zero(),
            Vec::new(),
        )
    }

    #[test]
    fn records_are_append_only_and_linked() {
        let mut ledger = FinalityLedger::default();
        assert_eq!(ledger.expected_height(), 1);
        assert_eq!(ledger.head_hash(), Digest::GENESIS);

        let first = block(1, Digest::GENESIS, b"a");
        ledger.record(first.clone()).unwrap();
        assert_eq!(ledger.expected_height(), 2);
        assert_eq!(ledger.head_hash(), first.hash());
        assert_eq!(ledger.finalized_hash(1), Some(first.hash()));

        let second = block(2, first.hash(), b"b");
        ledger.record(second.clone()).unwrap();
        assert_eq!(ledger.blocks().len(), 2);
        assert_eq!(ledger.head_hash(), second.hash());
    }

    #[test]
    fn re_recording_the_same_hash_is_a_no_op() {
        let mut ledger = FinalityLedger::default();
        let first = block(1, Digest::GENESIS, b"a");
        ledger.record(first.clone()).unwrap();
        ledger.record(first.clone()).unwrap();
        assert_eq!(ledger.blocks().len(), 1);
    }

    #[test]
    fn conflicting_record_is_a_safety_violation() {
        let mut ledger = FinalityLedger::default();
        let first = block(1, Digest::GENESIS, b"a");
        let conflicting = block(1, Digest::GENESIS, b"b");
        ledger.record(first.clone()).unwrap();

        let violation = ledger.record(conflicting.clone()).unwrap_err();
        assert_eq!(violation.height, 1);
        assert_eq!(violation.recorded, first.hash());
        assert_eq!(violation.conflicting, conflicting.hash());

        // The original record is untouched.
        assert_eq!(ledger.finalized_hash(1), Some(first.hash()));
        assert_eq!(ledger.blocks().len(), 1);
    }
}
