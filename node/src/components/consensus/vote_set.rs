//! Per-slot vote collection and majority tally.

use std::collections::{btree_map::Entry, BTreeMap};

use datasize::DataSize;

use chainsim_hashing::Digest;

use crate::types::{NodeId, Vote};

use super::fault::Fault;

/// The votes of one kind for one (height, round) slot: at most one counted
/// vote per voter.
#[derive(Clone, Debug, Default, DataSize)]
pub(crate) struct VoteSet {
    votes: BTreeMap<NodeId, Vote>,
}

impl VoteSet {
    /// Adds a vote. Returns `Ok(true)` if the vote was newly recorded and
    /// `Ok(false)` if an identical vote was already present (duplicates are
    /// never double-counted). If the voter already has a vote for a
    /// *different* hash in this slot, the first vote is retained, the new
    /// one never counts, and the evidence is returned as an error.
    pub(crate) fn add(&mut self, vote: Vote) -> Result<bool, Box<Fault>> {
        match self.votes.entry(vote.voter()) {
            Entry::Occupied(entry) => {
                if entry.get().block_hash() == vote.block_hash() {
                    Ok(false)
                } else {
                    Err(Box::new(Fault::Equivocated {
                        first: entry.get().clone(),
                        second: vote,
                    }))
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(vote);
                Ok(true)
            }
        }
    }

    /// The number of recorded votes for the given block hash.
    pub(crate) fn tally(&self, block_hash: Digest) -> usize {
        self.votes
            .values()
            .filter(|vote| vote.block_hash() == block_hash)
            .count()
    }

    /// True iff strictly more than half of `total` voters voted for the hash.
    pub(crate) fn has_majority(&self, block_hash: Digest, total: usize) -> bool {
        2 * self.tally(block_hash) > total
    }

    /// The hash holding a strict majority, if any. At most one hash can.
    pub(crate) fn majority(&self, total: usize) -> Option<Digest> {
        let mut counts: BTreeMap<Digest, usize> = BTreeMap::new();
        for vote in self.votes.values() {
            *counts.entry(vote.block_hash()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .find(|(_, count)| 2 * count > total)
            .map(|(block_hash, _)| block_hash)
    }

    /// The number of distinct voters recorded.
    pub(crate) fn voters(&self) -> usize {
        self.votes.len()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use chainsim_hashing::Digest;

    use super::{Fault, VoteSet};
    use crate::{
        crypto::SecretKey,
        types::{NodeId, NodeRng, Vote, VoteKind},
    };

    const CHAIN_ID: &str = "test-chain";

    fn vote(rng: &mut NodeRng, voter: u8, block_hash: Digest) -> Vote {
        let secret_key = SecretKey::generate(rng);
        Vote::new(
            VoteKind::Prevote,
            1,
            0,
            block_hash,
            NodeId(voter),
            &secret_key,
            CHAIN_ID,
        )
    }

    #[test]
    fn strict_majority_arithmetic() {
        let mut rng = NodeRng::seed_from_u64(1);
        let block_hash = Digest::hash(b"block");
        let mut set = VoteSet::default();

        // With N = 4, two votes are exactly half and must NOT be a majority.
        set.add(vote(&mut rng, 0, block_hash)).unwrap();
        set.add(vote(&mut rng, 1, block_hash)).unwrap();
        assert_eq!(set.tally(block_hash), 2);
        assert!(!set.has_majority(block_hash, 4));
        assert_eq!(set.majority(4), None);

        // Three of four is a strict majority.
        set.add(vote(&mut rng, 2, block_hash)).unwrap();
        assert!(set.has_majority(block_hash, 4));
        assert_eq!(set.majority(4), Some(block_hash));
    }

    #[test]
    fn duplicate_vote_is_not_double_counted() {
        let mut rng = NodeRng::seed_from_u64(2);
        let block_hash = Digest::hash(b"block");
        let mut set = VoteSet::default();

        let first = vote(&mut rng, 0, block_hash);
        assert_eq!(set.add(first.clone()), Ok(true));
        assert_eq!(set.add(first), Ok(false));
        assert_eq!(set.tally(block_hash), 1);
        assert_eq!(set.voters(), 1);
    }

    #[test]
    fn equivocation_retains_the_first_vote() {
        let mut rng = NodeRng::seed_from_u64(3);
        let hash_a = Digest::hash(b"block a");
        let hash_b = Digest::hash(b"block b");
        let mut set = VoteSet::default();

        let first = vote(&mut rng, 0, hash_a);
        let second = vote(&mut rng, 0, hash_b);
        set.add(first.clone()).unwrap();

        let fault = set.add(second.clone()).unwrap_err();
        assert_eq!(
            *fault,
            Fault::Equivocated {
                first: first.clone(),
                second
            }
        );
        assert_eq!(fault.voter(), NodeId(0));

        // The conflicting vote never counts toward any tally.
        assert_eq!(set.tally(hash_a), 1);
        assert_eq!(set.tally(hash_b), 0);
    }

    #[test]
    fn split_votes_produce_no_majority() {
        let mut rng = NodeRng::seed_from_u64(4);
        let hash_a = Digest::hash(b"block a");
        let hash_b = Digest::hash(b"block b");
        let mut set = VoteSet::default();

        set.add(vote(&mut rng, 0, hash_a)).unwrap();
        set.add(vote(&mut rng, 1, hash_a)).unwrap();
        set.add(vote(&mut rng, 2, hash_b)).unwrap();
        set.add(vote(&mut rng, 3, hash_b)).unwrap();

        assert_eq!(set.majority(4), None);
    }
}
