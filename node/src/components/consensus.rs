//! The consensus component: the two-phase voting protocol.
//!
//! In every height the scheduled leader proposes a block. Each validator that
//! accepts the proposal broadcasts a prevote for its hash; a strict majority
//! of prevotes for one hash triggers a precommit; a strict majority of
//! precommits finalizes the block. A strict majority is more than half of the
//! validator count, so two disjoint majorities for different hashes at the
//! same height cannot both exist and at most one block is ever finalized per
//! height, system-wide.

pub(crate) mod fault;
pub(crate) mod finality;
pub(crate) mod validator;
pub(crate) mod vote_set;

use datasize::DataSize;
use std::collections::BTreeMap;

use chainsim_hashing::Digest;

use crate::{
    components::network::{MessageKind, PayloadT},
    crypto::{PublicKey, Signature},
    types::{Block, NodeId, Vote},
};

pub(crate) use validator::Validator;

/// A proposal as it travels the network: the block plus the proposer's
/// signature over the header.
#[derive(Clone, Debug, Eq, PartialEq, Hash, DataSize)]
pub(crate) struct SignedProposal {
    pub(crate) block: Block,
    pub(crate) signature: Signature,
}

/// A protocol message: the typed payload of a network envelope. Every kind is
/// handled exhaustively; there is no catch-all.
#[derive(Clone, Debug, Eq, PartialEq, Hash, DataSize)]
pub(crate) enum Payload {
    /// A proposed block for the current height.
    Proposal(Box<SignedProposal>),
    /// A first-phase vote.
    Prevote(Vote),
    /// A second-phase vote.
    Precommit(Vote),
}

impl Payload {
    pub(crate) fn kind(&self) -> MessageKind {
        match self {
            Payload::Proposal(_) => MessageKind::Proposal,
            Payload::Prevote(_) => MessageKind::Prevote,
            Payload::Precommit(_) => MessageKind::Precommit,
        }
    }

    pub(crate) fn height(&self) -> u64 {
        match self {
            Payload::Proposal(signed) => signed.block.height(),
            Payload::Prevote(vote) | Payload::Precommit(vote) => vote.height(),
        }
    }
}

impl PayloadT for Payload {
    fn kind(&self) -> MessageKind {
        Payload::kind(self)
    }

    fn height(&self) -> u64 {
        Payload::height(self)
    }
}

/// Outcome of feeding a message or a proposer duty to a validator. The
/// simulation loop dispatches these; the validator itself never touches the
/// network.
#[derive(Clone, Debug)]
pub(crate) enum ProtocolOutcome {
    /// A message to gossip to all peers. The creator must also observe its
    /// own message, so the loop delivers it back locally as well.
    CreatedGossipMessage(Payload),
    /// The validator finalized a block and advanced to the next height.
    FinalizedBlock(FinalizedBlock),
}

/// Multiple outcomes, in the order they were produced.
pub(crate) type ProtocolOutcomes = Vec<ProtocolOutcome>;

/// A block that reached finality on one node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FinalizedBlock {
    pub(crate) height: u64,
    pub(crate) block_hash: Digest,
}

/// The immutable registry of the validator set: every node's identity and
/// public key, shared by all components instead of a global.
#[derive(Clone, Debug, DataSize)]
pub(crate) struct ValidatorRegistry {
    chain_id: String,
    /// Validator ids, sorted; the proposer rotation walks this list.
    ids: Vec<NodeId>,
    keys: BTreeMap<NodeId, PublicKey>,
}

impl ValidatorRegistry {
    pub(crate) fn new<I>(chain_id: String, validators: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, PublicKey)>,
    {
        let keys: BTreeMap<NodeId, PublicKey> = validators.into_iter().collect();
        let ids = keys.keys().copied().collect();
        ValidatorRegistry {
            chain_id,
            ids,
            keys,
        }
    }

    pub(crate) fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// The validator count, the `N` of the strict-majority rule.
    pub(crate) fn count(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn contains(&self, node_id: NodeId) -> bool {
        self.keys.contains_key(&node_id)
    }

    pub(crate) fn public_key(&self, node_id: NodeId) -> Option<&PublicKey> {
        self.keys.get(&node_id)
    }

    pub(crate) fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// The scheduled proposer for a height: round-robin over the sorted
    /// validator ids, starting with the first validator at height 1.
    pub(crate) fn leader(&self, height: u64) -> NodeId {
        let index = (height.saturating_sub(1) as usize) % self.ids.len();
        self.ids[index]
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::ValidatorRegistry;
    use crate::{
        crypto::SecretKey,
        types::{NodeId, NodeRng},
    };

    fn registry(count: u8) -> ValidatorRegistry {
        let mut rng = NodeRng::seed_from_u64(1);
        ValidatorRegistry::new(
            "test-chain".to_string(),
            (0..count).map(|id| (NodeId(id), SecretKey::generate(&mut rng).public_key())),
        )
    }

    #[test]
    fn leader_rotates_round_robin() {
        let registry = registry(4);
        assert_eq!(registry.leader(1), NodeId(0));
        assert_eq!(registry.leader(2), NodeId(1));
        assert_eq!(registry.leader(4), NodeId(3));
        assert_eq!(registry.leader(5), NodeId(0));
    }

    #[test]
    fn registry_knows_its_members() {
        let registry = registry(3);
        assert_eq!(registry.count(), 3);
        assert!(registry.contains(NodeId(2)));
        assert!(!registry.contains(NodeId(3)));
        assert!(registry.public_key(NodeId(0)).is_some());
    }
}
