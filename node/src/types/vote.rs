use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use serde::{Deserialize, Serialize};

use chainsim_hashing::Digest;

use super::NodeId;
use crate::crypto::{self, sign_value, verify_value, PublicKey, SecretKey, Signature, SigningDomain};

/// First- or second-phase vote of the two-phase protocol.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, DataSize,
)]
#[serde(rename_all = "snake_case")]
pub enum VoteKind {
    /// Cast after validating a proposal.
    Prevote,
    /// Cast after observing a strict majority of prevotes.
    Precommit,
}

impl Display for VoteKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            VoteKind::Prevote => write!(f, "prevote"),
            VoteKind::Precommit => write!(f, "precommit"),
        }
    }
}

/// A signed vote for a block hash at a given height and round.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, DataSize)]
pub struct Vote {
    kind: VoteKind,
    height: u64,
    round: u32,
    block_hash: Digest,
    voter: NodeId,
    signature: Signature,
}

/// The signed portion of a vote.
#[derive(Serialize)]
struct VoteClaim {
    kind: VoteKind,
    height: u64,
    round: u32,
    block_hash: Digest,
    voter: NodeId,
}

impl Vote {
    /// Creates and signs a new vote.
    pub fn new(
        kind: VoteKind,
        height: u64,
        round: u32,
        block_hash: Digest,
        voter: NodeId,
        secret_key: &SecretKey,
        chain_id: &str,
    ) -> Self {
        let signature = sign_value(
            SigningDomain::Vote,
            chain_id,
            &VoteClaim {
                kind,
                height,
                round,
                block_hash,
                voter,
            },
            secret_key,
        );
        Vote {
            kind,
            height,
            round,
            block_hash,
            voter,
            signature,
        }
    }

    /// Verifies the vote's signature against the voter's public key.
    pub fn verify(&self, public_key: &PublicKey, chain_id: &str) -> Result<(), crypto::Error> {
        verify_value(
            SigningDomain::Vote,
            chain_id,
            &VoteClaim {
                kind: self.kind,
                height: self.height,
                round: self.round,
                block_hash: self.block_hash,
                voter: self.voter,
            },
            &self.signature,
            public_key,
        )
    }

    /// The vote phase.
    pub fn kind(&self) -> VoteKind {
        self.kind
    }

    /// The height voted on.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// The round within the height.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// The block hash voted for.
    pub fn block_hash(&self) -> Digest {
        self.block_hash
    }

    /// The validator that cast this vote.
    pub fn voter(&self) -> NodeId {
        self.voter
    }

    #[cfg(test)]
    pub(crate) fn set_block_hash(&mut self, block_hash: Digest) {
        self.block_hash = block_hash;
    }
}

impl Display for Vote {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}(height={}, round={}, hash={}, voter={})",
            self.kind, self.height, self.round, self.block_hash, self.voter
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use chainsim_hashing::Digest;

    use super::{Vote, VoteKind};
    use crate::{
        crypto::SecretKey,
        types::{NodeId, NodeRng},
    };

    const CHAIN_ID: &str = "test-chain";

    #[test]
    fn vote_signature_roundtrip() {
        let mut rng = NodeRng::seed_from_u64(1);
        let secret_key = SecretKey::generate(&mut rng);
        let vote = Vote::new(
            VoteKind::Prevote,
            1,
            0,
            Digest::hash(b"block"),
            NodeId(0),
            &secret_key,
            CHAIN_ID,
        );
        assert!(vote.verify(&secret_key.public_key(), CHAIN_ID).is_ok());
    }

    #[test]
    fn altered_vote_is_rejected() {
        let mut rng = NodeRng::seed_from_u64(2);
        let secret_key = SecretKey::generate(&mut rng);
        let mut vote = Vote::new(
            VoteKind::Precommit,
            1,
            0,
            Digest::hash(b"block"),
            NodeId(0),
            &secret_key,
            CHAIN_ID,
        );
        vote.set_block_hash(Digest::hash(b"other block"));
        assert!(vote.verify(&secret_key.public_key(), CHAIN_ID).is_err());
    }

    #[test]
    fn prevote_signature_does_not_verify_as_precommit() {
        let mut rng = NodeRng::seed_from_u64(3);
        let secret_key = SecretKey::generate(&mut rng);
        let prevote = Vote::new(
            VoteKind::Prevote,
            1,
            0,
            Digest::hash(b"block"),
            NodeId(0),
            &secret_key,
            CHAIN_ID,
        );
        let mut as_precommit = prevote;
        as_precommit.kind = VoteKind::Precommit;
        assert!(as_precommit
            .verify(&secret_key.public_key(), CHAIN_ID)
            .is_err());
    }
}
