//! A single validator: the per-height two-phase voting state machine.

use std::collections::{BTreeMap, HashSet};

use datasize::DataSize;
use tracing::{debug, error, info, trace, warn};

use chainsim_hashing::Digest;

use crate::{
    components::execution::State,
    crypto::{sign_value, verify_value, SecretKey, SigningDomain},
    event::{EventKind, EventLog},
    types::{Block, NodeId, Timestamp, Transaction, Vote, VoteKind},
};

use super::{
    fault::Fault, finality::FinalityLedger, vote_set::VoteSet, FinalizedBlock, Payload,
    ProtocolOutcome, ProtocolOutcomes, SignedProposal, ValidatorRegistry,
};

/// The protocol step a validator is in within its current height.
#[derive(Copy, Clone, Debug, Eq, PartialEq, DataSize)]
pub(crate) enum Step {
    /// Waiting for the height's proposal.
    AwaitingProposal,
    /// Prevote cast; collecting prevotes.
    AwaitingPrevotes,
    /// Precommit cast; collecting precommits.
    AwaitingPrecommits,
}

/// One validator node. Owns its state, vote sets and finalized chain
/// exclusively; it communicates with the rest of the system only through the
/// [`ProtocolOutcome`]s it returns.
#[derive(DataSize)]
pub(crate) struct Validator {
    id: NodeId,
    registry: ValidatorRegistry,
    secret_key: SecretKey,
    /// The executed key-value state up to the last finalized block.
    state: State,
    ledger: FinalityLedger,
    /// The current round within the expected height. Rounds are carried in
    /// every vote and slot; round advancement on stall is not modeled, so
    /// this stays 0 in practice.
    round: u32,
    step: Step,
    /// The accepted proposal for the expected height, if any.
    pending_block: Option<Block>,
    /// Prevote slots for the expected height, by round.
    prevotes: BTreeMap<u32, VoteSet>,
    /// Precommit slots for the expected height, by round.
    precommits: BTreeMap<u32, VoteSet>,
    /// The hash this validator prevoted for in the current round, if any.
    sent_prevote: Option<Digest>,
    /// The hash this validator precommitted in the current round, if any.
    sent_precommit: Option<Digest>,
    /// Validators this node has evidence against.
    faults: BTreeMap<NodeId, Fault>,
    /// Messages already processed; duplicate deliveries are dropped here.
    seen: HashSet<Payload>,
    /// Transactions waiting to be included in a block this node proposes.
    pending_transactions: Vec<Transaction>,
}

impl Validator {
    pub(crate) fn new(id: NodeId, registry: ValidatorRegistry, secret_key: SecretKey) -> Self {
        Validator {
            id,
            registry,
            secret_key,
            state: State::new(),
            ledger: FinalityLedger::default(),
            round: 0,
            step: Step::AwaitingProposal,
            pending_block: None,
            prevotes: BTreeMap::new(),
            precommits: BTreeMap::new(),
            sent_prevote: None,
            sent_precommit: None,
            faults: BTreeMap::new(),
            seen: HashSet::new(),
            pending_transactions: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    /// The height this validator expects to finalize next.
    pub(crate) fn expected_height(&self) -> u64 {
        self.ledger.expected_height()
    }

    pub(crate) fn ledger(&self) -> &FinalityLedger {
        &self.ledger
    }

    pub(crate) fn step(&self) -> Step {
        self.step
    }

    /// The commitment over this node's executed state.
    pub(crate) fn state_commitment(&self) -> Digest {
        self.state.commitment()
    }

    pub(crate) fn faults(&self) -> &BTreeMap<NodeId, Fault> {
        &self.faults
    }

    /// Queues a transaction for inclusion in a block this node proposes.
    pub(crate) fn add_transaction(&mut self, transaction: Transaction) {
        self.pending_transactions.push(transaction);
    }

    /// True iff this node is the scheduled proposer for the given height.
    pub(crate) fn is_leader_for(&self, height: u64) -> bool {
        self.registry.leader(height) == self.id
    }

    /// Builds, signs and proposes a block for the expected height. Invalid
    /// pending transactions are left out rather than poisoning the block.
    /// The gossiped proposal must also be delivered back to this node, which
    /// is where it casts its own prevote.
    pub(crate) fn propose(&mut self, now: Timestamp, events: &mut EventLog) -> ProtocolOutcomes {
        let height = self.expected_height();
        debug_assert!(self.is_leader_for(height));
        let chain_id = self.registry.chain_id().to_string();

        let batch = std::mem::take(&mut self.pending_transactions);
        let (post_state, applied) = self.state.speculate(batch, &chain_id);

        let block = Block::new(
            height,
            self.ledger.head_hash(),
            post_state.commitment(),
            self.id,
            now,
            applied,
        );
        let signature = sign_value(
            SigningDomain::BlockHeader,
            &chain_id,
            block.header(),
            &self.secret_key,
        );

        info!(node = %self.id, height, block_hash = %block.hash(), "proposing block");
        events.record(
            now,
            EventKind::ProposalMade {
                height,
                proposer: self.id,
                block_hash: block.hash(),
                tx_count: block.transactions().len(),
            },
        );

        vec![ProtocolOutcome::CreatedGossipMessage(Payload::Proposal(
            Box::new(SignedProposal { block, signature }),
        ))]
    }

    /// Feeds one delivered message to the validator and returns whatever it
    /// produced in reaction.
    pub(crate) fn handle_message(
        &mut self,
        now: Timestamp,
        sender: NodeId,
        payload: Payload,
        events: &mut EventLog,
    ) -> ProtocolOutcomes {
        if !self.seen.insert(payload.clone()) {
            trace!(node = %self.id, %sender, "ignoring duplicate message");
            return Vec::new();
        }

        match payload {
            Payload::Proposal(signed) => self.handle_proposal(now, sender, *signed, events),
            Payload::Prevote(vote) => {
                if vote.kind() != VoteKind::Prevote {
                    warn!(node = %self.id, %sender, "prevote message carrying a non-prevote");
                    return Vec::new();
                }
                self.handle_vote(now, sender, vote, events)
            }
            Payload::Precommit(vote) => {
                if vote.kind() != VoteKind::Precommit {
                    warn!(node = %self.id, %sender, "precommit message carrying a non-precommit");
                    return Vec::new();
                }
                self.handle_vote(now, sender, vote, events)
            }
        }
    }

    /// Validates a proposal; on acceptance stores it and casts a prevote for
    /// its hash, otherwise abstains.
    fn handle_proposal(
        &mut self,
        now: Timestamp,
        sender: NodeId,
        signed: SignedProposal,
        events: &mut EventLog,
    ) -> ProtocolOutcomes {
        let block = signed.block;
        let height = block.height();
        if height != self.expected_height() {
            trace!(
                node = %self.id, height, expected = self.expected_height(),
                "ignoring proposal for wrong height"
            );
            return Vec::new();
        }
        if self.pending_block.is_some() {
            trace!(node = %self.id, height, "already have a proposal for this height");
            return Vec::new();
        }

        let proposer = block.header().proposer();
        if proposer != self.registry.leader(height) {
            warn!(node = %self.id, %proposer, height, "proposal from a validator that is not the leader");
            return Vec::new();
        }
        let public_key = match self.registry.public_key(proposer) {
            Some(public_key) => public_key,
            None => {
                warn!(node = %self.id, %proposer, "proposal from unknown validator");
                return Vec::new();
            }
        };
        if verify_value(
            SigningDomain::BlockHeader,
            self.registry.chain_id(),
            block.header(),
            &signed.signature,
            public_key,
        )
        .is_err()
        {
            warn!(node = %self.id, %sender, height, "proposal header signature invalid");
            events.record(
                now,
                EventKind::InvalidSignature {
                    node: self.id,
                    sender,
                    kind: crate::components::network::MessageKind::Proposal,
                    height,
                },
            );
            return Vec::new();
        }
        if block.header().parent_hash() != self.ledger.head_hash() {
            debug!(node = %self.id, height, "proposal does not extend the local chain head");
            return Vec::new();
        }
        if !block.has_valid_tx_root() {
            debug!(node = %self.id, height, "proposal transaction root mismatch");
            return Vec::new();
        }
        // Re-execute the batch: the claimed post-state must be reproducible.
        match self
            .state
            .execute(block.transactions(), self.registry.chain_id())
        {
            Ok((_, state_root)) if state_root == block.header().state_root() => {}
            Ok(_) => {
                debug!(node = %self.id, height, "proposal state root mismatch");
                return Vec::new();
            }
            Err(error) => {
                debug!(node = %self.id, height, %error, "proposal contains an invalid transaction");
                return Vec::new();
            }
        }

        let block_hash = block.hash();
        self.pending_block = Some(block);
        let mut outcomes = self.broadcast_vote(VoteKind::Prevote, block_hash);

        // Under delay and duplication the proposal can arrive after the
        // votes. Re-check the precommits already collected for this block.
        let total = self.registry.count();
        if let Some(majority_hash) = self
            .precommits
            .get(&self.round)
            .and_then(|votes| votes.majority(total))
        {
            if majority_hash == block_hash {
                outcomes.extend(self.try_finalize(now, majority_hash, events));
            }
        }
        outcomes
    }

    /// Casts this validator's own vote, unless it already voted this round.
    fn broadcast_vote(&mut self, kind: VoteKind, block_hash: Digest) -> ProtocolOutcomes {
        let sent = match kind {
            VoteKind::Prevote => &mut self.sent_prevote,
            VoteKind::Precommit => &mut self.sent_precommit,
        };
        if sent.is_some() {
            return Vec::new();
        }
        *sent = Some(block_hash);

        let vote = Vote::new(
            kind,
            self.expected_height(),
            self.round,
            block_hash,
            self.id,
            &self.secret_key,
            self.registry.chain_id(),
        );
        debug!(node = %self.id, %vote, "casting vote");
        let payload = match kind {
            VoteKind::Prevote => {
                self.step = Step::AwaitingPrevotes;
                Payload::Prevote(vote)
            }
            VoteKind::Precommit => {
                self.step = Step::AwaitingPrecommits;
                Payload::Precommit(vote)
            }
        };
        vec![ProtocolOutcome::CreatedGossipMessage(payload)]
    }

    /// Records a vote and reacts to any majority it completes.
    fn handle_vote(
        &mut self,
        now: Timestamp,
        sender: NodeId,
        vote: Vote,
        events: &mut EventLog,
    ) -> ProtocolOutcomes {
        let height = vote.height();
        if height != self.expected_height() {
            trace!(
                node = %self.id, height, expected = self.expected_height(),
                "ignoring vote for wrong height"
            );
            return Vec::new();
        }
        let voter = vote.voter();
        let public_key = match self.registry.public_key(voter) {
            Some(public_key) => public_key,
            None => {
                warn!(node = %self.id, %voter, "vote from non-validator");
                return Vec::new();
            }
        };
        if vote.verify(public_key, self.registry.chain_id()).is_err() {
            warn!(node = %self.id, %voter, %sender, "vote signature invalid");
            events.record(
                now,
                EventKind::InvalidSignature {
                    node: self.id,
                    sender,
                    kind: match vote.kind() {
                        VoteKind::Prevote => crate::components::network::MessageKind::Prevote,
                        VoteKind::Precommit => crate::components::network::MessageKind::Precommit,
                    },
                    height,
                },
            );
            return Vec::new();
        }

        let kind = vote.kind();
        let round = vote.round();
        let block_hash = vote.block_hash();
        let slots = match kind {
            VoteKind::Prevote => &mut self.prevotes,
            VoteKind::Precommit => &mut self.precommits,
        };
        match slots.entry(round).or_default().add(vote) {
            Ok(true) => {
                events.record(
                    now,
                    EventKind::VoteReceived {
                        node: self.id,
                        voter,
                        kind,
                        height,
                        block_hash,
                    },
                );
            }
            Ok(false) => {
                trace!(node = %self.id, %voter, "duplicate vote ignored");
                return Vec::new();
            }
            Err(fault) => {
                warn!(node = %self.id, %voter, ?kind, height, round, "equivocation detected");
                events.record(
                    now,
                    EventKind::EquivocationDetected {
                        node: self.id,
                        voter,
                        kind,
                        height,
                        round,
                    },
                );
                self.faults.insert(voter, *fault);
                return Vec::new();
            }
        }

        let total = self.registry.count();
        match kind {
            VoteKind::Prevote => {
                if self.sent_precommit.is_none() {
                    if let Some(majority_hash) = self.prevotes[&round].majority(total) {
                        return self.broadcast_vote(VoteKind::Precommit, majority_hash);
                    }
                }
                Vec::new()
            }
            VoteKind::Precommit => {
                if let Some(majority_hash) = self.precommits[&round].majority(total) {
                    return self.try_finalize(now, majority_hash, events);
                }
                Vec::new()
            }
        }
    }

    /// Finalizes the pending block once a strict majority of precommits
    /// agrees on its hash, then advances to the next height.
    fn try_finalize(
        &mut self,
        now: Timestamp,
        block_hash: Digest,
        events: &mut EventLog,
    ) -> ProtocolOutcomes {
        let block = match &self.pending_block {
            Some(block) if block.hash() == block_hash => block.clone(),
            _ => {
                debug!(
                    node = %self.id, %block_hash,
                    "majority precommit without a matching pending block; cannot finalize"
                );
                return Vec::new();
            }
        };
        let height = block.height();

        match self.state.execute(block.transactions(), self.registry.chain_id()) {
            Ok((next_state, state_root)) => {
                debug_assert_eq!(state_root, block.header().state_root());
                self.state = next_state;
            }
            Err(err) => {
                // Cannot happen for an accepted proposal; refuse to diverge.
                error!(node = %self.id, height, %err, "failed to apply finalized block");
                return Vec::new();
            }
        }
        if let Err(violation) = self.ledger.record(block) {
            error!(node = %self.id, %violation, "finality record conflict");
            events.record(
                now,
                EventKind::SafetyViolation {
                    node: self.id,
                    height: violation.height,
                    recorded: violation.recorded,
                    conflicting: violation.conflicting,
                },
            );
            return Vec::new();
        }

        info!(node = %self.id, height, %block_hash, "finalized block");
        events.record(
            now,
            EventKind::BlockFinalized {
                node: self.id,
                height,
                block_hash,
            },
        );

        // Advance to the next height: fresh round, fresh slots. Old votes and
        // messages can never be counted again.
        self.round = 0;
        self.step = Step::AwaitingProposal;
        self.pending_block = None;
        self.prevotes.clear();
        self.precommits.clear();
        self.sent_prevote = None;
        self.sent_precommit = None;
        self.seen.retain(|payload| payload.height() > height);

        vec![ProtocolOutcome::FinalizedBlock(FinalizedBlock {
            height,
            block_hash,
        })]
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use chainsim_hashing::Digest;

    use super::{Step, Validator};
    use crate::{
        components::consensus::{Payload, ProtocolOutcome, SignedProposal, ValidatorRegistry},
        crypto::{sign_value, SecretKey, SigningDomain},
        event::EventLog,
        types::{Block, NodeId, NodeRng, Timestamp, Vote, VoteKind},
    };

    const CHAIN_ID: &str = "test-chain";

    struct TestNet {
        validators: Vec<Validator>,
        keys: Vec<SecretKey>,
        events: EventLog,
    }

    impl TestNet {
        fn new(count: u8) -> Self {
            let mut rng = NodeRng::seed_from_u64(99);
            let keys: Vec<SecretKey> = (0..count).map(|_| SecretKey::generate(&mut rng)).collect();
            let registry = ValidatorRegistry::new(
                CHAIN_ID.to_string(),
                keys.iter()
                    .enumerate()
                    .map(|(id, key)| (NodeId(id as u8), key.public_key())),
            );
            let mut spare_rng = NodeRng::seed_from_u64(99);
            let validators = (0..count)
                .map(|id| {
                    Validator::new(
                        NodeId(id),
                        registry.clone(),
                        SecretKey::generate(&mut spare_rng),
                    )
                })
                .collect();
            TestNet {
                validators,
                keys,
                events: EventLog::new(),
            }
        }

        fn proposal(&mut self) -> Payload {
            let outcomes = self.validators[0].propose(Timestamp::zero(), &mut self.events);
            match outcomes.into_iter().next() {
                Some(ProtocolOutcome::CreatedGossipMessage(payload)) => payload,
                other => panic!("expected a gossiped proposal, got {:?}", other),
            }
        }

        fn vote(&self, voter: u8, kind: VoteKind, block_hash: Digest) -> Payload {
            let vote = Vote::new(
                kind,
                1,
                0,
                block_hash,
                NodeId(voter),
                &self.keys[voter as usize],
                CHAIN_ID,
            );
            match kind {
                VoteKind::Prevote => Payload::Prevote(vote),
                VoteKind::Precommit => Payload::Precommit(vote),
            }
        }
    }

    fn gossiped(outcomes: &[ProtocolOutcome]) -> Option<&Payload> {
        outcomes.iter().find_map(|outcome| match outcome {
            ProtocolOutcome::CreatedGossipMessage(payload) => Some(payload),
            _ => None,
        })
    }

    #[test]
    fn accepted_proposal_triggers_a_prevote() {
        let mut net = TestNet::new(4);
        let proposal = net.proposal();

        let mut events = EventLog::new();
        let outcomes =
            net.validators[1].handle_message(Timestamp::from(1), NodeId(0), proposal, &mut events);

        match gossiped(&outcomes) {
            Some(Payload::Prevote(vote)) => {
                assert_eq!(vote.kind(), VoteKind::Prevote);
                assert_eq!(vote.height(), 1);
                assert_eq!(vote.voter(), NodeId(1));
            }
            other => panic!("expected a prevote, got {:?}", other),
        }
        assert_eq!(net.validators[1].step(), Step::AwaitingPrevotes);
    }

    #[test]
    fn proposal_with_bad_signature_is_rejected() {
        let mut net = TestNet::new(4);
        let proposal = net.proposal();

        // Re-sign the header with the wrong key.
        let tampered = match proposal {
            Payload::Proposal(signed) => {
                let block = signed.block;
                let signature = sign_value(
                    SigningDomain::BlockHeader,
                    CHAIN_ID,
                    block.header(),
                    &net.keys[2],
                );
                Payload::Proposal(Box::new(SignedProposal { block, signature }))
            }
            other => panic!("expected proposal, got {:?}", other),
        };

        let mut events = EventLog::new();
        let outcomes =
            net.validators[1].handle_message(Timestamp::from(1), NodeId(0), tampered, &mut events);
        assert!(outcomes.is_empty());
        assert_eq!(events.counts().get("invalid_signature"), Some(&1));
    }

    #[test]
    fn proposal_from_non_leader_is_rejected() {
        let mut net = TestNet::new(4);
        // Height 1's leader is node 0; a block claiming node 2 proposed it
        // must be refused even with a valid signature.
        let block = Block::new(
            1,
            Digest::GENESIS,
            Digest::hash(b"state"),
            NodeId(2),
            Timestamp::zero(),
            Vec::new(),
        );
        let signature = sign_value(SigningDomain::BlockHeader, CHAIN_ID, block.header(), &net.keys[2]);
        let payload = Payload::Proposal(Box::new(SignedProposal { block, signature }));

        let mut events = EventLog::new();
        let outcomes =
            net.validators[1].handle_message(Timestamp::from(1), NodeId(2), payload, &mut events);
        assert!(outcomes.is_empty());
    }

    #[test]
    fn height_mismatch_is_ignored() {
        let mut net = TestNet::new(4);
        let vote = net.vote(1, VoteKind::Prevote, Digest::hash(b"block"));
        let future_vote = match vote {
            Payload::Prevote(vote) => {
                let shifted = Vote::new(
                    VoteKind::Prevote,
                    5,
                    0,
                    vote.block_hash(),
                    NodeId(1),
                    &net.keys[1],
                    CHAIN_ID,
                );
                Payload::Prevote(shifted)
            }
            other => panic!("expected prevote, got {:?}", other),
        };

        let mut events = EventLog::new();
        let outcomes = net.validators[2].handle_message(
            Timestamp::from(1),
            NodeId(1),
            future_vote,
            &mut events,
        );
        assert!(outcomes.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn majority_prevotes_trigger_exactly_one_precommit() {
        let mut net = TestNet::new(4);
        let block_hash = Digest::hash(b"block");

        let mut events = EventLog::new();
        let mut precommits = 0;
        for voter in 0..3 {
            let payload = net.vote(voter, VoteKind::Prevote, block_hash);
            let outcomes = net.validators[3].handle_message(
                Timestamp::from(1),
                NodeId(voter),
                payload,
                &mut events,
            );
            if let Some(Payload::Precommit(_)) = gossiped(&outcomes) {
                precommits += 1;
            }
        }
        assert_eq!(precommits, 1, "the third prevote completes the majority");

        // A further prevote for the same hash must not re-trigger.
        let payload = net.vote(3, VoteKind::Prevote, block_hash);
        let outcomes =
            net.validators[3].handle_message(Timestamp::from(2), NodeId(3), payload, &mut events);
        assert!(gossiped(&outcomes).is_none());
    }

    #[test]
    fn two_prevotes_of_four_are_not_a_majority() {
        let mut net = TestNet::new(4);
        let block_hash = Digest::hash(b"block");

        let mut events = EventLog::new();
        for voter in 0..2 {
            let payload = net.vote(voter, VoteKind::Prevote, block_hash);
            let outcomes = net.validators[3].handle_message(
                Timestamp::from(1),
                NodeId(voter),
                payload,
                &mut events,
            );
            assert!(gossiped(&outcomes).is_none(), "2 of 4 must never precommit");
        }
    }

    #[test]
    fn majority_precommits_finalize_the_pending_block() {
        let mut net = TestNet::new(4);
        let proposal = net.proposal();
        let block_hash = match &proposal {
            Payload::Proposal(signed) => signed.block.hash(),
            other => panic!("expected proposal, got {:?}", other),
        };

        let mut events = EventLog::new();
        net.validators[1].handle_message(Timestamp::from(1), NodeId(0), proposal, &mut events);

        let mut finalized = false;
        for voter in 0..3 {
            let payload = net.vote(voter, VoteKind::Precommit, block_hash);
            let outcomes = net.validators[1].handle_message(
                Timestamp::from(2),
                NodeId(voter),
                payload,
                &mut events,
            );
            for outcome in outcomes {
                if let ProtocolOutcome::FinalizedBlock(block) = outcome {
                    assert_eq!(block.height, 1);
                    assert_eq!(block.block_hash, block_hash);
                    finalized = true;
                }
            }
        }
        assert!(finalized);
        assert_eq!(net.validators[1].expected_height(), 2);
        assert_eq!(net.validators[1].ledger().finalized_hash(1), Some(block_hash));
        assert_eq!(net.validators[1].step(), Step::AwaitingProposal);
    }

    #[test]
    fn majority_precommits_without_the_block_cannot_finalize() {
        let mut net = TestNet::new(4);
        let block_hash = Digest::hash(b"never seen");

        let mut events = EventLog::new();
        for voter in 0..3 {
            let payload = net.vote(voter, VoteKind::Precommit, block_hash);
            let outcomes = net.validators[1].handle_message(
                Timestamp::from(1),
                NodeId(voter),
                payload,
                &mut events,
            );
            assert!(outcomes.is_empty());
        }
        assert_eq!(net.validators[1].expected_height(), 1);
    }

    #[test]
    fn equivocating_voter_is_flagged_and_not_double_counted() {
        let mut net = TestNet::new(4);
        let hash_a = Digest::hash(b"block a");
        let hash_b = Digest::hash(b"block b");

        let mut events = EventLog::new();
        let first = net.vote(0, VoteKind::Prevote, hash_a);
        let second = net.vote(0, VoteKind::Prevote, hash_b);
        net.validators[1].handle_message(Timestamp::from(1), NodeId(0), first, &mut events);
        net.validators[1].handle_message(Timestamp::from(1), NodeId(0), second, &mut events);

        assert_eq!(events.counts().get("equivocation_detected"), Some(&1));
        assert!(net.validators[1].faults().contains_key(&NodeId(0)));
    }

    #[test]
    fn vote_with_tampered_signature_is_never_counted() {
        let mut net = TestNet::new(4);
        let block_hash = Digest::hash(b"block");

        // Signed for one hash, then altered to claim another.
        let mut vote = Vote::new(
            VoteKind::Prevote,
            1,
            0,
            block_hash,
            NodeId(0),
            &net.keys[0],
            CHAIN_ID,
        );
        vote.set_block_hash(Digest::hash(b"forged"));
        let payload = Payload::Prevote(vote);

        let mut events = EventLog::new();
        let outcomes =
            net.validators[1].handle_message(Timestamp::from(1), NodeId(0), payload, &mut events);
        assert!(outcomes.is_empty());
        assert_eq!(events.counts().get("invalid_signature"), Some(&1));
        assert_eq!(events.counts().get("vote_received"), None);
    }
}
