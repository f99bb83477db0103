//! The typed event log: the simulation's sole externally verifiable artifact.
//!
//! Every entry carries the logical tick it occurred at; wall-clock time never
//! enters the log. The digest over the canonical serialization of the full
//! sequence is therefore identical for two runs with the same seed and
//! configuration, which is exactly what the determinism checker compares.

use std::{collections::BTreeMap, fs::File, io, path::Path};

use serde::{Deserialize, Serialize};
use tracing::trace;

use chainsim_hashing::{hash_canonical, Digest};

use crate::{
    components::network::MessageKind,
    types::{NodeId, Timestamp, VoteKind},
};

/// A single entry in the event log.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The tick at which the event occurred.
    pub tick: Timestamp,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// The kinds of event the simulation records.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// A transaction was created and handed to a node's pending pool.
    TransactionCreated {
        /// The sending account.
        sender: String,
        /// The written key.
        key: String,
    },
    /// A proposer built and broadcast a block.
    ProposalMade {
        /// The proposed height.
        height: u64,
        /// The proposing validator.
        proposer: NodeId,
        /// The block's identity.
        block_hash: Digest,
        /// Number of transactions in the block.
        tx_count: usize,
    },
    /// A message was handed to the network for broadcast.
    MessageSent {
        /// The sending node.
        sender: NodeId,
        /// The message kind.
        kind: MessageKind,
        /// The height the message refers to.
        height: u64,
    },
    /// A scheduled delivery was discarded by the lossy medium.
    MessageDropped {
        /// The sending node.
        sender: NodeId,
        /// The intended recipient.
        recipient: NodeId,
        /// The message kind.
        kind: MessageKind,
        /// The height the message refers to.
        height: u64,
    },
    /// The medium scheduled an independent second copy of a message.
    MessageDuplicated {
        /// The sending node.
        sender: NodeId,
        /// The intended recipient.
        recipient: NodeId,
        /// The message kind.
        kind: MessageKind,
        /// The height the message refers to.
        height: u64,
    },
    /// A message reached its recipient.
    MessageDelivered {
        /// The sending node.
        sender: NodeId,
        /// The receiving node.
        recipient: NodeId,
        /// The message kind.
        kind: MessageKind,
        /// The height the message refers to.
        height: u64,
    },
    /// A due delivery exceeded the recipient's per-tick rate limit and was
    /// pushed to the next tick.
    DeliveryDeferred {
        /// The receiving node.
        recipient: NodeId,
        /// The message kind.
        kind: MessageKind,
        /// The height the message refers to.
        height: u64,
    },
    /// A node accepted a vote into one of its vote sets.
    VoteReceived {
        /// The node that recorded the vote.
        node: NodeId,
        /// The validator that cast the vote.
        voter: NodeId,
        /// The vote phase.
        kind: VoteKind,
        /// The height voted on.
        height: u64,
        /// The block hash voted for.
        block_hash: Digest,
    },
    /// A message carried a signature that failed verification.
    InvalidSignature {
        /// The node that rejected the message.
        node: NodeId,
        /// The node the message arrived from.
        sender: NodeId,
        /// The message kind.
        kind: MessageKind,
        /// The height the message refers to.
        height: u64,
    },
    /// A voter cast a second, differing vote in the same slot. The first vote
    /// is retained; this one never counts toward any tally.
    EquivocationDetected {
        /// The node that detected the conflict.
        node: NodeId,
        /// The equivocating voter.
        voter: NodeId,
        /// The vote phase.
        kind: VoteKind,
        /// The height voted on.
        height: u64,
        /// The round within the height.
        round: u32,
    },
    /// A node observed a strict majority of precommits and finalized a block.
    BlockFinalized {
        /// The finalizing node.
        node: NodeId,
        /// The finalized height.
        height: u64,
        /// The finalized block hash.
        block_hash: Digest,
    },
    /// A node failed to finalize a height within the step budget.
    HeightStalled {
        /// The stalled node.
        node: NodeId,
        /// The height it is stuck at.
        height: u64,
    },
    /// Two different block hashes were recorded at the same height. This can
    /// only happen if the strict-majority safety argument was broken; it is
    /// never a recoverable protocol condition.
    SafetyViolation {
        /// The node on which the conflict surfaced.
        node: NodeId,
        /// The affected height.
        height: u64,
        /// The previously recorded hash.
        recorded: Digest,
        /// The conflicting hash.
        conflicting: Digest,
    },
}

impl EventKind {
    /// The snake_case name of the event, as it appears in the serialized log.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::TransactionCreated { .. } => "transaction_created",
            EventKind::ProposalMade { .. } => "proposal_made",
            EventKind::MessageSent { .. } => "message_sent",
            EventKind::MessageDropped { .. } => "message_dropped",
            EventKind::MessageDuplicated { .. } => "message_duplicated",
            EventKind::MessageDelivered { .. } => "message_delivered",
            EventKind::DeliveryDeferred { .. } => "delivery_deferred",
            EventKind::VoteReceived { .. } => "vote_received",
            EventKind::InvalidSignature { .. } => "invalid_signature",
            EventKind::EquivocationDetected { .. } => "equivocation_detected",
            EventKind::BlockFinalized { .. } => "block_finalized",
            EventKind::HeightStalled { .. } => "height_stalled",
            EventKind::SafetyViolation { .. } => "safety_violation",
        }
    }
}

/// The ordered sequence of everything that happened during a run.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        EventLog::default()
    }

    /// Appends an event.
    pub fn record(&mut self, tick: Timestamp, kind: EventKind) {
        trace!(%tick, event = kind.name(), "recording event");
        self.events.push(Event { tick, kind });
    }

    /// All recorded events, in order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True iff nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// SHA-256 over the canonical serialization of the whole sequence. Two
    /// runs are considered identical iff their digests are equal.
    pub fn digest(&self) -> Digest {
        hash_canonical(&self.events).expect("failed to serialize event log")
    }

    /// Event counts by name, for the run report.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.kind.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Writes the log as a JSON document.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &self.events)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
    }
}
