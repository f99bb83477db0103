//! The network simulator.
//!
//! Models the medium between validators: per-message delay, probabilistic
//! drop, probabilistic duplication and per-recipient delivery-rate limiting.
//! All scheduled deliveries live in one priority queue owned by the
//! simulator; all randomness is drawn from the single seeded generator passed
//! in by the caller, in program order, so identical (seed, config) pairs
//! reproduce byte-identical delivery schedules.

pub(crate) mod queue;

use std::{collections::BTreeMap, collections::BTreeSet, fmt::Debug};

use datasize::DataSize;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use rand::Rng;

use crate::{
    event::{EventKind, EventLog},
    types::{NodeId, NodeRng, Timestamp},
};
use queue::{Queue, QueueEntry};

/// The kinds of protocol message carried by the network, used for event
/// logging and deterministic fault injection.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, DataSize,
)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A proposed block.
    Proposal,
    /// A first-phase vote.
    Prevote,
    /// A second-phase vote.
    Precommit,
}

/// What the network needs to know about a payload to schedule and log it.
pub(crate) trait PayloadT: Clone + Debug + Eq {
    /// The message kind, for logging and fault injection.
    fn kind(&self) -> MessageKind;
    /// The height the message refers to, for logging.
    fn height(&self) -> u64;
}

/// A message in flight: the payload plus its sender.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Message<P>
where
    P: PayloadT,
{
    pub(crate) sender: NodeId,
    payload: P,
}

impl<P> Message<P>
where
    P: PayloadT,
{
    pub(crate) fn new(sender: NodeId, payload: P) -> Self {
        Message { sender, payload }
    }

    pub(crate) fn payload(&self) -> &P {
        &self.payload
    }

    pub(crate) fn into_payload(self) -> P {
        self.payload
    }
}

/// Configuration of the simulated network medium.
#[derive(Clone, Debug, Deserialize, Serialize, DataSize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Minimum delivery delay in ticks, inclusive. Must be at least 1.
    pub min_delay: u64,
    /// Maximum delivery delay in ticks, inclusive.
    pub max_delay: u64,
    /// Probability that a scheduled delivery is silently discarded.
    pub drop_rate: f64,
    /// Probability that a send schedules one additional independent copy.
    pub duplicate_rate: f64,
    /// Maximum deliveries per recipient per tick; excess deliveries are
    /// deferred to the next tick, preserving their relative order.
    pub rate_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_delay: 1,
            max_delay: 5,
            drop_rate: 0.05,
            duplicate_rate: 0.02,
            rate_limit: 100,
        }
    }
}

/// The simulated network: owns the pending-delivery queue.
#[derive(Debug)]
pub(crate) struct NetworkSimulator<P>
where
    P: PayloadT,
{
    config: Config,
    msg_queue: Queue<P>,
    /// Monotone sequence assigned at enqueue time; the deterministic
    /// tie-breaker within a tick.
    next_seq: u64,
    /// All registered nodes, sorted; broadcast targets.
    nodes: Vec<NodeId>,
    /// Forced-drop rules for deterministic fault injection: deliveries of the
    /// given kind to the given recipient never arrive.
    blocked: BTreeSet<(MessageKind, NodeId)>,
}

impl<P> NetworkSimulator<P>
where
    P: PayloadT,
{
    pub(crate) fn new(config: Config, mut nodes: Vec<NodeId>) -> Self {
        nodes.sort_unstable();
        NetworkSimulator {
            config,
            msg_queue: Queue::default(),
            next_seq: 0,
            nodes,
            blocked: BTreeSet::new(),
        }
    }

    /// Force-drops all future deliveries of `kind` addressed to `recipient`.
    pub(crate) fn block_deliveries(&mut self, kind: MessageKind, recipient: NodeId) {
        self.blocked.insert((kind, recipient));
    }

    /// True iff no deliveries are pending.
    pub(crate) fn is_idle(&self) -> bool {
        self.msg_queue.is_empty()
    }

    /// Hands a message to the network for delivery to every node except the
    /// sender. Each link draws its own delay/drop/duplication independently.
    pub(crate) fn broadcast(
        &mut self,
        now: Timestamp,
        sender: NodeId,
        payload: P,
        rng: &mut NodeRng,
        events: &mut EventLog,
    ) {
        events.record(
            now,
            EventKind::MessageSent {
                sender,
                kind: payload.kind(),
                height: payload.height(),
            },
        );
        let recipients: Vec<NodeId> = self
            .nodes
            .iter()
            .copied()
            .filter(|node_id| *node_id != sender)
            .collect();
        for recipient in recipients {
            self.schedule(now, sender, recipient, payload.clone(), rng, events);
        }
    }

    /// Hands a message to the network for delivery to a single node.
    pub(crate) fn send(
        &mut self,
        now: Timestamp,
        sender: NodeId,
        recipient: NodeId,
        payload: P,
        rng: &mut NodeRng,
        events: &mut EventLog,
    ) {
        events.record(
            now,
            EventKind::MessageSent {
                sender,
                kind: payload.kind(),
                height: payload.height(),
            },
        );
        self.schedule(now, sender, recipient, payload, rng, events);
    }

    fn schedule(
        &mut self,
        now: Timestamp,
        sender: NodeId,
        recipient: NodeId,
        payload: P,
        rng: &mut NodeRng,
        events: &mut EventLog,
    ) {
        if self.blocked.contains(&(payload.kind(), recipient)) {
            trace!(%sender, %recipient, kind = ?payload.kind(), "delivery blocked by fault rule");
            events.record(
                now,
                EventKind::MessageDropped {
                    sender,
                    recipient,
                    kind: payload.kind(),
                    height: payload.height(),
                },
            );
            return;
        }

        if rng.gen_bool(self.config.drop_rate) {
            trace!(%sender, %recipient, kind = ?payload.kind(), "message dropped");
            events.record(
                now,
                EventKind::MessageDropped {
                    sender,
                    recipient,
                    kind: payload.kind(),
                    height: payload.height(),
                },
            );
            return;
        }

        let delay = rng.gen_range(self.config.min_delay..=self.config.max_delay);
        self.enqueue(now + delay, recipient, Message::new(sender, payload.clone()));

        // An independent second copy, itself subject to drop and delay.
        if rng.gen_bool(self.config.duplicate_rate) {
            events.record(
                now,
                EventKind::MessageDuplicated {
                    sender,
                    recipient,
                    kind: payload.kind(),
                    height: payload.height(),
                },
            );
            if rng.gen_bool(self.config.drop_rate) {
                events.record(
                    now,
                    EventKind::MessageDropped {
                        sender,
                        recipient,
                        kind: payload.kind(),
                        height: payload.height(),
                    },
                );
            } else {
                let dup_delay = rng.gen_range(self.config.min_delay..=self.config.max_delay);
                self.enqueue(now + dup_delay, recipient, Message::new(sender, payload));
            }
        }
    }

    fn enqueue(&mut self, delivery_tick: Timestamp, recipient: NodeId, message: Message<P>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.msg_queue
            .push(QueueEntry::new(delivery_tick, recipient, seq, message));
    }

    /// Delivers every message due at `tick` or earlier, in deterministic
    /// order, at most `rate_limit` per recipient; excess deliveries are
    /// deferred to the next tick, preserving their relative order.
    pub(crate) fn advance(
        &mut self,
        tick: Timestamp,
        events: &mut EventLog,
    ) -> Vec<(NodeId, Message<P>)> {
        let mut delivered = Vec::new();
        let mut deferred = Vec::new();
        let mut per_recipient: BTreeMap<NodeId, u32> = BTreeMap::new();

        while self
            .msg_queue
            .next_due()
            .map_or(false, |due| due <= tick)
        {
            let entry = self.msg_queue.pop().expect("peeked entry must exist");
            let count = per_recipient.entry(entry.recipient).or_insert(0);
            if *count >= self.config.rate_limit {
                debug!(recipient = %entry.recipient, "rate limit exceeded, deferring delivery");
                events.record(
                    tick,
                    EventKind::DeliveryDeferred {
                        recipient: entry.recipient,
                        kind: entry.message.payload().kind(),
                        height: entry.message.payload().height(),
                    },
                );
                deferred.push(entry);
                continue;
            }
            *count += 1;
            events.record(
                tick,
                EventKind::MessageDelivered {
                    sender: entry.message.sender,
                    recipient: entry.recipient,
                    kind: entry.message.payload().kind(),
                    height: entry.message.payload().height(),
                },
            );
            delivered.push((entry.recipient, entry.message));
        }

        // Re-enqueued in pop order with fresh sequence numbers, so the
        // deferred messages keep their relative order on the next tick.
        for entry in deferred {
            self.enqueue(tick + 1, entry.recipient, entry.message);
        }

        delivered
    }
}
