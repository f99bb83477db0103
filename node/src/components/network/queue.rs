use std::{cmp::Ordering, collections::BinaryHeap};

use crate::types::{NodeId, Timestamp};

use super::{Message, PayloadT};

/// An entry in the pending-delivery queue of the simulated network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct QueueEntry<P>
where
    P: PayloadT,
{
    /// Tick at which the message becomes deliverable.
    pub(crate) delivery_tick: Timestamp,
    /// Recipient of the message.
    pub(crate) recipient: NodeId,
    /// Enqueue sequence number; the deterministic tie-breaker, so iteration
    /// order is a pure function of the enqueue order.
    pub(crate) seq: u64,
    /// The message.
    pub(crate) message: Message<P>,
}

impl<P> QueueEntry<P>
where
    P: PayloadT,
{
    pub(crate) fn new(
        delivery_tick: Timestamp,
        recipient: NodeId,
        seq: u64,
        message: Message<P>,
    ) -> Self {
        QueueEntry {
            delivery_tick,
            recipient,
            seq,
            message,
        }
    }
}

impl<P> Ord for QueueEntry<P>
where
    P: PayloadT,
{
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the binary heap pops the entry with the smallest
        // (delivery tick, recipient, sequence number) first.
        (other.delivery_tick, other.recipient, other.seq).cmp(&(
            self.delivery_tick,
            self.recipient,
            self.seq,
        ))
    }
}

impl<P> PartialOrd for QueueEntry<P>
where
    P: PayloadT,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of messages scheduled for delivery, ordered by delivery
/// tick with deterministic tie-breaking.
#[derive(Debug)]
pub(crate) struct Queue<P>(BinaryHeap<QueueEntry<P>>)
where
    P: PayloadT;

impl<P> Default for Queue<P>
where
    P: PayloadT,
{
    fn default() -> Self {
        Queue(Default::default())
    }
}

impl<P> Queue<P>
where
    P: PayloadT,
{
    /// Gets the next message; `None` if there aren't any.
    pub(crate) fn pop(&mut self) -> Option<QueueEntry<P>> {
        self.0.pop()
    }

    /// Pushes a new message onto the queue.
    pub(crate) fn push(&mut self, item: QueueEntry<P>) {
        self.0.push(item)
    }

    /// The delivery tick of the next due entry, if any.
    pub(crate) fn next_due(&self) -> Option<Timestamp> {
        self.0.peek().map(|entry| entry.delivery_tick)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
