use datasize::DataSize;

use crate::types::{NodeId, Vote};

/// A reason for a validator to be considered faulty.
#[derive(Clone, Debug, Eq, PartialEq, DataSize)]
pub(crate) enum Fault {
    /// The validator cast two conflicting votes in the same slot. Both signed
    /// votes are retained as evidence; only the first ever counted.
    Equivocated {
        /// The vote that was recorded first and stays counted.
        first: Vote,
        /// The conflicting later vote.
        second: Vote,
    },
}

impl Fault {
    /// The faulty validator.
    pub(crate) fn voter(&self) -> NodeId {
        match self {
            Fault::Equivocated { first, .. } => first.voter(),
        }
    }
}
