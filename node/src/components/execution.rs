//! The execution collaborator: a deterministic key-value state machine.
//!
//! Applying the same ordered transaction batch to the same state always
//! yields the same post-state, and the state commitment is the SHA-256 hash
//! of the canonical sorted-key JSON of the map, so identical transaction
//! order always yields an identical root on every node.

use std::collections::BTreeMap;

use datasize::DataSize;
use serde::Serialize;

use chainsim_hashing::{hash_canonical, Digest};

use crate::types::{Transaction, TransactionError};

/// The global key-value state of the chain.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, DataSize)]
pub(crate) struct State {
    data: BTreeMap<String, String>,
}

impl State {
    pub(crate) fn new() -> Self {
        State::default()
    }

    /// Looks up a key.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// The number of entries.
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    /// Verifies and applies a single transaction in place.
    pub(crate) fn apply_transaction(
        &mut self,
        transaction: &Transaction,
        chain_id: &str,
    ) -> Result<(), TransactionError> {
        transaction.verify(chain_id)?;
        self.data
            .insert(transaction.key().to_string(), transaction.value().to_string());
        Ok(())
    }

    /// Applies an ordered batch to a copy of this state; fails on the first
    /// invalid transaction. Returns the post-state and its commitment.
    pub(crate) fn execute(
        &self,
        transactions: &[Transaction],
        chain_id: &str,
    ) -> Result<(State, Digest), TransactionError> {
        let mut next = self.clone();
        for transaction in transactions {
            next.apply_transaction(transaction, chain_id)?;
        }
        let root = next.commitment();
        Ok((next, root))
    }

    /// Applies a batch to a copy of this state, silently skipping invalid
    /// transactions. Used by proposers to assemble a fully valid block.
    pub(crate) fn speculate(
        &self,
        transactions: Vec<Transaction>,
        chain_id: &str,
    ) -> (State, Vec<Transaction>) {
        let mut next = self.clone();
        let mut applied = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            if next.apply_transaction(&transaction, chain_id).is_ok() {
                applied.push(transaction);
            }
        }
        (next, applied)
    }

    /// The commitment hash over the current state.
    pub(crate) fn commitment(&self) -> Digest {
        hash_canonical(&self.data).expect("failed to serialize state")
    }
}
