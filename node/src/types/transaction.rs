use datasize::DataSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use chainsim_hashing::{hash_canonical, Digest};

use crate::crypto::{
    self, sign_value, verify_value, PublicKey, SecretKey, Signature, SigningDomain,
};

/// Reasons a transaction is rejected.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransactionError {
    /// The written key does not live under the sender's namespace.
    #[error("transaction key {key:?} is outside the {sender:?} namespace")]
    ForeignKey { sender: String, key: String },

    /// The signature does not verify.
    #[error("invalid transaction signature: {0}")]
    InvalidSignature(#[from] crypto::Error),
}

/// A signed key-value write.
///
/// A transaction is only valid if its key lives under the sender's own
/// namespace (`"{sender}/..."`), so an account can never overwrite another
/// account's entries.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, DataSize)]
pub struct Transaction {
    sender: String,
    key: String,
    value: String,
    public_key: PublicKey,
    signature: Signature,
}

/// The signed portion of a transaction.
#[derive(Serialize)]
struct TransactionClaim<'a> {
    sender: &'a str,
    key: &'a str,
    value: &'a str,
}

impl Transaction {
    /// Creates and signs a new transaction.
    pub fn new<S1, S2, S3>(
        sender: S1,
        key: S2,
        value: S3,
        secret_key: &SecretKey,
        chain_id: &str,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        let sender = sender.into();
        let key = key.into();
        let value = value.into();
        let signature = sign_value(
            SigningDomain::Transaction,
            chain_id,
            &TransactionClaim {
                sender: &sender,
                key: &key,
                value: &value,
            },
            secret_key,
        );
        Transaction {
            sender,
            key,
            value,
            public_key: secret_key.public_key(),
            signature,
        }
    }

    /// Checks the namespace rule and the signature.
    pub fn verify(&self, chain_id: &str) -> Result<(), TransactionError> {
        if !self.key.starts_with(&format!("{}/", self.sender)) {
            return Err(TransactionError::ForeignKey {
                sender: self.sender.clone(),
                key: self.key.clone(),
            });
        }
        verify_value(
            SigningDomain::Transaction,
            chain_id,
            &TransactionClaim {
                sender: &self.sender,
                key: &self.key,
                value: &self.value,
            },
            &self.signature,
            &self.public_key,
        )?;
        Ok(())
    }

    /// The canonical hash identifying this transaction.
    pub fn hash(&self) -> Digest {
        hash_canonical(self).expect("failed to serialize transaction")
    }

    /// The sending account.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The written key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The written value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::{Transaction, TransactionError};
    use crate::{crypto::SecretKey, types::NodeRng};

    const CHAIN_ID: &str = "test-chain";

    #[test]
    fn valid_transaction_verifies() {
        let mut rng = NodeRng::seed_from_u64(1);
        let secret_key = SecretKey::generate(&mut rng);
        let tx = Transaction::new("alice", "alice/balance", "100", &secret_key, CHAIN_ID);
        assert!(tx.verify(CHAIN_ID).is_ok());
    }

    #[test]
    fn foreign_key_is_rejected() {
        let mut rng = NodeRng::seed_from_u64(2);
        let secret_key = SecretKey::generate(&mut rng);
        let tx = Transaction::new("alice", "bob/balance", "100", &secret_key, CHAIN_ID);
        assert!(matches!(
            tx.verify(CHAIN_ID),
            Err(TransactionError::ForeignKey { .. })
        ));
    }

    #[test]
    fn wrong_chain_id_is_rejected() {
        let mut rng = NodeRng::seed_from_u64(3);
        let secret_key = SecretKey::generate(&mut rng);
        let tx = Transaction::new("alice", "alice/balance", "100", &secret_key, CHAIN_ID);
        assert!(matches!(
            tx.verify("other-chain"),
            Err(TransactionError::InvalidSignature(_))
        ));
    }

    #[test]
    fn tampered_value_is_rejected() {
        let mut rng = NodeRng::seed_from_u64(4);
        let secret_key = SecretKey::generate(&mut rng);
        let tx = Transaction::new("alice", "alice/balance", "100", &secret_key, CHAIN_ID);
        let mut tampered = tx;
        tampered.value = "999".to_string();
        assert!(matches!(
            tampered.verify(CHAIN_ID),
            Err(TransactionError::InvalidSignature(_))
        ));
    }
}
