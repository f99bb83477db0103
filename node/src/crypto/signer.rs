//! Domain-separated signing over canonical JSON payloads.
//!
//! Every signature in the system is bound to a signing domain and a chain
//! identifier: the signed message is `"{domain}:{chain_id}:{canonical JSON}"`.
//! A transaction signature can therefore never be replayed as a vote, nor can
//! any signature be replayed on a different chain.

use serde::Serialize;

use chainsim_hashing::canonical_json;

use super::{
    asymmetric_key::{PublicKey, SecretKey, Signature},
    Error,
};

/// The context a signature is bound to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SigningDomain {
    /// Transaction signatures.
    Transaction,
    /// Block header signatures created by the proposer.
    BlockHeader,
    /// Prevote and precommit signatures.
    Vote,
}

impl SigningDomain {
    fn tag(self) -> &'static str {
        match self {
            SigningDomain::Transaction => "TX",
            SigningDomain::BlockHeader => "HEADER",
            SigningDomain::Vote => "VOTE",
        }
    }
}

fn signing_message<T: Serialize>(domain: SigningDomain, chain_id: &str, payload: &T) -> Vec<u8> {
    // Our payloads are plain in-memory structs; serialization cannot fail.
    let json = canonical_json(payload).expect("failed to serialize signing payload");
    format!("{}:{}:{}", domain.tag(), chain_id, json).into_bytes()
}

/// Signs the canonical JSON serialization of `payload` under the given domain.
pub fn sign_value<T: Serialize>(
    domain: SigningDomain,
    chain_id: &str,
    payload: &T,
    secret_key: &SecretKey,
) -> Signature {
    secret_key.sign_bytes(&signing_message(domain, chain_id, payload))
}

/// Verifies a domain-separated signature over the canonical JSON serialization
/// of `payload`.
pub fn verify_value<T: Serialize>(
    domain: SigningDomain,
    chain_id: &str,
    payload: &T,
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<(), Error> {
    public_key.verify_bytes(&signing_message(domain, chain_id, payload), signature)
}
