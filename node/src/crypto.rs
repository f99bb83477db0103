//! Cryptographic primitives: Ed25519 keys and domain-separated signing.

pub mod asymmetric_key;
mod signer;

use thiserror::Error;

pub use asymmetric_key::{PublicKey, SecretKey, Signature};
pub use signer::{sign_value, verify_value, SigningDomain};

/// Cryptographic errors. All of them are local to a single message and
/// recoverable; a failed verification never aborts the simulation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The signature does not verify against the given public key and payload.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// A key or signature could not be decoded from its byte representation.
    #[error("invalid asymmetric key or signature encoding: {0}")]
    Encoding(String),
}
