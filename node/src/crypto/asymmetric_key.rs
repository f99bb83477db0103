//! Asymmetric-key types and functions. Ed25519 only.

use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

use datasize::DataSize;
use ed25519_dalek::Signer as _;
use hex_fmt::HexFmt;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::Error;
use crate::types::NodeRng;

/// A secret or private asymmetric key.
pub struct SecretKey(ed25519_dalek::SigningKey);

impl SecretKey {
    /// The length in bytes of an Ed25519 secret key.
    pub const LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;

    /// Generates a new secret key from the given source of randomness.
    ///
    /// All key material in a simulation is derived from the single seeded
    /// generator, so key generation order is part of the determinism contract.
    pub fn generate(rng: &mut NodeRng) -> Self {
        SecretKey(ed25519_dalek::SigningKey::generate(rng))
    }

    /// Constructs a secret key from a byte array.
    pub fn from_bytes(bytes: &[u8; Self::LENGTH]) -> Self {
        SecretKey(ed25519_dalek::SigningKey::from_bytes(bytes))
    }

    /// Returns the public key corresponding to this secret key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Signs a raw message. Callers should go through
    /// [`sign_value`](super::sign_value) so every signature is domain-separated.
    pub(crate) fn sign_bytes(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "SecretKey(<REDACTED>)")
    }
}

impl DataSize for SecretKey {
    const IS_DYNAMIC: bool = false;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        0
    }
}

/// A public asymmetric key.
#[derive(Copy, Clone)]
pub struct PublicKey(ed25519_dalek::VerifyingKey);

impl PublicKey {
    /// The length in bytes of an Ed25519 public key.
    pub const LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

    /// Returns the byte representation.
    pub fn to_bytes(self) -> [u8; Self::LENGTH] {
        self.0.to_bytes()
    }

    /// Constructs a public key from a byte array.
    pub fn from_bytes(bytes: &[u8; Self::LENGTH]) -> Result<Self, Error> {
        ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(PublicKey)
            .map_err(|error| Error::Encoding(error.to_string()))
    }

    /// Verifies a raw message. Callers should go through
    /// [`verify_value`](super::verify_value).
    pub(crate) fn verify_bytes(&self, message: &[u8], signature: &Signature) -> Result<(), Error> {
        self.0
            .verify_strict(message, &signature.0)
            .map_err(|_| Error::SignatureInvalid)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "PubKey({:10})", HexFmt(&self.to_bytes()))
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "PublicKey({})", HexFmt(&self.to_bytes()))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        let bytes = hex::decode(&hex_str).map_err(de::Error::custom)?;
        let array: [u8; Self::LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| de::Error::custom("wrong public key length"))?;
        PublicKey::from_bytes(&array).map_err(de::Error::custom)
    }
}

impl DataSize for PublicKey {
    const IS_DYNAMIC: bool = false;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        0
    }
}

/// An Ed25519 signature.
#[derive(Copy, Clone)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    /// The length in bytes of an Ed25519 signature.
    pub const LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

    /// Returns the byte representation.
    pub fn to_bytes(self) -> [u8; Self::LENGTH] {
        self.0.to_bytes()
    }

    /// Constructs a signature from a byte array.
    pub fn from_bytes(bytes: &[u8; Self::LENGTH]) -> Self {
        Signature(ed25519_dalek::Signature::from_bytes(bytes))
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes()[..] == other.to_bytes()[..]
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Sig({:10})", HexFmt(&self.to_bytes()))
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Signature({})", HexFmt(&self.to_bytes()))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        let bytes = hex::decode(&hex_str).map_err(de::Error::custom)?;
        let array: [u8; Self::LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| de::Error::custom("wrong signature length"))?;
        Ok(Signature::from_bytes(&array))
    }
}

impl DataSize for Signature {
    const IS_DYNAMIC: bool = false;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::{PublicKey, SecretKey, Signature};
    use crate::types::NodeRng;

    #[test]
    fn sign_and_verify_roundtrip() {
        let mut rng = NodeRng::seed_from_u64(7);
        let secret_key = SecretKey::generate(&mut rng);
        let public_key = secret_key.public_key();

        let signature = secret_key.sign_bytes(b"payload");
        assert!(public_key.verify_bytes(b"payload", &signature).is_ok());
        assert!(public_key.verify_bytes(b"other payload", &signature).is_err());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let mut rng = NodeRng::seed_from_u64(8);
        let secret_key = SecretKey::generate(&mut rng);
        let public_key = secret_key.public_key();

        let signature = secret_key.sign_bytes(b"payload");
        let mut bytes = signature.to_bytes();
        bytes[0] ^= 0x01;
        let tampered = Signature::from_bytes(&bytes);
        assert!(public_key.verify_bytes(b"payload", &tampered).is_err());
    }

    #[test]
    fn wrong_key_is_rejected() {
        let mut rng = NodeRng::seed_from_u64(9);
        let signer = SecretKey::generate(&mut rng);
        let other = SecretKey::generate(&mut rng);

        let signature = signer.sign_bytes(b"payload");
        assert!(other
            .public_key()
            .verify_bytes(b"payload", &signature)
            .is_err());
    }

    #[test]
    fn key_generation_is_deterministic() {
        let mut rng1 = NodeRng::seed_from_u64(42);
        let mut rng2 = NodeRng::seed_from_u64(42);
        let key1 = SecretKey::generate(&mut rng1);
        let key2 = SecretKey::generate(&mut rng2);
        assert_eq!(key1.public_key(), key2.public_key());
    }

    #[test]
    fn public_key_serde_roundtrip() {
        let mut rng = NodeRng::seed_from_u64(10);
        let public_key = SecretKey::generate(&mut rng).public_key();
        let json = serde_json::to_string(&public_key).unwrap();
        let deserialized: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(public_key, deserialized);
    }
}
