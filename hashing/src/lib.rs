//! Hashing for the chain simulator.
//!
//! All identities in the system (block hashes, transaction roots, state
//! commitments, event log digests) are SHA-256 digests over a *canonical*
//! serialization: JSON with lexicographically sorted object keys and no
//! insignificant whitespace. Hashing the same logical value therefore always
//! yields the same digest, regardless of field declaration order.

mod error;

use std::{
    array::TryFromSliceError,
    convert::TryFrom,
    fmt::{self, Debug, Display, Formatter, LowerHex, UpperHex},
};

use datasize::DataSize;
use hex_buffer_serde::{Hex, HexForm};
use hex_fmt::HexFmt;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

pub use error::Error;

/// The hash digest; a wrapped `u8` array.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, DataSize)]
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Digest(#[serde(with = "HexForm::<[u8; Digest::LENGTH]>")] [u8; Digest::LENGTH]);

impl Digest {
    /// The number of bytes in a digest.
    pub const LENGTH: usize = 32;

    /// The all-zero digest, used as the parent hash of the first block.
    pub const GENESIS: Digest = Digest([0; Digest::LENGTH]);

    /// Creates a 32-byte SHA-256 digest of a given piece of data.
    pub fn hash<T: AsRef<[u8]>>(data: T) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Digest(hasher.finalize().into())
    }

    /// Hashes a pair of byte slices into a single digest.
    pub fn hash_pair<T: AsRef<[u8]>, U: AsRef<[u8]>>(data1: T, data2: U) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(data1);
        hasher.update(data2);
        Digest(hasher.finalize().into())
    }

    /// Returns a reference to the underlying value.
    pub fn inner(&self) -> &[u8; Digest::LENGTH] {
        &self.0
    }

    /// Converts the digest to a hex-encoded string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

/// Serializes `value` as canonical JSON: object keys sorted, compact
/// separators. Relies on `serde_json`'s default map representation being
/// ordered (the `preserve_order` feature must stay off).
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// Hashes the canonical JSON serialization of `value`.
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<Digest, Error> {
    Ok(Digest::hash(canonical_json(value)?))
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; Digest::LENGTH]> for Digest {
    fn from(arr: [u8; Digest::LENGTH]) -> Self {
        Digest(arr)
    }
}

impl From<Digest> for [u8; Digest::LENGTH] {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl<'a> TryFrom<&'a [u8]> for Digest {
    type Error = TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Digest, Self::Error> {
        <[u8; Digest::LENGTH]>::try_from(slice).map(Digest)
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:10}", HexFmt(&self.0))
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", HexFmt(&self.0))
    }
}

impl LowerHex for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", HexFmt(&self.0))
        } else {
            write!(f, "{}", HexFmt(&self.0))
        }
    }
}

impl UpperHex for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{:X}", HexFmt(&self.0))
        } else {
            write!(f, "{:X}", HexFmt(&self.0))
        }
    }
}
