use thiserror::Error;

/// Possible hashing errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The value could not be serialized to canonical JSON.
    #[error("could not serialize value to canonical JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
