/// Failure to turn persisted bytes back into a cache entry.
///
/// Callers treat both variants as "entry absent", never as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not a valid record (bad JSON, bad run-length data,
    /// or an item that does not match the expected value type).
    #[error("malformed cache record: {0}")]
    Malformed(String),
    /// The record carries a format version this build does not read.
    #[error("unsupported cache record version: {0}")]
    UnsupportedVersion(String),
}

/// Failure to serialize an entry for the persistent tier.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode cache entry: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);

/// Failure reported by a persistent storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend cannot be used (probe failure, I/O error).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The write would push the backend past its byte quota.
    #[error("storage quota exceeded: {requested} bytes requested, quota is {quota} bytes")]
    QuotaExceeded { requested: usize, quota: usize },
}

/// Failure to copy an entry into the persistent tier.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}
