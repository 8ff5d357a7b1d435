use crate::traits::ValueKind;

/// Errors from key-value driver operations.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// I/O error from the filesystem driver.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record failed its integrity check or could not be decoded.
    #[error("corrupt record {key:?} in namespace {namespace:?}: {reason}")]
    Corrupt {
        namespace: String,
        key: String,
        reason: String,
    },

    /// The value under `key` has a different kind than the caller asked for.
    #[error("value {key:?} is {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The namespace name is not usable.
    #[error("invalid namespace {name:?}: {reason}")]
    InvalidNamespace { name: String, reason: String },

    /// Keys must be non-empty.
    #[error("empty key")]
    EmptyKey,

    /// The key cannot be represented by this driver.
    #[error("key too long for this driver ({len} bytes, max {max})")]
    KeyTooLong { len: usize, max: usize },

    /// An internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Result alias for key-value operations.
pub type KvResult<T> = Result<T, KvError>;
