//! Error taxonomy shared by every adapter operation.

use blockgate_kv::KvError;
use blockgate_uri::ParseError;
use thiserror::Error;

/// Errors returned by [`Gateway`](crate::Gateway) and
/// [`KeyBagProvider`](crate::KeyBagProvider) operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The requested block does not exist. Expected on cache misses.
    #[error("missing db block {key}")]
    NotFound { key: String },

    /// The physical namespace could not be opened or created.
    #[error("failed to open store {name:?}: {source}")]
    StoreOpen {
        name: String,
        #[source]
        source: KvError,
    },

    #[error("failed to write {key:?} to {name:?}: {source}")]
    Write {
        name: String,
        key: String,
        #[source]
        source: KvError,
    },

    #[error("failed to read {key:?} from {name:?}: {source}")]
    Read {
        name: String,
        key: String,
        #[source]
        source: KvError,
    },

    #[error("failed to delete {key:?} from {name:?}: {source}")]
    Delete {
        name: String,
        key: String,
        #[source]
        source: KvError,
    },

    #[error("failed to close {name:?}: {source}")]
    Close {
        name: String,
        #[source]
        source: KvError,
    },

    #[error("failed to destroy {name:?}: {source}")]
    Destroy {
        name: String,
        #[source]
        source: KvError,
    },

    /// Block I/O was attempted before `start`.
    #[error("gateway not started")]
    NotStarted,

    /// The locator is malformed or lacks a required parameter.
    #[error("locator error: {0}")]
    Parse(#[from] ParseError),

    /// A naming component cannot be used to derive a physical namespace.
    #[error("invalid {param} {value:?}: {reason}")]
    InvalidName {
        param: String,
        value: String,
        reason: String,
    },

    /// The store was written by an incompatible layout version.
    #[error("store version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    /// A key item could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GatewayError {
    /// Returns `true` for [`GatewayError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for adapter operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
