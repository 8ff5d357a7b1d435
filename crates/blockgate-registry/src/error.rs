use blockgate_uri::ParseError;
use thiserror::Error;

/// Which registration table an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolKind {
    Store,
    KeyBag,
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store => f.write_str("store protocol"),
            Self::KeyBag => f.write_str("key bag provider"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The scheme is taken and the registration did not ask to overwrite.
    #[error("{kind} {protocol:?} is already registered")]
    Conflict { protocol: String, kind: ProtocolKind },

    #[error("no {kind} registered for {protocol:?}")]
    UnknownProtocol { protocol: String, kind: ProtocolKind },

    #[error("invalid protocol name: {0}")]
    InvalidProtocol(#[from] ParseError),

    #[error("registry lock poisoned: {0}")]
    Poisoned(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
