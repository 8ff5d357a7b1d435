//! Error types for locator parsing and parameter access.

use thiserror::Error;

/// Errors produced while parsing a locator or reading a required parameter.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The text has no `scheme://` prefix.
    #[error("missing scheme separator '://' in {input:?}")]
    MissingScheme { input: String },

    /// The scheme is empty or contains characters outside `[a-z0-9+.-]`.
    #[error("invalid scheme {scheme:?}: {reason}")]
    InvalidScheme { scheme: String, reason: String },

    /// A `%` escape is truncated, not hex, or decodes to invalid UTF-8.
    #[error("invalid percent escape in {input:?}")]
    InvalidEscape { input: String },

    /// A query parameter has an empty name (e.g. `?=value`).
    #[error("empty parameter name in {input:?}")]
    EmptyParamName { input: String },

    /// A parameter the consumer requires is absent.
    #[error("missing required parameter {param:?}")]
    MissingParam { param: String },

    /// The `store` parameter holds a value that is not a known store kind.
    #[error("unknown store kind {value:?}")]
    UnknownStoreKind { value: String },
}

/// Convenience type alias for locator operations.
pub type UriResult<T> = std::result::Result<T, ParseError>;
