//! Recognised locator parameters.
//!
//! The locator itself accepts any parameter name. These are the ones the
//! storage adapters consume; each adapter validates them where it reads them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Logical database name.
pub const NAME: &str = "name";
/// Optional index name within the logical database.
pub const INDEX: &str = "index";
/// Store kind discriminator, see [`StoreKind`].
pub const STORE: &str = "store";
/// Content key of a single block.
pub const KEY: &str = "key";
/// On-disk layout version tag set by `start`.
pub const VERSION: &str = "version";

/// The kinds of store a database engine addresses through one gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Content-addressed data blocks.
    Data,
    /// Metadata heads.
    Meta,
    /// Write-ahead log entries.
    Wal,
}

impl StoreKind {
    /// All store kinds in declaration order.
    pub const ALL: [StoreKind; 3] = [StoreKind::Data, StoreKind::Meta, StoreKind::Wal];

    /// The parameter value for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Meta => "meta",
            Self::Wal => "wal",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(Self::Data),
            "meta" => Ok(Self::Meta),
            "wal" => Ok(Self::Wal),
            other => Err(ParseError::UnknownStoreKind {
                value: other.to_string(),
            }),
        }
    }
}
