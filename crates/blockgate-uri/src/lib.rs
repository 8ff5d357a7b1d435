//! Locators for the blockgate storage adapters.
//!
//! A [`Locator`] is the structured address the database engine hands to a
//! gateway: a lowercase scheme selecting the adapter, a path, and a map of
//! named parameters naming the logical database, the store kind, and
//! optionally one content key.
//!
//! ```text
//! kv://blockgate?name=mydb&index=byDate&store=data&key=bafy...&version=v0.1-kv
//! ```
//!
//! Locators are immutable values. [`Locator::build`] returns a
//! [`LocatorBuilder`] that produces a modified copy.
//!
//! # Modules
//!
//! - [`error`]: [`ParseError`] for malformed locator text and missing parameters
//! - [`locator`]: [`Locator`] and [`LocatorBuilder`]
//! - [`params`]: recognised parameter names and [`StoreKind`]
//! - [`encoding`]: percent-encoding of paths and parameter values

pub mod encoding;
pub mod error;
pub mod locator;
pub mod params;

pub use error::{ParseError, UriResult};
pub use locator::{normalize_scheme, Locator, LocatorBuilder};
pub use params::StoreKind;
