//! Embedded key-value store drivers for blockgate.
//!
//! The storage adapters in `blockgate-gateway` sit on top of a small,
//! synchronous key-value interface: a [`KvBackend`] opens named namespaces,
//! and each namespace is a [`KvStore`] mapping string keys to either raw
//! bytes or UTF-8 strings.
//!
//! # Backends
//!
//! - [`MemoryBackend`]: process-local namespaces behind `RwLock`s, for tests
//!   and embedding. Opening the same namespace twice yields the same store.
//! - [`FsBackend`]: one directory per namespace, one checksummed file per
//!   key, written atomically via rename.
//!
//! # Design Rules
//!
//! 1. A missing key is `Ok(None)`, never an error.
//! 2. A key that exists but cannot be decoded is an error, never `None`.
//! 3. Deleting a missing key succeeds and reports `false`.
//! 4. Drivers synchronize internally; callers add no locking.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{KvError, KvResult};
pub use fs::{FsBackend, FsStore, SyncMode};
pub use memory::{MemoryBackend, MemoryStore};
pub use traits::{validate_namespace, KvBackend, KvStore, KvValue, ValueKind};
