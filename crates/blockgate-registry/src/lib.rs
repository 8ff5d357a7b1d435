//! Protocol registry for the blockgate adapters.
//!
//! The database engine resolves a locator to an adapter by its scheme. A
//! [`ProtocolRegistry`] holds two tables keyed by lowercase scheme: store
//! protocols (gateway plus test gateway factories and an optional default
//! base locator) and key bag providers.
//!
//! ```rust
//! use std::sync::Arc;
//! use blockgate_kv::MemoryBackend;
//! use blockgate_registry::{register_kv_protocol, ProtocolRegistry};
//!
//! let registry = ProtocolRegistry::new();
//! register_kv_protocol(&registry, Arc::new(MemoryBackend::new()), false).unwrap();
//! assert_eq!(registry.protocols().unwrap(), vec!["kv"]);
//! ```

pub mod error;
pub mod kv;
pub mod registry;

pub use error::{ProtocolKind, RegistryError, RegistryResult};
pub use kv::{register_kv_protocol, DEFAULT_KV_BASE, KV_SCHEME};
pub use registry::{
    GatewayFactory, KeyBagFactory, KeyBagProtocol, ProtocolRegistry, StoreProtocol,
    TestGatewayFactory,
};
