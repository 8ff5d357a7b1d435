//! Storage adapters for a content-addressed document database.
//!
//! The database engine talks to physical storage through two small
//! contracts:
//!
//! - [`Gateway`]: content-addressed block I/O plus the
//!   `start`/`close`/`destroy` lifecycle of one logical database.
//! - [`KeyBagProvider`]: persisted key records consumed by the encryption
//!   layer.
//!
//! [`KvGateway`] and [`KvKeyBagProvider`] implement both over any
//! [`blockgate_kv::KvBackend`].
//!
//! # Addressing
//!
//! A base locator such as `kv://blockgate?name=mydb&store=data` selects one
//! logical database. Its physical namespace is derived by [`db_name`]:
//! `name`, the optional `index`, and `store` joined with `-`
//! (`mydb-data`, `mydb-byDate-data`). The `key` parameter of a block locator
//! names one block inside it.
//!
//! # Design Rules
//!
//! 1. A missing block is [`GatewayError::NotFound`]; every other read
//!    failure is [`GatewayError::Read`].
//! 2. `destroy` and `delete` are idempotent.
//! 3. Each adapter instance opens its store at most once; concurrent first
//!    callers share the same open.
//! 4. Block I/O before `start` fails with [`GatewayError::NotStarted`].
//! 5. Nothing is retried.

pub mod error;
pub mod gateway;
pub mod handle;
pub mod key_item;
pub mod keybag;
pub mod naming;
pub mod traits;
pub mod version;

pub use error::{GatewayError, GatewayResult};
pub use gateway::{KvGateway, KvTestGateway};
pub use key_item::{KeyItem, RESERVED_FIELDS};
pub use keybag::KvKeyBagProvider;
pub use naming::{
    content_key, db_name, keybag_namespace, DEFAULT_KEYBAG_NAMESPACE, KEYBAG_NAMESPACE_PREFIX,
    NAME_DELIMITER,
};
pub use traits::{Gateway, KeyBagProvider, TestGateway};
pub use version::{ensure_version, KV_STORE_VERSION};
