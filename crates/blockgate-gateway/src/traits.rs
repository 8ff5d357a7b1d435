//! The adapter contracts the database engine programs against.

use async_trait::async_trait;
use blockgate_uri::{params::KEY, Locator};

use crate::error::GatewayResult;
use crate::key_item::KeyItem;

/// Content-addressed block storage for one logical database.
///
/// Implementations must be `Send + Sync`; the engine may share one gateway
/// across tasks. Operations issued sequentially by one caller observe
/// program order. No operation retries internally.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `base` with its `key` parameter set to `key`.
    fn build_url(&self, base: &Locator, key: &str) -> Locator {
        base.build().set_param(KEY, key).locator()
    }

    /// Open the physical store for `base`'s logical database.
    ///
    /// Idempotent: once the store is open, later calls return immediately.
    /// Returns `base` with the adapter's `version` parameter set.
    async fn start(&self, base: &Locator) -> GatewayResult<Locator>;

    /// Release transient resources. Persisted data is kept. Safe to repeat.
    async fn close(&self, locator: &Locator) -> GatewayResult<()>;

    /// Erase every block in the logical database. Destroying an empty or
    /// already-destroyed store succeeds.
    async fn destroy(&self, locator: &Locator) -> GatewayResult<()>;

    /// Write `body` under the locator's content key, overwriting.
    async fn put(&self, locator: &Locator, body: &[u8]) -> GatewayResult<()>;

    /// Read the bytes last written under the locator's content key.
    ///
    /// Returns [`GatewayError::NotFound`](crate::GatewayError::NotFound) when
    /// no block exists; any other failure is a distinct variant.
    async fn get(&self, locator: &Locator) -> GatewayResult<Vec<u8>>;

    /// Remove the block under the locator's content key. Removing a missing
    /// block succeeds.
    async fn delete(&self, locator: &Locator) -> GatewayResult<()>;
}

/// Direct block access for test harnesses.
#[async_trait]
pub trait TestGateway: Send + Sync {
    /// Read block `key` from `base`'s logical database without going through
    /// a started [`Gateway`].
    async fn get_plain(&self, base: &Locator, key: &str) -> GatewayResult<Vec<u8>>;
}

/// Persisted key records for the encryption layer.
#[async_trait]
pub trait KeyBagProvider: Send + Sync {
    /// Look up the record stored under `id`. An unknown id is `Ok(None)`.
    async fn get(&self, id: &str) -> GatewayResult<Option<KeyItem>>;

    /// Store `item` under `id`, replacing any previous record.
    async fn set(&self, id: &str, item: &KeyItem) -> GatewayResult<()>;
}
