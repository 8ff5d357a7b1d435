//! Resolve-once store handles.
//!
//! Every adapter instance owns exactly one [`StoreHandle`]. The first caller
//! runs the open; callers arriving while it is in flight wait for the same
//! result instead of opening a second connection. A failed open leaves the
//! handle empty so the next call tries again.

use std::sync::Arc;

use blockgate_kv::{KvBackend, KvStore};
use tokio::sync::OnceCell;

use crate::error::{GatewayError, GatewayResult};

/// Lazily opened, memoised connection to one physical namespace.
#[derive(Debug, Default)]
pub struct StoreHandle {
    cell: OnceCell<Arc<dyn KvStore>>,
}

impl StoreHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The open store, if any.
    pub fn get(&self) -> Option<Arc<dyn KvStore>> {
        self.cell.get().cloned()
    }

    pub fn is_open(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the open store, running `open` first if nothing is open yet.
    pub async fn get_or_open<F>(&self, open: F) -> GatewayResult<Arc<dyn KvStore>>
    where
        F: FnOnce() -> GatewayResult<Arc<dyn KvStore>> + Send,
    {
        let store = self.cell.get_or_try_init(|| async move { open() }).await?;
        Ok(Arc::clone(store))
    }
}

/// Open `name` on `backend`, mapping failure to [`GatewayError::StoreOpen`].
pub fn open_namespace(backend: &dyn KvBackend, name: &str) -> GatewayResult<Arc<dyn KvStore>> {
    backend.open(name).map_err(|source| GatewayError::StoreOpen {
        name: name.to_string(),
        source,
    })
}
