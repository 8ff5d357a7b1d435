use std::sync::Arc;

use async_trait::async_trait;
use blockgate_kv::{KvBackend, KvStore};
use blockgate_uri::{params::VERSION, Locator};
use tracing::{debug, Span};

use crate::error::{GatewayError, GatewayResult};
use crate::handle::{open_namespace, StoreHandle};
use crate::naming::{content_key, db_name};
use crate::traits::{Gateway, TestGateway};
use crate::version::KV_STORE_VERSION;

/// Block gateway over an embedded key-value store.
///
/// One instance serves one logical database: the first `start` derives the
/// namespace from the base locator and opens it; the handle then lives as
/// long as the gateway. `destroy` empties the namespace but keeps the handle.
pub struct KvGateway {
    backend: Arc<dyn KvBackend>,
    handle: StoreHandle,
    span: Span,
}

impl KvGateway {
    /// Create an unstarted gateway. Its log events are children of `parent`.
    pub fn new(backend: Arc<dyn KvBackend>, parent: &Span) -> Self {
        Self {
            backend,
            handle: StoreHandle::new(),
            span: tracing::info_span!(parent: parent, "kv_gateway"),
        }
    }

    /// Namespace of the open store, if started.
    pub fn db_name(&self) -> Option<String> {
        self.handle.get().map(|store| store.namespace().to_string())
    }

    fn started(&self) -> GatewayResult<Arc<dyn KvStore>> {
        self.handle.get().ok_or(GatewayError::NotStarted)
    }

    async fn resolve(&self, locator: &Locator) -> GatewayResult<Arc<dyn KvStore>> {
        if let Some(store) = self.handle.get() {
            return Ok(store);
        }
        let name = db_name(locator)?;
        let backend = self.backend.as_ref();
        let span = &self.span;
        self.handle
            .get_or_open(|| {
                let store = open_namespace(backend, &name)?;
                debug!(parent: span, db_name = %name, locator = %locator, "starting");
                Ok(store)
            })
            .await
    }
}

impl std::fmt::Debug for KvGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvGateway")
            .field("db_name", &self.db_name())
            .finish()
    }
}

fn read_block(store: &dyn KvStore, cid: &str) -> GatewayResult<Vec<u8>> {
    match store.get_bytes(cid) {
        Ok(Some(bytes)) => Ok(bytes),
        Ok(None) => Err(GatewayError::NotFound {
            key: cid.to_string(),
        }),
        Err(source) => Err(GatewayError::Read {
            name: store.namespace().to_string(),
            key: cid.to_string(),
            source,
        }),
    }
}

#[async_trait]
impl Gateway for KvGateway {
    async fn start(&self, base: &Locator) -> GatewayResult<Locator> {
        self.resolve(base).await?;
        Ok(base
            .build()
            .set_param(VERSION, KV_STORE_VERSION)
            .locator())
    }

    async fn close(&self, locator: &Locator) -> GatewayResult<()> {
        if let Some(store) = self.handle.get() {
            store.flush().map_err(|source| GatewayError::Close {
                name: store.namespace().to_string(),
                source,
            })?;
            debug!(parent: &self.span, locator = %locator, "closed");
        }
        Ok(())
    }

    async fn destroy(&self, locator: &Locator) -> GatewayResult<()> {
        let store = self.resolve(locator).await?;
        store.clear_all().map_err(|source| GatewayError::Destroy {
            name: store.namespace().to_string(),
            source,
        })?;
        debug!(parent: &self.span, locator = %locator, db_name = store.namespace(), "destroying");
        Ok(())
    }

    async fn put(&self, locator: &Locator, body: &[u8]) -> GatewayResult<()> {
        let store = self.started()?;
        let cid = content_key(locator)?;
        debug!(parent: &self.span, locator = %locator, cid, len = body.len(), "putting");
        store.set_bytes(cid, body).map_err(|source| GatewayError::Write {
            name: store.namespace().to_string(),
            key: cid.to_string(),
            source,
        })
    }

    async fn get(&self, locator: &Locator) -> GatewayResult<Vec<u8>> {
        let store = self.started()?;
        let cid = content_key(locator)?;
        debug!(parent: &self.span, locator = %locator, cid, "getting");
        read_block(store.as_ref(), cid)
    }

    async fn delete(&self, locator: &Locator) -> GatewayResult<()> {
        let store = self.started()?;
        let cid = content_key(locator)?;
        debug!(parent: &self.span, locator = %locator, cid, "deleting");
        store
            .delete(cid)
            .map(|_| ())
            .map_err(|source| GatewayError::Delete {
                name: store.namespace().to_string(),
                key: cid.to_string(),
                source,
            })
    }
}

/// Test-harness access to the blocks behind a [`KvGateway`].
pub struct KvTestGateway {
    backend: Arc<dyn KvBackend>,
    span: Span,
}

impl KvTestGateway {
    pub fn new(backend: Arc<dyn KvBackend>, parent: &Span) -> Self {
        Self {
            backend,
            span: tracing::info_span!(parent: parent, "kv_test_gateway"),
        }
    }
}

#[async_trait]
impl TestGateway for KvTestGateway {
    async fn get_plain(&self, base: &Locator, key: &str) -> GatewayResult<Vec<u8>> {
        let name = db_name(base)?;
        let store = open_namespace(self.backend.as_ref(), &name)?;
        debug!(parent: &self.span, db_name = %name, key, "get_plain");
        read_block(store.as_ref(), key)
    }
}
