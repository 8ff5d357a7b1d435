use std::sync::Arc;

use async_trait::async_trait;
use blockgate_kv::{KvBackend, KvError, KvStore};
use blockgate_uri::Locator;
use tracing::{debug, warn, Span};

use crate::error::{GatewayError, GatewayResult};
use crate::handle::{open_namespace, StoreHandle};
use crate::key_item::KeyItem;
use crate::naming::keybag_namespace;
use crate::traits::KeyBagProvider;

/// Key bag provider storing one JSON-encoded [`KeyItem`] per id.
///
/// The namespace is the locator path behind a reserved prefix (`kv:///vault`
/// uses `-keybag-vault`), falling back to `-keybag-keybag`. It is opened on
/// first use.
pub struct KvKeyBagProvider {
    locator: Locator,
    namespace: String,
    backend: Arc<dyn KvBackend>,
    handle: StoreHandle,
    span: Span,
}

impl KvKeyBagProvider {
    pub fn new(locator: Locator, backend: Arc<dyn KvBackend>, parent: &Span) -> Self {
        let namespace = keybag_namespace(&locator);
        Self {
            span: tracing::info_span!(parent: parent, "kv_keybag_provider", namespace = %namespace),
            locator,
            namespace,
            backend,
            handle: StoreHandle::new(),
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn store(&self) -> GatewayResult<Arc<dyn KvStore>> {
        let backend = self.backend.as_ref();
        let name = self.namespace.as_str();
        let span = &self.span;
        self.handle
            .get_or_open(|| {
                let store = open_namespace(backend, name)?;
                match store.keys() {
                    Ok(ids) => debug!(parent: span, ?ids, "opened key bag"),
                    Err(error) => warn!(parent: span, %error, "cannot list key bag ids"),
                }
                Ok(store)
            })
            .await
    }
}

impl std::fmt::Debug for KvKeyBagProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvKeyBagProvider")
            .field("locator", &self.locator.to_string())
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[async_trait]
impl KeyBagProvider for KvKeyBagProvider {
    async fn get(&self, id: &str) -> GatewayResult<Option<KeyItem>> {
        let store = self.store().await?;
        let read_error = |source: KvError| GatewayError::Read {
            name: self.namespace.clone(),
            key: id.to_string(),
            source,
        };
        let text = match store.get_string(id).map_err(read_error)? {
            Some(text) if !text.is_empty() => text,
            _ => {
                debug!(parent: &self.span, id, "key item not found");
                return Ok(None);
            }
        };
        let item = serde_json::from_str::<KeyItem>(&text).map_err(|e| {
            read_error(KvError::Corrupt {
                namespace: self.namespace.clone(),
                key: id.to_string(),
                reason: format!("invalid key item: {e}"),
            })
        })?;
        debug!(parent: &self.span, id, name = %item.name, "key item loaded");
        Ok(Some(item))
    }

    async fn set(&self, id: &str, item: &KeyItem) -> GatewayResult<()> {
        let text = item.to_json()?;
        let store = self.store().await?;
        store
            .set_string(id, &text)
            .map_err(|source| GatewayError::Write {
                name: self.namespace.clone(),
                key: id.to_string(),
                source,
            })?;
        debug!(parent: &self.span, id, name = %item.name, "key item stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::KvGateway;
    use crate::traits::Gateway;
    use blockgate_kv::{FsBackend, MemoryBackend};

    fn provider(url: &str) -> (Arc<MemoryBackend>, KvKeyBagProvider) {
        let backend = Arc::new(MemoryBackend::new());
        let p = KvKeyBagProvider::new(url.parse().unwrap(), backend.clone(), &Span::none());
        (backend, p)
    }

    #[tokio::test]
    async fn set_then_get() {
        let (_, p) = provider("kv:///vault");
        let item = KeyItem::new("main", "z3xyz");
        p.set("main", &item).await.unwrap();
        assert_eq!(p.get("main").await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let (_, p) = provider("kv:///vault");
        assert_eq!(p.get("never-set").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_replaces() {
        let (_, p) = provider("kv:///vault");
        p.set("k", &KeyItem::new("k", "old")).await.unwrap();
        p.set("k", &KeyItem::new("k", "new")).await.unwrap();
        assert_eq!(p.get("k").await.unwrap().unwrap().key, "new");
    }

    #[tokio::test]
    async fn path_selects_namespace() {
        let (backend, p) = provider("kv:///vault");
        assert_eq!(p.namespace(), "-keybag-vault");
        p.set("k", &KeyItem::new("k", "v")).await.unwrap();
        assert_eq!(backend.namespaces().unwrap(), vec!["-keybag-vault"]);
    }

    #[tokio::test]
    async fn empty_path_uses_default_namespace() {
        let (backend, p) = provider("kv://");
        p.set("k", &KeyItem::new("k", "v")).await.unwrap();
        assert_eq!(backend.namespaces().unwrap(), vec!["-keybag-keybag"]);
    }

    #[tokio::test]
    async fn stored_as_json_string() {
        let (backend, p) = provider("kv:///vault");
        p.set("k", &KeyItem::new("k", "v").with_field("created", 7))
            .await
            .unwrap();
        let raw = backend.open(p.namespace()).unwrap().get_string("k").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["key"], "v");
        assert_eq!(json["created"], 7);
    }

    #[tokio::test]
    async fn reserved_extra_field_is_rejected_before_writing() {
        let (_, p) = provider("kv:///vault");
        let good = KeyItem::new("main", "z3k");
        p.set("main", &good).await.unwrap();

        let shadowing = KeyItem::new("main", "z3k").with_field("key", "other");
        assert!(matches!(
            p.set("main", &shadowing).await,
            Err(GatewayError::Serialization(_))
        ));
        assert_eq!(p.get("main").await.unwrap(), Some(good));
    }

    #[tokio::test]
    async fn empty_string_is_none() {
        let (backend, p) = provider("kv:///vault");
        backend.open(p.namespace()).unwrap().set_string("k", "").unwrap();
        assert_eq!(p.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_json_is_error() {
        let (backend, p) = provider("kv:///vault");
        backend.open(p.namespace()).unwrap().set_string("k", "{not json").unwrap();
        let err = p.get("k").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Read {
                source: KvError::Corrupt { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn bytes_value_is_error() {
        let (backend, p) = provider("kv:///vault");
        backend.open(p.namespace()).unwrap().set_bytes("k", b"{}").unwrap();
        assert!(matches!(
            p.get("k").await,
            Err(GatewayError::Read {
                source: KvError::TypeMismatch { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn survives_new_provider_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FsBackend::new(dir.path()).unwrap());
        let item = KeyItem::new("main", "z3abc").with_field("fingerprint", "ff");

        let first = KvKeyBagProvider::new("kv:///vault".parse().unwrap(), backend.clone(), &Span::none());
        first.set("main", &item).await.unwrap();
        drop(first);

        let second = KvKeyBagProvider::new("kv:///vault".parse().unwrap(), backend, &Span::none());
        assert_eq!(second.get("main").await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn keybag_and_database_with_same_name_are_separate() {
        let backend = Arc::new(MemoryBackend::new());
        let bag = KvKeyBagProvider::new("kv:///mydb-data".parse().unwrap(), backend.clone(), &Span::none());
        let gateway = KvGateway::new(backend.clone(), &Span::none());
        let base: Locator = "kv://x?name=mydb&store=data".parse().unwrap();
        let started = gateway.start(&base).await.unwrap();
        let abc = gateway.build_url(&started, "abc");

        gateway.put(&abc, &[1, 2, 3]).await.unwrap();
        bag.set("abc", &KeyItem::new("abc", "z3abc")).await.unwrap();
        assert_eq!(gateway.get(&abc).await.unwrap(), vec![1, 2, 3]);

        gateway.destroy(&started).await.unwrap();
        assert_eq!(bag.get("abc").await.unwrap(), Some(KeyItem::new("abc", "z3abc")));
    }
}
