//! Registration of the key-value adapters.

use std::sync::Arc;

use blockgate_gateway::{Gateway, KeyBagProvider, KvGateway, KvKeyBagProvider, KvTestGateway, TestGateway};
use blockgate_kv::KvBackend;
use blockgate_uri::Locator;
use tracing::Span;

use crate::error::RegistryResult;
use crate::registry::{KeyBagProtocol, ProtocolRegistry, StoreProtocol};

/// Scheme served by the key-value adapters.
pub const KV_SCHEME: &str = "kv";

/// Base locator offered when the engine is given none.
pub const DEFAULT_KV_BASE: &str = "kv://blockgate";

/// Register [`KvGateway`] and [`KvKeyBagProvider`] under [`KV_SCHEME`].
///
/// Every gateway and provider built from this registration shares
/// `backend`. With `overwrite` unset, an existing `kv` registration in
/// either table is a conflict and nothing is registered.
pub fn register_kv_protocol(
    registry: &ProtocolRegistry,
    backend: Arc<dyn KvBackend>,
    overwrite: bool,
) -> RegistryResult<()> {
    let default_base = Locator::parse(DEFAULT_KV_BASE)?;

    let gateway_backend = backend.clone();
    let test_backend = backend.clone();
    let store = StoreProtocol::new(
        KV_SCHEME,
        move |_: &Locator, span: &Span| -> Arc<dyn Gateway> {
            Arc::new(KvGateway::new(gateway_backend.clone(), span))
        },
        move |span: &Span| -> Arc<dyn TestGateway> {
            Arc::new(KvTestGateway::new(test_backend.clone(), span))
        },
    )
    .with_default_base(default_base);

    let keybag = KeyBagProtocol::new(
        KV_SCHEME,
        move |locator: &Locator, span: &Span| -> Arc<dyn KeyBagProvider> {
            Arc::new(KvKeyBagProvider::new(locator.clone(), backend.clone(), span))
        },
    );
    registry.register_pair(store, keybag, overwrite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use blockgate_gateway::{KeyItem, KV_STORE_VERSION};
    use blockgate_kv::MemoryBackend;

    fn registry() -> ProtocolRegistry {
        let reg = ProtocolRegistry::new();
        register_kv_protocol(&reg, Arc::new(MemoryBackend::new()), false).unwrap();
        reg
    }

    #[test]
    fn registers_both_tables() {
        let reg = registry();
        assert_eq!(reg.protocols().unwrap(), vec![KV_SCHEME]);
        assert_eq!(reg.keybag_protocols().unwrap(), vec![KV_SCHEME]);
        assert_eq!(
            reg.default_base(KV_SCHEME).unwrap().map(|b| b.to_string()),
            Some(DEFAULT_KV_BASE.to_string())
        );
    }

    #[test]
    fn second_registration_needs_overwrite() {
        let reg = registry();
        assert!(matches!(
            register_kv_protocol(&reg, Arc::new(MemoryBackend::new()), false),
            Err(RegistryError::Conflict { .. })
        ));
        register_kv_protocol(&reg, Arc::new(MemoryBackend::new()), true).unwrap();
    }

    #[test]
    fn existing_keybag_blocks_the_whole_registration() {
        let reg = ProtocolRegistry::new();
        let backend: Arc<dyn KvBackend> = Arc::new(MemoryBackend::new());
        let keybag_backend = backend.clone();
        let keybag = KeyBagProtocol::new(KV_SCHEME, move |l: &Locator, span: &Span| -> Arc<dyn KeyBagProvider> {
            Arc::new(KvKeyBagProvider::new(l.clone(), keybag_backend.clone(), span))
        });
        reg.register_keybag_provider(keybag, false).unwrap();

        assert!(matches!(
            register_kv_protocol(&reg, backend.clone(), false),
            Err(RegistryError::Conflict { .. })
        ));
        assert!(reg.protocols().unwrap().is_empty());
        assert!(reg.gateway(&Locator::parse(DEFAULT_KV_BASE).unwrap()).is_err());

        register_kv_protocol(&reg, backend, true).unwrap();
        assert_eq!(reg.protocols().unwrap(), vec![KV_SCHEME]);
    }

    #[tokio::test]
    async fn gateways_share_the_backend() {
        let reg = registry();
        let base: Locator = "kv://blockgate?name=db&store=meta".parse().unwrap();
        let writer = reg.gateway(&base).unwrap();
        let started = writer.start(&base).await.unwrap();
        assert_eq!(started.version(), Some(KV_STORE_VERSION));
        writer
            .put(&writer.build_url(&started, "cid"), b"block")
            .await
            .unwrap();

        let reader = reg.gateway(&base).unwrap();
        reader.start(&base).await.unwrap();
        assert_eq!(reader.get(&reader.build_url(&base, "cid")).await.unwrap(), b"block");

        let tg = reg.test_gateway(KV_SCHEME).unwrap();
        assert_eq!(tg.get_plain(&base, "cid").await.unwrap(), b"block");
    }

    #[tokio::test]
    async fn keybag_through_registry() {
        let reg = registry();
        let bag_url: Locator = "kv:///vault".parse().unwrap();
        reg.keybag(&bag_url)
            .unwrap()
            .set("main", &KeyItem::new("main", "z3k"))
            .await
            .unwrap();
        let item = reg.keybag(&bag_url).unwrap().get("main").await.unwrap();
        assert_eq!(item.map(|i| i.key), Some("z3k".to_string()));
    }
}
