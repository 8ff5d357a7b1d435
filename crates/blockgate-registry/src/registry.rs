use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use blockgate_gateway::{Gateway, KeyBagProvider, TestGateway};
use blockgate_uri::{normalize_scheme, Locator};
use tracing::{debug, Span};

use crate::error::{ProtocolKind, RegistryError, RegistryResult};

/// Builds a gateway for a base locator. Adapter spans are children of the
/// span passed in.
pub type GatewayFactory = Arc<dyn Fn(&Locator, &Span) -> Arc<dyn Gateway> + Send + Sync>;

/// Builds the test-harness companion of a gateway.
pub type TestGatewayFactory = Arc<dyn Fn(&Span) -> Arc<dyn TestGateway> + Send + Sync>;

/// Builds a key bag provider for a locator.
pub type KeyBagFactory = Arc<dyn Fn(&Locator, &Span) -> Arc<dyn KeyBagProvider> + Send + Sync>;

/// Registration of a block storage adapter under one scheme.
#[derive(Clone)]
pub struct StoreProtocol {
    pub protocol: String,
    /// Base locator used when the engine is given no explicit one.
    pub default_base: Option<Locator>,
    pub gateway: GatewayFactory,
    pub test: TestGatewayFactory,
}

impl StoreProtocol {
    pub fn new<G, T>(protocol: impl Into<String>, gateway: G, test: T) -> Self
    where
        G: Fn(&Locator, &Span) -> Arc<dyn Gateway> + Send + Sync + 'static,
        T: Fn(&Span) -> Arc<dyn TestGateway> + Send + Sync + 'static,
    {
        Self {
            protocol: protocol.into(),
            default_base: None,
            gateway: Arc::new(gateway),
            test: Arc::new(test),
        }
    }

    pub fn with_default_base(mut self, base: Locator) -> Self {
        self.default_base = Some(base);
        self
    }
}

impl std::fmt::Debug for StoreProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreProtocol")
            .field("protocol", &self.protocol)
            .field("default_base", &self.default_base.as_ref().map(|b| b.to_string()))
            .finish_non_exhaustive()
    }
}

/// Registration of a key bag provider under one scheme.
#[derive(Clone)]
pub struct KeyBagProtocol {
    pub protocol: String,
    pub factory: KeyBagFactory,
}

impl KeyBagProtocol {
    pub fn new<F>(protocol: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Locator, &Span) -> Arc<dyn KeyBagProvider> + Send + Sync + 'static,
    {
        Self {
            protocol: protocol.into(),
            factory: Arc::new(factory),
        }
    }
}

impl std::fmt::Debug for KeyBagProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBagProtocol")
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// Lowercase a protocol name, accepting an optional trailing `:`.
fn protocol_key(protocol: &str) -> RegistryResult<String> {
    Ok(normalize_scheme(protocol.trim_end_matches(':'))?)
}

fn poisoned(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Poisoned(e.to_string())
}

/// Maps locator schemes to adapter factories.
///
/// The registry is an ordinary value owned by whoever composes the
/// application; there is no process-wide table. Factories are cloned out of
/// the table before they run, so a factory may itself use the registry.
pub struct ProtocolRegistry {
    stores: RwLock<HashMap<String, StoreProtocol>>,
    keybags: RwLock<HashMap<String, KeyBagProtocol>>,
    span: Span,
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::with_parent_span(&Span::current())
    }

    /// An empty registry whose adapters log under `parent`.
    pub fn with_parent_span(parent: &Span) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            keybags: RwLock::new(HashMap::new()),
            span: tracing::info_span!(parent: parent, "protocol_registry"),
        }
    }

    /// Register a store protocol. An existing registration for the same
    /// scheme is replaced only when `overwrite` is set.
    pub fn register_store_protocol(
        &self,
        mut protocol: StoreProtocol,
        overwrite: bool,
    ) -> RegistryResult<()> {
        let key = protocol_key(&protocol.protocol)?;
        protocol.protocol = key.clone();
        let mut stores = self.stores.write().map_err(poisoned)?;
        if !overwrite && stores.contains_key(&key) {
            return Err(RegistryError::Conflict {
                protocol: key,
                kind: ProtocolKind::Store,
            });
        }
        debug!(parent: &self.span, protocol = %key, overwrite, "registered store protocol");
        stores.insert(key, protocol);
        Ok(())
    }

    /// Register a key bag provider under the same overwrite rule as
    /// [`register_store_protocol`](Self::register_store_protocol).
    pub fn register_keybag_provider(
        &self,
        mut protocol: KeyBagProtocol,
        overwrite: bool,
    ) -> RegistryResult<()> {
        let key = protocol_key(&protocol.protocol)?;
        protocol.protocol = key.clone();
        let mut keybags = self.keybags.write().map_err(poisoned)?;
        if !overwrite && keybags.contains_key(&key) {
            return Err(RegistryError::Conflict {
                protocol: key,
                kind: ProtocolKind::KeyBag,
            });
        }
        debug!(parent: &self.span, protocol = %key, overwrite, "registered key bag provider");
        keybags.insert(key, protocol);
        Ok(())
    }

    /// Register a store protocol and a key bag provider together.
    ///
    /// Both tables are checked before either is written, so a conflict in
    /// one leaves the registry unchanged.
    pub fn register_pair(
        &self,
        mut store: StoreProtocol,
        mut keybag: KeyBagProtocol,
        overwrite: bool,
    ) -> RegistryResult<()> {
        let store_key = protocol_key(&store.protocol)?;
        let keybag_key = protocol_key(&keybag.protocol)?;
        store.protocol = store_key.clone();
        keybag.protocol = keybag_key.clone();

        let mut stores = self.stores.write().map_err(poisoned)?;
        let mut keybags = self.keybags.write().map_err(poisoned)?;
        if !overwrite {
            if stores.contains_key(&store_key) {
                return Err(RegistryError::Conflict {
                    protocol: store_key,
                    kind: ProtocolKind::Store,
                });
            }
            if keybags.contains_key(&keybag_key) {
                return Err(RegistryError::Conflict {
                    protocol: keybag_key,
                    kind: ProtocolKind::KeyBag,
                });
            }
        }
        debug!(
            parent: &self.span,
            store = %store_key,
            keybag = %keybag_key,
            overwrite,
            "registered store protocol and key bag provider"
        );
        stores.insert(store_key, store);
        keybags.insert(keybag_key, keybag);
        Ok(())
    }

    /// Remove a store protocol. Returns `true` if one was registered.
    pub fn unregister_store_protocol(&self, protocol: &str) -> RegistryResult<bool> {
        let key = protocol_key(protocol)?;
        Ok(self.stores.write().map_err(poisoned)?.remove(&key).is_some())
    }

    /// Remove a key bag provider. Returns `true` if one was registered.
    pub fn unregister_keybag_provider(&self, protocol: &str) -> RegistryResult<bool> {
        let key = protocol_key(protocol)?;
        Ok(self.keybags.write().map_err(poisoned)?.remove(&key).is_some())
    }

    /// Remove every registration.
    pub fn clear(&self) -> RegistryResult<()> {
        self.stores.write().map_err(poisoned)?.clear();
        self.keybags.write().map_err(poisoned)?.clear();
        debug!(parent: &self.span, "cleared registry");
        Ok(())
    }

    fn store_protocol(&self, protocol: &str) -> RegistryResult<StoreProtocol> {
        let key = protocol_key(protocol)?;
        self.stores
            .read()
            .map_err(poisoned)?
            .get(&key)
            .cloned()
            .ok_or(RegistryError::UnknownProtocol {
                protocol: key,
                kind: ProtocolKind::Store,
            })
    }

    /// Build the gateway registered for `locator`'s scheme.
    pub fn gateway(&self, locator: &Locator) -> RegistryResult<Arc<dyn Gateway>> {
        let protocol = self.store_protocol(locator.scheme())?;
        Ok((protocol.gateway)(locator, &self.span))
    }

    /// Build the test gateway registered for `protocol`.
    pub fn test_gateway(&self, protocol: &str) -> RegistryResult<Arc<dyn TestGateway>> {
        let protocol = self.store_protocol(protocol)?;
        Ok((protocol.test)(&self.span))
    }

    /// The default base locator registered for `protocol`, if it has one.
    pub fn default_base(&self, protocol: &str) -> RegistryResult<Option<Locator>> {
        Ok(self.store_protocol(protocol)?.default_base)
    }

    /// Build the key bag provider registered for `locator`'s scheme.
    pub fn keybag(&self, locator: &Locator) -> RegistryResult<Arc<dyn KeyBagProvider>> {
        let key = locator.scheme().to_string();
        let protocol = self
            .keybags
            .read()
            .map_err(poisoned)?
            .get(&key)
            .cloned()
            .ok_or(RegistryError::UnknownProtocol {
                protocol: key,
                kind: ProtocolKind::KeyBag,
            })?;
        Ok((protocol.factory)(locator, &self.span))
    }

    /// Registered store schemes, sorted.
    pub fn protocols(&self) -> RegistryResult<Vec<String>> {
        let mut names: Vec<String> = self.stores.read().map_err(poisoned)?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Registered key bag schemes, sorted.
    pub fn keybag_protocols(&self) -> RegistryResult<Vec<String>> {
        let mut names: Vec<String> = self.keybags.read().map_err(poisoned)?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolRegistry")
            .field("protocols", &self.protocols().unwrap_or_default())
            .field("keybag_protocols", &self.keybag_protocols().unwrap_or_default())
            .finish()
    }
}
