//! On-disk layout version of the key-value adapters.

use blockgate_uri::Locator;

use crate::error::{GatewayError, GatewayResult};

/// Version tag set on the locator returned by `start`.
pub const KV_STORE_VERSION: &str = "v0.1-kv";

/// Refuse a locator whose `version` is absent or differs from
/// [`KV_STORE_VERSION`].
pub fn ensure_version(locator: &Locator) -> GatewayResult<()> {
    match locator.version() {
        Some(v) if v == KV_STORE_VERSION => Ok(()),
        found => Err(GatewayError::VersionMismatch {
            expected: KV_STORE_VERSION.to_string(),
            found: found.unwrap_or("<none>").to_string(),
        }),
    }
}
