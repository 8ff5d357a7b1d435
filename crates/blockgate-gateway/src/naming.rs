//! Derivation of physical namespaces and content keys from locators.
//!
//! The logical database name is the physical namespace: reordering its
//! components would orphan every database written before the change.
//!
//! ```text
//! name [ "-" index ] "-" store
//! ```
//!
//! Components must be non-empty and must not contain the delimiter, which
//! keeps the mapping injective: distinct `(name, index, store)` triples never
//! share a namespace and identical triples always do.

use blockgate_uri::params::{INDEX, KEY, NAME, STORE};
use blockgate_uri::Locator;

use crate::error::{GatewayError, GatewayResult};

/// Separator between logical database name components.
pub const NAME_DELIMITER: char = '-';

/// Key bag namespace used when the locator path is empty.
pub const DEFAULT_KEYBAG_NAMESPACE: &str = "keybag";

/// Prefix of every physical key bag namespace.
///
/// It starts with [`NAME_DELIMITER`], which a database name never does, so
/// key bags and block stores cannot share a namespace.
pub const KEYBAG_NAMESPACE_PREFIX: &str = "-keybag-";

fn component<'a>(param: &str, value: &'a str) -> GatewayResult<&'a str> {
    let invalid = |reason: String| GatewayError::InvalidName {
        param: param.to_string(),
        value: value.to_string(),
        reason,
    };
    if value.is_empty() {
        return Err(invalid("must not be empty".into()));
    }
    if value.contains(NAME_DELIMITER) {
        return Err(invalid(format!("must not contain {NAME_DELIMITER:?}")));
    }
    Ok(value)
}

/// Derive the logical database name from `name`, `index` and `store`.
///
/// `name` and `store` are required; an absent or empty `index` is skipped.
///
/// ```
/// use blockgate_gateway::db_name;
///
/// let l = "kv://x?name=mydb&index=byDate&store=data".parse().unwrap();
/// assert_eq!(db_name(&l).unwrap(), "mydb-byDate-data");
/// ```
pub fn db_name(locator: &Locator) -> GatewayResult<String> {
    let mut out = vec![component(NAME, locator.require_param(NAME)?)?];
    if let Some(index) = locator.param(INDEX).filter(|i| !i.is_empty()) {
        out.push(component(INDEX, index)?);
    }
    out.push(component(STORE, locator.require_param(STORE)?)?);
    Ok(out.join(NAME_DELIMITER.to_string().as_str()))
}

/// The content key of the block a locator addresses.
pub fn content_key(locator: &Locator) -> GatewayResult<&str> {
    let key = locator.require_param(KEY)?;
    if key.is_empty() {
        return Err(GatewayError::InvalidName {
            param: KEY.to_string(),
            value: String::new(),
            reason: "must not be empty".into(),
        });
    }
    Ok(key)
}

/// The physical key bag namespace for a locator.
///
/// This is [`KEYBAG_NAMESPACE_PREFIX`] followed by the path without
/// surrounding `/`, or by [`DEFAULT_KEYBAG_NAMESPACE`] when that is empty.
pub fn keybag_namespace(locator: &Locator) -> String {
    let bag = match locator.path().trim_matches('/') {
        "" => DEFAULT_KEYBAG_NAMESPACE,
        path => path,
    };
    format!("{KEYBAG_NAMESPACE_PREFIX}{bag}")
}
