//! The [`Locator`] value type and its [`LocatorBuilder`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::encoding::{self, COMPONENT, PATH};
use crate::error::{ParseError, UriResult};
use crate::params::{self, StoreKind};

const SCHEME_SEPARATOR: &str = "://";

/// A structured address: scheme, path, and named parameters.
///
/// Equality is structural. Parameter order in the source text is not
/// significant; the canonical [`Display`](fmt::Display) form lists parameters
/// sorted by name and re-parses to an equal locator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator {
    scheme: String,
    path: String,
    params: BTreeMap<String, String>,
}

impl Locator {
    /// Create a locator with no parameters.
    ///
    /// The scheme is lowercased and must start with an ASCII letter followed
    /// by letters, digits, `+`, `-` or `.`.
    pub fn new(scheme: &str, path: impl Into<String>) -> UriResult<Self> {
        Ok(Self {
            scheme: normalize_scheme(scheme)?,
            path: path.into(),
            params: BTreeMap::new(),
        })
    }

    /// Parse locator text of the form `scheme://path?name=value&...`.
    pub fn parse(input: &str) -> UriResult<Self> {
        let (scheme, rest) =
            input
                .split_once(SCHEME_SEPARATOR)
                .ok_or_else(|| ParseError::MissingScheme {
                    input: input.to_string(),
                })?;
        let scheme = normalize_scheme(scheme)?;

        let (raw_path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        let path = encoding::decode(raw_path)?;

        let mut params = BTreeMap::new();
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            if name.is_empty() {
                return Err(ParseError::EmptyParamName {
                    input: input.to_string(),
                });
            }
            // Repeated names: last one wins.
            params.insert(encoding::decode(name)?, encoding::decode(value)?);
        }

        Ok(Self {
            scheme,
            path,
            params,
        })
    }

    /// The lowercase scheme selecting the adapter.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The decoded path (everything between `://` and `?`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Look up a parameter the caller cannot proceed without.
    pub fn require_param(&self, name: &str) -> UriResult<&str> {
        self.param(name).ok_or_else(|| ParseError::MissingParam {
            param: name.to_string(),
        })
    }

    /// Iterate over all parameters, sorted by name.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `name` parameter.
    pub fn name(&self) -> Option<&str> {
        self.param(params::NAME)
    }

    /// The `index` parameter.
    pub fn index(&self) -> Option<&str> {
        self.param(params::INDEX)
    }

    /// The raw `store` parameter.
    pub fn store(&self) -> Option<&str> {
        self.param(params::STORE)
    }

    /// The `store` parameter parsed as a [`StoreKind`].
    ///
    /// Returns `Ok(None)` when the parameter is absent.
    pub fn store_kind(&self) -> UriResult<Option<StoreKind>> {
        self.store().map(str::parse).transpose()
    }

    /// The `key` parameter.
    pub fn key(&self) -> Option<&str> {
        self.param(params::KEY)
    }

    /// The `version` parameter.
    pub fn version(&self) -> Option<&str> {
        self.param(params::VERSION)
    }

    /// Start building a modified copy of this locator.
    pub fn build(&self) -> LocatorBuilder {
        LocatorBuilder {
            inner: self.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.scheme,
            SCHEME_SEPARATOR,
            encoding::encode(&self.path, PATH)
        )?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(
                f,
                "{sep}{}={}",
                encoding::encode(name, COMPONENT),
                encoding::encode(value, COMPONENT)
            )?;
        }
        Ok(())
    }
}

impl FromStr for Locator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locator {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

/// Produces a modified copy of a [`Locator`].
///
/// ```
/// use blockgate_uri::Locator;
///
/// let base: Locator = "kv://blockgate?name=mydb&store=data".parse().unwrap();
/// let block = base.build().set_param("key", "abc").locator();
/// assert_eq!(block.key(), Some("abc"));
/// assert_eq!(base.key(), None);
/// ```
#[derive(Clone, Debug)]
pub struct LocatorBuilder {
    inner: Locator,
}

impl LocatorBuilder {
    /// Set (or replace) a parameter.
    pub fn set_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.params.insert(name.into(), value.into());
        self
    }

    /// Remove a parameter if present.
    pub fn del_param(mut self, name: &str) -> Self {
        self.inner.params.remove(name);
        self
    }

    /// Replace the path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.inner.path = path.into();
        self
    }

    /// Finish, yielding the new locator snapshot.
    pub fn locator(self) -> Locator {
        self.inner
    }
}

/// Validate a scheme and return its lowercase form.
///
/// A scheme starts with an ASCII letter followed by letters, digits, `+`,
/// `-` or `.`.
pub fn normalize_scheme(scheme: &str) -> UriResult<String> {
    let invalid = |reason: &str| ParseError::InvalidScheme {
        scheme: scheme.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = scheme.chars();
    match chars.next() {
        None => return Err(invalid("scheme must not be empty")),
        Some(c) if !c.is_ascii_alphabetic() => {
            return Err(invalid("scheme must start with an ASCII letter"))
        }
        Some(_) => {}
    }
    if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))) {
        return Err(invalid(&format!("contains forbidden character: {c:?}")));
    }
    Ok(scheme.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(s: &str) -> Locator {
        s.parse().unwrap()
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_full_locator() {
        let l = loc("kv://x?name=mydb&index=byDate&store=data&key=abc&version=v1");
        assert_eq!(l.scheme(), "kv");
        assert_eq!(l.path(), "x");
        assert_eq!(l.name(), Some("mydb"));
        assert_eq!(l.index(), Some("byDate"));
        assert_eq!(l.store(), Some("data"));
        assert_eq!(l.key(), Some("abc"));
        assert_eq!(l.version(), Some("v1"));
    }

    #[test]
    fn parse_without_query() {
        let l = loc("kv://blockgate");
        assert_eq!(l.path(), "blockgate");
        assert_eq!(l.params().count(), 0);
    }

    #[test]
    fn parse_empty_path() {
        let l = loc("kv://?name=a");
        assert_eq!(l.path(), "");
        assert_eq!(l.name(), Some("a"));
    }

    #[test]
    fn scheme_is_lowercased() {
        assert_eq!(loc("KV://x").scheme(), "kv");
    }

    #[test]
    fn repeated_param_last_wins() {
        assert_eq!(loc("kv://x?key=a&key=b").key(), Some("b"));
    }

    #[test]
    fn param_without_value_is_empty() {
        assert_eq!(loc("kv://x?flag&name=a").param("flag"), Some(""));
    }

    #[test]
    fn empty_pairs_are_skipped() {
        let l = loc("kv://x?&name=a&&store=data&");
        assert_eq!(l.params().count(), 2);
    }

    #[test]
    fn percent_decoding_applies() {
        let l = loc("kv://my%20dir/sub?name=a%26b&key=x%3Dy");
        assert_eq!(l.path(), "my dir/sub");
        assert_eq!(l.name(), Some("a&b"));
        assert_eq!(l.key(), Some("x=y"));
    }

    #[test]
    fn reject_missing_scheme_separator() {
        assert!(matches!(
            Locator::parse("kv:x?name=a"),
            Err(ParseError::MissingScheme { .. })
        ));
    }

    #[test]
    fn reject_bad_schemes() {
        assert!(matches!(
            Locator::parse("://x"),
            Err(ParseError::InvalidScheme { .. })
        ));
        assert!(matches!(
            Locator::parse("1kv://x"),
            Err(ParseError::InvalidScheme { .. })
        ));
        assert!(matches!(
            Locator::parse("k_v://x"),
            Err(ParseError::InvalidScheme { .. })
        ));
    }

    #[test]
    fn reject_empty_param_name() {
        assert!(matches!(
            Locator::parse("kv://x?=v"),
            Err(ParseError::EmptyParamName { .. })
        ));
    }

    #[test]
    fn reject_bad_escape() {
        assert!(matches!(
            Locator::parse("kv://x?name=%4"),
            Err(ParseError::InvalidEscape { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Accessors and builder
    // -----------------------------------------------------------------------

    #[test]
    fn require_param_reports_name() {
        let l = loc("kv://x?name=a");
        assert_eq!(l.require_param("name").unwrap(), "a");
        assert_eq!(
            l.require_param("store").unwrap_err(),
            ParseError::MissingParam {
                param: "store".into()
            }
        );
    }

    #[test]
    fn store_kind_accessor() {
        assert_eq!(
            loc("kv://x?store=meta").store_kind().unwrap(),
            Some(StoreKind::Meta)
        );
        assert_eq!(loc("kv://x").store_kind().unwrap(), None);
        assert!(loc("kv://x?store=other").store_kind().is_err());
    }

    #[test]
    fn builder_leaves_original_untouched() {
        let base = loc("kv://x?name=a&store=data");
        let with_key = base.build().set_param("key", "k1").locator();
        assert_eq!(with_key.key(), Some("k1"));
        assert_eq!(base.key(), None);
        assert_ne!(base, with_key);
    }

    #[test]
    fn builder_replaces_and_deletes() {
        let base = loc("kv://x?name=a&key=old");
        let l = base
            .build()
            .set_param("key", "new")
            .del_param("name")
            .path("y")
            .locator();
        assert_eq!(l.key(), Some("new"));
        assert_eq!(l.name(), None);
        assert_eq!(l.path(), "y");
    }

    #[test]
    fn new_validates_scheme() {
        assert_eq!(Locator::new("Kv", "p").unwrap().scheme(), "kv");
        assert!(Locator::new("", "p").is_err());
    }

    // -----------------------------------------------------------------------
    // Display and equality
    // -----------------------------------------------------------------------

    #[test]
    fn display_is_canonical() {
        let l = loc("kv://x?store=data&name=mydb");
        assert_eq!(l.to_string(), "kv://x?name=mydb&store=data");
    }

    #[test]
    fn display_escapes_reserved_characters() {
        let l = Locator::new("kv", "a dir/b")
            .unwrap()
            .build()
            .set_param("name", "a&b=c")
            .locator();
        assert_eq!(l.to_string(), "kv://a%20dir/b?name=a%26b%3Dc");
        assert_eq!(loc(&l.to_string()), l);
    }

    #[test]
    fn equality_ignores_param_order() {
        assert_eq!(
            loc("kv://x?name=a&store=data"),
            loc("kv://x?store=data&name=a")
        );
    }

    #[test]
    fn equality_considers_path_and_scheme() {
        assert_ne!(loc("kv://x?name=a"), loc("kv://y?name=a"));
        assert_ne!(loc("kv://x?name=a"), loc("mem://x?name=a"));
    }

    #[test]
    fn serde_uses_string_form() {
        let l = loc("kv://x?name=a&store=data");
        let json = serde_json::to_string(&l).unwrap();
        assert_eq!(json, "\"kv://x?name=a&store=data\"");
        let back: Locator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, l);
        assert!(serde_json::from_str::<Locator>("\"no-scheme\"").is_err());
    }

    proptest::proptest! {
        #[test]
        fn display_reparses_to_equal_locator(
            path in "[ -~]{0,16}",
            name in "\\PC{0,12}",
            key in "\\PC{0,12}",
        ) {
            let l = Locator::new("kv", path)
                .unwrap()
                .build()
                .set_param("name", name)
                .set_param("key", key)
                .locator();
            proptest::prop_assert_eq!(Locator::parse(&l.to_string()).unwrap(), l);
        }
    }
}
