use std::fmt;
use std::sync::Arc;

use crate::error::{KvError, KvResult};

/// The kind of a stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Bytes,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
        }
    }
}

/// A value held in a namespace: native bytes or a UTF-8 string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KvValue {
    Bytes(Vec<u8>),
    String(String),
}

impl KvValue {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bytes(_) => ValueKind::Bytes,
            Self::String(_) => ValueKind::String,
        }
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(b) => b.len(),
            Self::String(s) => s.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One namespace of an embedded key-value store.
///
/// All implementations must satisfy these invariants:
/// - `get` on a key that was never written returns `Ok(None)`.
/// - A write is visible to every subsequent read through any handle to the
///   same namespace in this process.
/// - `set` overwrites; values are stored verbatim.
/// - `delete` of a missing key is `Ok(false)`.
/// - `clear_all` leaves the namespace empty but usable.
pub trait KvStore: Send + Sync + fmt::Debug {
    /// The namespace this store was opened with.
    fn namespace(&self) -> &str;

    /// Read the value under `key`.
    fn get(&self, key: &str) -> KvResult<Option<KvValue>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: KvValue) -> KvResult<()>;

    /// Remove `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> KvResult<bool>;

    /// All keys currently present, sorted.
    fn keys(&self) -> KvResult<Vec<String>>;

    /// Remove every key in the namespace.
    fn clear_all(&self) -> KvResult<()>;

    /// Make completed writes durable. A no-op for drivers without buffering.
    fn flush(&self) -> KvResult<()> {
        Ok(())
    }

    /// Read a bytes value. A string value under `key` is a type mismatch.
    fn get_bytes(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        match self.get(key)? {
            None => Ok(None),
            Some(KvValue::Bytes(bytes)) => Ok(Some(bytes)),
            Some(other) => Err(KvError::TypeMismatch {
                key: key.to_string(),
                expected: ValueKind::Bytes,
                found: other.kind(),
            }),
        }
    }

    /// Read a string value. A bytes value under `key` is a type mismatch.
    fn get_string(&self, key: &str) -> KvResult<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(KvValue::String(s)) => Ok(Some(s)),
            Some(other) => Err(KvError::TypeMismatch {
                key: key.to_string(),
                expected: ValueKind::String,
                found: other.kind(),
            }),
        }
    }

    fn set_bytes(&self, key: &str, bytes: &[u8]) -> KvResult<()> {
        self.set(key, KvValue::Bytes(bytes.to_vec()))
    }

    fn set_string(&self, key: &str, value: &str) -> KvResult<()> {
        self.set(key, KvValue::String(value.to_string()))
    }

    fn contains(&self, key: &str) -> KvResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Opens namespaces of an embedded key-value store.
pub trait KvBackend: Send + Sync + fmt::Debug {
    /// Open (or create) the namespace `name`.
    fn open(&self, name: &str) -> KvResult<Arc<dyn KvStore>>;

    /// Names of all namespaces that currently exist, sorted.
    fn namespaces(&self) -> KvResult<Vec<String>>;
}

/// Validate a namespace name. Namespaces must be non-empty and free of
/// control characters.
pub fn validate_namespace(name: &str) -> KvResult<()> {
    if name.is_empty() {
        return Err(KvError::InvalidNamespace {
            name: name.to_string(),
            reason: "namespace must not be empty".into(),
        });
    }
    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(KvError::InvalidNamespace {
            name: name.to_string(),
            reason: format!("contains control character: {ch:?}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kind_and_len() {
        let b = KvValue::Bytes(vec![1, 2, 3]);
        let s = KvValue::String("hé".into());
        assert_eq!(b.kind(), ValueKind::Bytes);
        assert_eq!(s.kind(), ValueKind::String);
        assert_eq!(b.len(), 3);
        assert_eq!(s.len(), 3);
        assert!(KvValue::Bytes(vec![]).is_empty());
    }

    #[test]
    fn namespace_validation() {
        assert!(validate_namespace("mydb-data").is_ok());
        assert!(validate_namespace("keybag").is_ok());
        assert!(validate_namespace("").is_err());
        assert!(validate_namespace("a\nb").is_err());
    }
}
