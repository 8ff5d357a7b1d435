use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult};

/// Field names owned by [`KeyItem`] itself; they cannot appear in `extra`.
pub const RESERVED_FIELDS: [&str; 2] = ["name", "key"];

/// A persisted key record.
///
/// `name` identifies the key to the encryption layer and `key` carries the
/// encoded key material. Any other fields the encryption layer attaches are
/// kept in `extra` and written back verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyItem {
    pub name: String,
    pub key: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KeyItem {
    /// A record with no extra fields.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra field.
    ///
    /// A reserved name is kept in `extra` and makes [`to_json`](Self::to_json)
    /// fail, since it would shadow the typed field on the next read.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Encode as a JSON object string.
    ///
    /// Fails with [`GatewayError::Serialization`] when `extra` holds a
    /// reserved field name.
    pub fn to_json(&self) -> GatewayResult<String> {
        if let Some(field) = RESERVED_FIELDS.iter().find(|f| self.extra.contains_key(**f)) {
            return Err(GatewayError::Serialization(format!(
                "extra field {field:?} collides with a key item field"
            )));
        }
        serde_json::to_string(self).map_err(|e| GatewayError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_fields_are_flattened() {
        let item = KeyItem::new("main", "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg").with_field("created", 1700);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"], "main");
        assert_eq!(json["created"], 1700);
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn unknown_fields_survive_decoding() {
        let text = r#"{"name":"k","key":"abc","keys":{"a":{"default":true}}}"#;
        let item: KeyItem = serde_json::from_str(text).unwrap();
        assert_eq!(item.key, "abc");
        assert_eq!(item.extra["keys"]["a"]["default"], true);
        let back: Value = serde_json::to_value(&item).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(text).unwrap());
    }

    #[test]
    fn to_json_decodes_back() {
        let item = KeyItem::new("main", "z3k").with_field("created", 1700);
        let text = item.to_json().unwrap();
        assert_eq!(serde_json::from_str::<KeyItem>(&text).unwrap(), item);
    }

    #[test]
    fn reserved_extra_field_cannot_encode() {
        for field in RESERVED_FIELDS {
            let item = KeyItem::new("main", "z3k").with_field(field, "other");
            assert!(matches!(item.to_json(), Err(GatewayError::Serialization(_))));
        }
    }

    #[test]
    fn missing_required_field_is_error() {
        assert!(serde_json::from_str::<KeyItem>(r#"{"name":"k"}"#).is_err());
    }
}
