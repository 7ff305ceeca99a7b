//! Document model
//!
//! A loaded document is a [`Value`] tree. Mapping keys are always strings:
//! YAML allows scalar keys such as `404:` or `true:`, and those are
//! stringified on load so they can be selected like any other key.
//! Keys must be unique after stringification.

use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Serialize;

/// Ordered mapping of a document
pub type Mapping = IndexMap<String, Value>;

/// A document node
///
/// String scalars may hold placeholders such as `{!SSM: db/password}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a top-level key. `None` for scalars and sequences.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Short name of the node kind, used in log and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, sequence or mapping")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Integer(i))
    }

    // Past i64::MAX the number is kept as a float
    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        Ok(i64::try_from(u).map_or(Value::Float(u as f64), Value::Integer))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(ScalarKey(key)) = access.next_key()? {
            match map.entry(key) {
                Entry::Occupied(entry) => {
                    return Err(de::Error::custom(format!(
                        "duplicate mapping key `{}`",
                        entry.key()
                    )));
                }
                Entry::Vacant(entry) => {
                    entry.insert(access.next_value()?);
                }
            }
        }
        Ok(Value::Mapping(map))
    }
}

/// A mapping key rendered as text
struct ScalarKey(String);

impl<'de> Deserialize<'de> for ScalarKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarKeyVisitor)
    }
}

struct ScalarKeyVisitor;

impl Visitor<'_> for ScalarKeyVisitor {
    type Value = ScalarKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_unit<E: de::Error>(self) -> Result<ScalarKey, E> {
        Ok(ScalarKey("null".to_string()))
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<ScalarKey, E> {
        Ok(ScalarKey(b.to_string()))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<ScalarKey, E> {
        Ok(ScalarKey(i.to_string()))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<ScalarKey, E> {
        Ok(ScalarKey(u.to_string()))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<ScalarKey, E> {
        Ok(ScalarKey(f.to_string()))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<ScalarKey, E> {
        Ok(ScalarKey(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<ScalarKey, E> {
        Ok(ScalarKey(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(value: &Value) -> Vec<&str> {
        value
            .as_mapping()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_yaml_preserves_key_order() {
        let value: Value = serde_yaml::from_str("z: 1\na: 2\nm: 3\n").unwrap();
        assert_eq!(keys(&value), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_scalar_keys_are_stringified() {
        let value: Value =
            serde_yaml::from_str("404: not found\ntrue: on\n1.5: x\n~: nothing\n").unwrap();

        assert_eq!(keys(&value), vec!["404", "true", "1.5", "null"]);
        assert_eq!(value.get("404").and_then(Value::as_str), Some("not found"));
    }

    #[test]
    fn test_duplicate_key_after_stringify_rejected() {
        let err = serde_yaml::from_str::<Value>("1: a\n'1': b\n").unwrap_err();
        assert!(err.to_string().contains("duplicate mapping key `1`"));
    }

    #[test]
    fn test_collection_key_rejected() {
        assert!(serde_yaml::from_str::<Value>("[a, b]: c\n").is_err());
    }

    #[test]
    fn test_scalar_kinds() {
        let value: Value =
            serde_yaml::from_str("i: -3\nf: 2.5\nb: false\nn: null\ns: '{!ENV: X}'\n").unwrap();

        assert_eq!(value.get("i"), Some(&Value::Integer(-3)));
        assert_eq!(value.get("f"), Some(&Value::Float(2.5)));
        assert_eq!(value.get("b"), Some(&Value::Bool(false)));
        assert!(value.get("n").unwrap().is_null());
        assert_eq!(value.get("s").unwrap().type_name(), "string");
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let value: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(value.type_name(), "float");
    }

    #[test]
    fn test_get_on_non_mapping() {
        assert_eq!(Value::from(vec!["a"]).get("0"), None);
        assert_eq!(Value::Null.get("a"), None);
    }

    #[test]
    fn test_serializes_back_to_plain_yaml() {
        let value: Value = serde_yaml::from_str("404: x\nlist: [1, two]\n").unwrap();
        assert_eq!(
            serde_yaml::to_string(&value).unwrap(),
            "'404': x\nlist:\n- 1\n- two\n"
        );
    }
}
