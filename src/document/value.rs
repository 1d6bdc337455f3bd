//! Compiled values
//!
//! Scalars are `bson::Bson`. Arrays and nested documents stay in the
//! compiler's own types so a nested compiled document (the filter inside
//! `$query`) keeps repeated keys. Values render to relaxed extended JSON
//! (`$oid`, `$binary`, `$date`, `$code`).

use std::fmt;

use bson::Bson;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use super::document::Document;

/// A value understood by the document store
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Store scalar (or an opaque BSON array/document taken as-is)
    Bson(Bson),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    pub const NULL: Value = Value::Bson(Bson::Null);

    /// Raw executable expression passed to the store verbatim
    pub fn code(code: impl Into<String>) -> Self {
        Value::Bson(Bson::JavaScriptCode(code.into()))
    }

    /// Returns the integer payload, if any
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bson(Bson::Int64(n)) => Some(*n),
            Value::Bson(Bson::Int32(n)) => Some(i64::from(*n)),
            _ => None,
        }
    }

    /// Returns the nested document, if any
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Short type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bson(Bson::Null) => "null",
            Value::Bson(Bson::Boolean(_)) => "bool",
            Value::Bson(Bson::Int32(_) | Bson::Int64(_)) => "int",
            Value::Bson(Bson::Double(_)) => "float",
            Value::Bson(Bson::String(_)) => "string",
            Value::Bson(Bson::ObjectId(_)) => "objectId",
            Value::Bson(Bson::Binary(_)) => "binary",
            Value::Bson(Bson::DateTime(_)) => "date",
            Value::Bson(Bson::JavaScriptCode(_)) => "code",
            Value::Bson(_) => "bson",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<Bson> for Value {
    fn from(bson: Bson) -> Self {
        Value::Bson(bson)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bson(Bson::Boolean(b))
    }
}

/// Integers are always stored as 64-bit
impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Bson(Bson::Int64(i64::from(n)))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Bson(Bson::Int64(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Bson(Bson::Double(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bson(Bson::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bson(Bson::String(s))
    }
}

impl From<bson::oid::ObjectId> for Value {
    fn from(id: bson::oid::ObjectId) -> Self {
        Value::Bson(Bson::ObjectId(id))
    }
}

impl From<bson::DateTime> for Value {
    fn from(dt: bson::DateTime) -> Self {
        Value::Bson(Bson::DateTime(dt))
    }
}

impl From<bson::Binary> for Value {
    fn from(bin: bson::Binary) -> Self {
        Value::Bson(Bson::Binary(bin))
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::NULL, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::NULL,
            serde_json::Value::Bool(b) => Value::from(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::from(i),
                None => Value::from(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Document(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bson(bson) => bson.clone().into_relaxed_extjson().serialize(serializer),
            Value::Array(items) => items.serialize(serializer),
            Value::Document(doc) => doc.serialize(serializer),
        }
    }
}

/// Plain JSON input: objects become ordered documents, duplicate keys kept.
///
/// Extended JSON wrappers are not interpreted; use a tagged expression to
/// obtain object ids, binaries or dates.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::NULL)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::NULL)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::from(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Value, E> {
        Ok(Value::from(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Value, E> {
        Ok(i64::try_from(n).map_or(Value::from(n as f64), Value::from))
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<Value, E> {
        Ok(Value::from(n))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut pairs = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            pairs.push((key, value));
        }
        Ok(Value::Document(Document::from_pairs(pairs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use bson::spec::BinarySubtype;

    #[test]
    fn test_extended_json_rendering() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(
            Value::from(id).to_string(),
            r#"{"$oid":"507f1f77bcf86cd799439011"}"#
        );

        let bin = Value::from(bson::Binary {
            subtype: BinarySubtype::Uuid,
            bytes: vec![1, 2, 3],
        });
        assert_eq!(
            bin.to_string(),
            r#"{"$binary":{"base64":"AQID","subType":"04"}}"#
        );

        let dt = Value::from(bson::DateTime::from_millis(1_704_164_645_000));
        assert!(dt.to_string().starts_with(r#"{"$date":"2024-01-02T03:04:05"#));

        assert_eq!(
            Value::code("this.a > 1").to_string(),
            r#"{"$code":"this.a > 1"}"#
        );
    }

    #[test]
    fn test_integers_render_plain() {
        assert_eq!(Value::from(7).to_string(), "7");
        assert_eq!(Value::from(7), Value::from(7i64));
        assert_eq!(Value::from(7).as_i64(), Some(7));
        assert_eq!(Value::NULL.to_string(), "null");
    }

    #[test]
    fn test_deserialize_keeps_key_order_and_duplicates() {
        let value: Value = serde_json::from_str(r#"{"b": 1, "a": 2, "b": 3}"#).unwrap();
        let doc = value.as_document().unwrap();
        let keys: Vec<&str> = doc.keys().collect();
        assert_eq!(keys, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let value: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(value.type_name(), "float");
    }

    #[test]
    fn test_from_json_value() {
        let value = Value::from(serde_json::json!({"a": [1, null]}));
        assert_eq!(value.to_string(), r#"{"a":[1,null]}"#);
    }
}
