//! DynamoDB `AttributeValue` type with custom serialization.
//!
//! `AttributeValue` is a tagged union where exactly one variant is present.
//! The JSON wire format uses single-key objects like `{"S": "hello"}`.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// DynamoDB attribute value.
///
/// Numbers are always string-encoded to preserve arbitrary precision.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String value.
    S(String),
    /// Number value (string-encoded for arbitrary precision).
    N(String),
    /// Binary value (base64-encoded in JSON).
    B(bytes::Bytes),
    /// String Set.
    Ss(Vec<String>),
    /// Number Set (string-encoded).
    Ns(Vec<String>),
    /// Binary Set (base64-encoded in JSON).
    Bs(Vec<bytes::Bytes>),
    /// Boolean value.
    Bool(bool),
    /// Null value.
    Null(bool),
    /// List of attribute values.
    L(Vec<AttributeValue>),
    /// Map of attribute values.
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Returns the string value if this is an `S` variant.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number string if this is an `N` variant.
    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    /// Render the value the way a results grid shows it in a cell.
    ///
    /// Scalars render bare (`hello`, `42`, `true`, `null`). Lists and maps
    /// render as JSON whose leaves are the rendered children, so nested
    /// strings and numbers both appear as JSON strings.
    #[must_use]
    pub fn display_value(&self) -> String {
        match self {
            Self::S(s) | Self::N(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Null(_) => "null".to_owned(),
            Self::B(b) => base64::engine::general_purpose::STANDARD.encode(b),
            _ => self.display_json().to_string(),
        }
    }

    fn display_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Ss(v) | Self::Ns(v) => {
                Value::Array(v.iter().cloned().map(Value::String).collect())
            }
            Self::Bs(v) => Value::Array(
                v.iter()
                    .map(|b| Value::String(base64::engine::general_purpose::STANDARD.encode(b)))
                    .collect(),
            ),
            Self::L(list) => Value::Array(
                list.iter()
                    .map(|v| Value::String(v.display_value()))
                    .collect(),
            ),
            Self::M(m) => Value::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.display_value())))
                    .collect(),
            ),
            scalar => Value::String(scalar.display_value()),
        }
    }
}

impl Eq for AttributeValue {}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_value())
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::S(s) => map.serialize_entry("S", s)?,
            Self::N(n) => map.serialize_entry("N", n)?,
            Self::B(b) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(b);
                map.serialize_entry("B", &encoded)?;
            }
            Self::Ss(v) => map.serialize_entry("SS", v)?,
            Self::Ns(v) => map.serialize_entry("NS", v)?,
            Self::Bs(v) => {
                let encoded: Vec<String> = v
                    .iter()
                    .map(|b| base64::engine::general_purpose::STANDARD.encode(b))
                    .collect();
                map.serialize_entry("BS", &encoded)?;
            }
            Self::Bool(b) => map.serialize_entry("BOOL", b)?,
            Self::Null(b) => map.serialize_entry("NULL", b)?,
            Self::L(list) => map.serialize_entry("L", list)?,
            Self::M(m) => map.serialize_entry("M", m)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a DynamoDB AttributeValue object with exactly one type key")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Err(de::Error::custom(
                "AttributeValue must have exactly one key",
            ));
        };

        let value = match key.as_str() {
            "S" => AttributeValue::S(map.next_value()?),
            "N" => AttributeValue::N(map.next_value()?),
            "B" => {
                let encoded: String = map.next_value()?;
                AttributeValue::B(decode_binary(&encoded).map_err(de::Error::custom)?)
            }
            "SS" => AttributeValue::Ss(map.next_value()?),
            "NS" => AttributeValue::Ns(map.next_value()?),
            "BS" => {
                let encoded: Vec<String> = map.next_value()?;
                let decoded: Result<Vec<bytes::Bytes>, _> =
                    encoded.iter().map(String::as_str).map(decode_binary).collect();
                AttributeValue::Bs(decoded.map_err(de::Error::custom)?)
            }
            "BOOL" => AttributeValue::Bool(map.next_value()?),
            "NULL" => AttributeValue::Null(map.next_value()?),
            "L" => AttributeValue::L(map.next_value()?),
            "M" => AttributeValue::M(map.next_value()?),
            other => {
                return Err(de::Error::unknown_field(
                    other,
                    &["S", "N", "B", "SS", "NS", "BS", "BOOL", "NULL", "L", "M"],
                ));
            }
        };

        Ok(value)
    }
}

/// Decode a base64 binary literal as carried on the wire.
pub fn decode_binary(encoded: &str) -> Result<bytes::Bytes, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map(bytes::Bytes::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_serialize_number_value() {
        let val = AttributeValue::N("42".to_owned());
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"N":"42"}"#);
    }

    #[test]
    fn test_should_serialize_null_value() {
        let val = AttributeValue::Null(true);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"NULL":true}"#);
    }

    #[test]
    fn test_should_deserialize_nested_map() {
        let json = r#"{"M":{"tags":{"L":[{"S":"a"},{"N":"1"}]}}}"#;
        let val: AttributeValue = serde_json::from_str(json).unwrap();
        let AttributeValue::M(m) = val else {
            panic!("expected map");
        };
        assert!(matches!(m.get("tags"), Some(AttributeValue::L(l)) if l.len() == 2));
    }

    #[test]
    fn test_should_reject_unknown_type_key() {
        let result: Result<AttributeValue, _> = serde_json::from_str(r#"{"X":"1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_should_display_scalars_bare() {
        assert_eq!(AttributeValue::S("hello".to_owned()).display_value(), "hello");
        assert_eq!(AttributeValue::N("12.5".to_owned()).display_value(), "12.5");
        assert_eq!(AttributeValue::Bool(false).display_value(), "false");
        assert_eq!(AttributeValue::Null(true).display_value(), "null");
    }

    #[test]
    fn test_should_display_list_of_rendered_children() {
        let val = AttributeValue::L(vec![
            AttributeValue::S("a".to_owned()),
            AttributeValue::N("1".to_owned()),
            AttributeValue::Bool(true),
        ]);
        assert_eq!(val.display_value(), r#"["a","1","true"]"#);
    }

    #[test]
    fn test_should_display_map_with_sorted_keys() {
        let val = AttributeValue::M(HashMap::from([
            ("z".to_owned(), AttributeValue::N("2".to_owned())),
            ("a".to_owned(), AttributeValue::S("x".to_owned())),
        ]));
        assert_eq!(val.display_value(), r#"{"a":"x","z":"2"}"#);
    }

    #[test]
    fn test_should_display_binary_as_base64() {
        let val = AttributeValue::B(bytes::Bytes::from_static(b"hi"));
        assert_eq!(val.display_value(), "aGk=");
        assert_eq!(val.to_string(), "aGk=");
    }
}
