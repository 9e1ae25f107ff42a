//! Typed metadata attribute model.
//!
//! A [`Metadata`] is an insertion-ordered map from key to [`MetadataValue`].
//! Values are scalars (`string`/`int`/`float`/`bool`) or homogeneous arrays
//! of the same four kinds — exactly the set chroma's server accepts. JSON
//! numbers without a fractional component or exponent decode as `Int`;
//! everything else numeric decodes as `Float`, mirroring the behavior of
//! `serde_json::Number` itself, so no raw-text sniffing is needed.

use crate::error::MetadataError;
use compact_str::CompactString;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

/// Most metadata arrays are tag lists with a handful of entries; inline
/// storage for up to 4 avoids a heap allocation for the common case.
type ValueArray<T> = SmallVec<[T; 4]>;

/// A single metadata attribute value: one of four scalar kinds, or a
/// homogeneous array of one of those kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// A UTF-8 string.
    Str(CompactString),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A homogeneous array of strings.
    StrArray(ValueArray<CompactString>),
    /// A homogeneous array of integers.
    IntArray(ValueArray<i64>),
    /// A homogeneous array of floats.
    FloatArray(ValueArray<f64>),
    /// A homogeneous array of booleans.
    BoolArray(ValueArray<bool>),
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetadataValue::Str(s) => serializer.serialize_str(s),
            MetadataValue::Int(i) => serializer.serialize_i64(*i),
            MetadataValue::Float(f) => serializer.serialize_f64(*f),
            MetadataValue::Bool(b) => serializer.serialize_bool(*b),
            MetadataValue::StrArray(v) => v.serialize(serializer),
            MetadataValue::IntArray(v) => v.serialize(serializer),
            MetadataValue::FloatArray(v) => v.serialize(serializer),
            MetadataValue::BoolArray(v) => v.serialize(serializer),
        }
    }
}

impl MetadataValue {
    fn from_json(key: &str, value: serde_json::Value) -> Result<Self, MetadataError> {
        use serde_json::Value;
        match value {
            Value::String(s) => Ok(MetadataValue::Str(CompactString::from(s))),
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Ok(MetadataValue::Int(n.as_i64().unwrap_or_else(|| n.as_f64().unwrap() as i64)))
                } else {
                    n.as_f64()
                        .map(MetadataValue::Float)
                        .ok_or_else(|| MetadataError::UnsupportedValue { key: key.to_string() })
                }
            }
            Value::Bool(b) => Ok(MetadataValue::Bool(b)),
            Value::Array(items) => Self::array_from_json(key, items),
            Value::Null | Value::Object(_) => {
                Err(MetadataError::UnsupportedValue { key: key.to_string() })
            }
        }
    }

    fn array_from_json(key: &str, items: Vec<serde_json::Value>) -> Result<Self, MetadataError> {
        use serde_json::Value;
        let Some(first) = items.first() else {
            return Ok(MetadataValue::StrArray(ValueArray::new()));
        };
        match first {
            Value::String(_) => {
                let mut out = ValueArray::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => out.push(CompactString::from(s)),
                        _ => return Err(MetadataError::MixedArray { key: key.to_string() }),
                    }
                }
                Ok(MetadataValue::StrArray(out))
            }
            Value::Bool(_) => {
                let mut out = ValueArray::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Bool(b) => out.push(b),
                        _ => return Err(MetadataError::MixedArray { key: key.to_string() }),
                    }
                }
                Ok(MetadataValue::BoolArray(out))
            }
            Value::Number(n) if n.is_i64() || n.is_u64() => {
                let mut out = ValueArray::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Number(n) if n.is_i64() || n.is_u64() => {
                            out.push(n.as_i64().unwrap_or_else(|| n.as_f64().unwrap() as i64))
                        }
                        _ => return Err(MetadataError::MixedArray { key: key.to_string() }),
                    }
                }
                Ok(MetadataValue::IntArray(out))
            }
            Value::Number(_) => {
                let mut out = ValueArray::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Number(n) => match n.as_f64() {
                            Some(f) => out.push(f),
                            None => {
                                return Err(MetadataError::UnsupportedValue { key: key.to_string() })
                            }
                        },
                        _ => return Err(MetadataError::MixedArray { key: key.to_string() }),
                    }
                }
                Ok(MetadataValue::FloatArray(out))
            }
            Value::Null | Value::Object(_) | Value::Array(_) => {
                Err(MetadataError::UnsupportedValue { key: key.to_string() })
            }
        }
    }
}

/// An insertion-ordered collection of metadata attributes attached to a
/// record, with "last write wins, original position kept" duplicate-key
/// semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(CompactString, MetadataValue)>,
}

impl Metadata {
    /// An empty metadata map.
    pub fn new() -> Self {
        Metadata::default()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this metadata has no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace an attribute. Replacing keeps the key's original
    /// position in iteration order.
    pub fn insert(&mut self, key: impl Into<CompactString>, value: MetadataValue) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, key: impl Into<CompactString>, value: MetadataValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up an attribute by key.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn try_from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, MetadataError> {
        let mut metadata = Metadata::new();
        for (key, value) in map {
            let parsed = MetadataValue::from_json(&key, value)?;
            metadata.insert(key, parsed);
        }
        Ok(metadata)
    }
}

/// Build a string attribute.
pub fn string_attribute(value: impl Into<CompactString>) -> MetadataValue {
    MetadataValue::Str(value.into())
}

/// Build an integer attribute.
pub fn int_attribute(value: i64) -> MetadataValue {
    MetadataValue::Int(value)
}

/// Build a float attribute.
pub fn float_attribute(value: f64) -> MetadataValue {
    MetadataValue::Float(value)
}

/// Build a boolean attribute.
pub fn bool_attribute(value: bool) -> MetadataValue {
    MetadataValue::Bool(value)
}

/// Build a string array attribute.
pub fn string_array_attribute<I, S>(values: I) -> MetadataValue
where
    I: IntoIterator<Item = S>,
    S: Into<CompactString>,
{
    MetadataValue::StrArray(values.into_iter().map(Into::into).collect())
}

/// Build an integer array attribute.
pub fn int_array_attribute(values: impl IntoIterator<Item = i64>) -> MetadataValue {
    MetadataValue::IntArray(values.into_iter().collect())
}

/// Build a float array attribute.
pub fn float_array_attribute(values: impl IntoIterator<Item = f64>) -> MetadataValue {
    MetadataValue::FloatArray(values.into_iter().collect())
}

/// Build a boolean array attribute.
pub fn bool_array_attribute(values: impl IntoIterator<Item = bool>) -> MetadataValue {
    MetadataValue::BoolArray(values.into_iter().collect())
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k.as_str(), v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Metadata::try_from_json_map(map).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_literal_decodes_as_int() {
        let metadata: Metadata = serde_json::from_value(json!({"count": 5})).unwrap();
        assert_eq!(metadata.get("count"), Some(&MetadataValue::Int(5)));
    }

    #[test]
    fn fractional_literal_decodes_as_float() {
        let metadata: Metadata = serde_json::from_value(json!({"score": 5.0})).unwrap();
        assert_eq!(metadata.get("score"), Some(&MetadataValue::Float(5.0)));
    }

    #[test]
    fn mixed_array_is_rejected() {
        let result: Result<Metadata, _> = serde_json::from_value(json!({"tags": ["a", 1]}));
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_key_keeps_position_and_last_write() {
        let mut metadata = Metadata::new();
        metadata.insert("a", int_attribute(1));
        metadata.insert("b", int_attribute(2));
        metadata.insert("a", int_attribute(3));
        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(metadata.get("a"), Some(&MetadataValue::Int(3)));
    }
}
