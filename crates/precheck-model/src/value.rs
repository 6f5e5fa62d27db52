//! Typed parameter values
//!
//! Knowledge bases and collectors hand over loosely typed JSON. This module
//! folds it into a closed sum type so every comparison has an explicit rule
//! per tag pair.
//!
//! # Core Concepts
//!
//! - [`Value`]: tagged union over every shape a configuration value takes
//! - [`ValueType`]: declared type tag driving comparison semantics
//! - [`ParameterValue`]: a value plus its type tag, as carried by knowledge
//!   bases and snapshots

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Declared type tag of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum ValueType {
    /// Free-form text
    #[default]
    String,
    /// Integer
    Int,
    /// Floating point number
    Float,
    /// Boolean switch
    Bool,
    /// Time span (`30s`, `1h30m`, bare numbers are seconds)
    Duration,
    /// Byte size (`512MiB`, `1GB`, bare numbers are bytes)
    Size,
    /// Ordered list, compared as a set
    Array,
    /// Nested key/value structure
    Map,
}

impl ValueType {
    /// Canonical tag name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Duration => "duration",
            Self::Size => "size",
            Self::Array => "array",
            Self::Map => "map",
        }
    }

    /// Parse a tag leniently; unknown tags fall back to [`ValueType::String`]
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "int" | "int32" | "int64" | "uint" | "uint32" | "uint64" | "integer" => Self::Int,
            "float" | "float32" | "float64" | "double" | "number" => Self::Float,
            "bool" | "boolean" => Self::Bool,
            "duration" => Self::Duration,
            "size" | "bytesize" | "readablesize" => Self::Size,
            "array" | "list" | "slice" | "[]string" => Self::Array,
            "map" | "object" | "struct" => Self::Map,
            _ => Self::String,
        }
    }
}

impl From<String> for ValueType {
    fn from(value: String) -> Self {
        Self::from_tag(&value)
    }
}

impl From<ValueType> for &'static str {
    fn from(value: ValueType) -> Self {
        value.as_str()
    }
}

/// A configuration value
///
/// Duration and size values keep their raw text; magnitudes are derived on
/// comparison so formatting shows exactly what the cluster reported.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Text
    Str(String),
    /// Time span in raw form
    Duration(String),
    /// Byte size in raw form
    Size(String),
    /// List of values
    List(Vec<Value>),
    /// Nested structure, keys sorted
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Convert untyped JSON, inferring the variant from its shape
    ///
    /// Returns `None` for `null`. Null members of lists and maps are dropped.
    #[must_use]
    pub fn from_json(raw: serde_json::Value) -> Option<Self> {
        match raw {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Self::Bool(b)),
            serde_json::Value::Number(n) => number(&n),
            serde_json::Value::String(s) => Some(Self::Str(s)),
            serde_json::Value::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            serde_json::Value::Object(entries) => Some(Self::Map(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }

    /// Convert JSON honouring a declared type tag
    ///
    /// Values that do not fit the tag keep their inferred shape rather than
    /// failing; comparison copes with mixed representations.
    #[must_use]
    pub fn from_json_typed(raw: serde_json::Value, value_type: ValueType) -> Option<Self> {
        use serde_json::Value as Json;

        match (value_type, raw) {
            (_, Json::Null) => None,
            (ValueType::Int, Json::String(s)) => {
                Some(s.trim().parse::<i64>().map_or(Self::Str(s), Self::Int))
            }
            (ValueType::Float, Json::Number(n)) => n.as_f64().map(Self::Float),
            (ValueType::Float, Json::String(s)) => {
                Some(s.trim().parse::<f64>().map_or(Self::Str(s), Self::Float))
            }
            (ValueType::Bool, Json::String(s)) => {
                Some(parse_bool(&s).map_or(Self::Str(s), Self::Bool))
            }
            (ValueType::Bool, Json::Number(n)) => match n.as_i64() {
                Some(0) => Some(Self::Bool(false)),
                Some(1) => Some(Self::Bool(true)),
                _ => number(&n),
            },
            (ValueType::Duration, Json::String(s)) => Some(Self::Duration(s)),
            (ValueType::Duration, Json::Number(n)) => Some(Self::Duration(n.to_string())),
            (ValueType::Size, Json::String(s)) => Some(Self::Size(s)),
            (ValueType::Size, Json::Number(n)) => Some(Self::Size(n.to_string())),
            (ValueType::Array, Json::String(s)) => Some(Self::List(
                split_list(&s).map(|item| Self::Str(item.to_string())).collect(),
            )),
            (_, other) => Self::from_json(other),
        }
    }

    /// Render back to untyped JSON
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Bool(b) => Json::Bool(*b),
            Self::Str(s) | Self::Duration(s) | Self::Size(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Type tag matching this variant
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Bool(_) => ValueType::Bool,
            Self::Str(_) => ValueType::String,
            Self::Duration(_) => ValueType::Duration,
            Self::Size(_) => ValueType::Size,
            Self::List(_) => ValueType::Array,
            Self::Map(_) => ValueType::Map,
        }
    }

    /// Borrow as a map if structured
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Borrow as text if a plain string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is a list or map
    #[inline]
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }
}

fn number(n: &serde_json::Number) -> Option<Value> {
    n.as_i64()
        .map(Value::Int)
        .or_else(|| n.as_f64().map(Value::Float))
}

/// Interpret switch-like text (`on`/`off`/`true`/`false`)
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" => Some(true),
        "false" | "off" => Some(false),
        _ => None,
    }
}

/// Split comma-separated text into trimmed, non-empty items
pub(crate) fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|item| !item.is_empty())
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(raw).ok_or_else(|| de::Error::custom("null is not a parameter value"))
    }
}

/// A parameter value with its declared type tag
///
/// Accepts both the tagged form `{"value": .., "type": ..}` and a bare JSON
/// value (type inferred), and always serializes in the tagged form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawParameterValue", into = "TaggedParameterValue")]
pub struct ParameterValue {
    value: Option<Value>,
    value_type: ValueType,
    description: Option<String>,
}

impl ParameterValue {
    /// Create from a value, inferring the type tag
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            value_type: value.value_type(),
            value: Some(value),
            description: None,
        }
    }

    /// Create with an explicit type tag
    #[inline]
    #[must_use]
    pub fn typed(value: Value, value_type: ValueType) -> Self {
        Self {
            value: Some(value),
            value_type,
            description: None,
        }
    }

    /// Create from raw JSON under a type tag
    #[must_use]
    pub fn from_json(raw: serde_json::Value, value_type: ValueType) -> Self {
        Self {
            value: Value::from_json_typed(raw, value_type),
            value_type,
            description: None,
        }
    }

    /// Declared but unset parameter
    #[inline]
    #[must_use]
    pub fn unset(value_type: ValueType) -> Self {
        Self {
            value: None,
            value_type,
            description: None,
        }
    }

    /// Attach description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The value, if set
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Declared type tag
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Description, if any
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParameterValue {
    Tagged(TaggedParameterValue),
    Bare(serde_json::Value),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaggedParameterValue {
    value: serde_json::Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl From<RawParameterValue> for ParameterValue {
    fn from(raw: RawParameterValue) -> Self {
        match raw {
            RawParameterValue::Tagged(tagged) => {
                let value_type = tagged
                    .value_type
                    .or_else(|| Value::from_json(tagged.value.clone()).map(|v| v.value_type()))
                    .unwrap_or_default();
                Self {
                    value: Value::from_json_typed(tagged.value, value_type),
                    value_type,
                    description: tagged.description,
                }
            }
            RawParameterValue::Bare(bare) => match Value::from_json(bare) {
                Some(value) => Self::new(value),
                None => Self::unset(ValueType::default()),
            },
        }
    }
}

impl From<ParameterValue> for TaggedParameterValue {
    fn from(param: ParameterValue) -> Self {
        Self {
            value: param
                .value
                .as_ref()
                .map_or(serde_json::Value::Null, Value::to_json),
            value_type: Some(param.value_type),
            description: param.description,
        }
    }
}
