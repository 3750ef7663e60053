use derive_more::Display;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// An untyped JSON-like object as it arrives from the application layer.
pub type RawObject = BTreeMap<String, RawValue>;

/// A JSON number, keeping integers apart from floats so their textual
/// forms survive unchanged.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    UnsignedInteger(u64),
    SignedInteger(i64),
    Float(OrderedFloat<f64>),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::UnsignedInteger(v) => *v as f64,
            Self::SignedInteger(v) => *v as f64,
            Self::Float(v) => v.0,
        }
    }

    /// Returns the value as a `u32` if it is a non-negative integral number in range.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UnsignedInteger(v) => u32::try_from(*v).ok(),
            Self::SignedInteger(v) => u32::try_from(*v).ok(),
            Self::Float(v) => {
                let v = v.0;
                if v.fract() == 0.0 && v >= 0.0 && v <= f64::from(u32::MAX) {
                    Some(v as u32)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsignedInteger(v) => write!(f, "{v}"),
            Self::SignedInteger(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{}", v.0),
        }
    }
}

/// Shape of a [`RawValue`], used in diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub enum ValueKind {
    #[display("null")]
    Null,
    #[display("boolean")]
    Bool,
    #[display("number")]
    Number,
    #[display("string")]
    String,
    #[display("array")]
    Array,
    #[display("object")]
    Object,
}

/// Tagged-union decode of an untyped JSON value.
///
/// Every payload crossing the bridge is decoded into this type before any
/// field-specific logic runs.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<RawValue>),
    Object(RawObject),
}

impl RawValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RawValue]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&RawObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Looks up `key` if this is an object.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Textual form of the value.
    ///
    /// Strings are returned as-is (unquoted), scalars use their JSON text and
    /// arrays/objects their compact JSON encoding.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Array(_) | Self::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Self::Number(Number::UnsignedInteger(u))
                } else if let Some(i) = n.as_i64() {
                    Self::Number(Number::SignedInteger(i))
                } else {
                    n.as_f64()
                        .map_or(Self::Null, |f| Self::Number(Number::Float(OrderedFloat(f))))
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(a) => Self::Array(a.into_iter().map(Self::from).collect()),
            Value::Object(o) => Self::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u64> for RawValue {
    fn from(v: u64) -> Self {
        Self::Number(Number::UnsignedInteger(v))
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Number(Number::SignedInteger(v))
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(Number::Float(OrderedFloat(v)))
    }
}

impl From<RawObject> for RawValue {
    fn from(v: RawObject) -> Self {
        Self::Object(v)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(v: Vec<RawValue>) -> Self {
        Self::Array(v)
    }
}
