mod wire;

pub(crate) use wire::{decode, encode};

use thiserror::Error as ThisError;

///
/// Value
///
/// Runtime value of one record field, independent of the Rust type that
/// produced it.
///
/// Null  → the field's value is `Option::None`; nothing is stored for it.
/// Json  → embedded structs and string-keyed maps.
/// Ref   → id of one related record.
/// Refs  → ids of many related records, order preserved.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    Ref(String),
    Refs(Vec<String>),
}

///
/// ValueError
/// A field that cannot be turned into a storable [`Value`].
///

#[derive(Debug, ThisError)]
pub enum ValueError {
    #[error("no such field")]
    UnknownField,

    #[error("cannot serialize to json: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("json form does not read back as the field type: {0}")]
    Lossy(#[source] serde_json::Error),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short, stable label used in diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Json(_) => "json",
            Self::Ref(_) => "ref",
            Self::Refs(_) => "refs",
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Uint(value.into())
    }
}
