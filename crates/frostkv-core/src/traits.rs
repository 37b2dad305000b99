use crate::{
    model::field::{FieldDecl, FieldShape, ScalarType},
    value::{Value, ValueError},
};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// RECORDS
// ============================================================================

///
/// Model
///
/// A record type that can be registered and persisted.
///
/// Normally produced by `#[derive(Model)]`; the derive flattens the
/// `DefaultData` block into `id`/`set_id` and reports every other named
/// field through `fields`, `get_value` and `set_value`.
///

pub trait Model: Default + Send + Sync + 'static {
    /// Rust type name; the default model name when none is given.
    const TYPE_NAME: &'static str;

    /// Declared fields in order, with their raw option strings.
    fn fields() -> Vec<FieldDecl>;

    /// Current id; empty until the first save.
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Value of a declared field. Fails with `ValueError::UnknownField`
    /// for an unknown name.
    fn get_value(&self, field: &str) -> Result<Value, ValueError>;

    /// Assign a declared field. Returns `false` for an unknown name or a
    /// value that does not convert to the field's type.
    fn set_value(&mut self, field: &str, value: &Value) -> bool;
}

// ============================================================================
// FIELD VALUES
// ============================================================================

///
/// FieldValue
///
/// Conversion boundary between a Rust field type and [`Value`], plus the
/// shape the spec compiler uses to classify the field.
///

pub trait FieldValue: Sized {
    fn shape() -> FieldShape;

    fn to_value(&self) -> Result<Value, ValueError>;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>;
}

impl FieldValue for String {
    fn shape() -> FieldShape {
        FieldShape::scalar(ScalarType::Text)
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    fn shape() -> FieldShape {
        FieldShape::scalar(ScalarType::Bool)
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FieldValue for f64 {
    fn shape() -> FieldShape {
        FieldShape::scalar(ScalarType::Float)
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Float(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FieldValue for f32 {
    fn shape() -> FieldShape {
        FieldShape::scalar(ScalarType::Float)
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Float(f64::from(*self)))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v as Self),
            _ => None,
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn shape() -> FieldShape {
        match T::shape() {
            FieldShape::Scalar { ty, .. } => FieldShape::optional(ty),
            other => other,
        }
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }

        T::from_value(value).map(Some)
    }
}

impl<V: Serialize + DeserializeOwned> FieldValue for HashMap<String, V> {
    fn shape() -> FieldShape {
        FieldShape::Map
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        json_value(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        from_json_value(value)
    }
}

impl<V: Serialize + DeserializeOwned> FieldValue for BTreeMap<String, V> {
    fn shape() -> FieldShape {
        FieldShape::Map
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        json_value(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        from_json_value(value)
    }
}

/// Serialize into `Value::Json`. The JSON form must read back as `T`:
/// serde writes non-finite floats as `null`, which a float field rejects.
pub(crate) fn json_value<T: Serialize + DeserializeOwned>(
    value: &T,
) -> Result<Value, ValueError> {
    let json = serde_json::to_value(value).map_err(ValueError::Serialize)?;
    serde_json::from_value::<T>(json.clone()).map_err(ValueError::Lossy)?;

    Ok(Value::Json(json))
}

pub(crate) fn from_json_value<T: DeserializeOwned>(value: &Value) -> Option<T> {
    match value {
        Value::Json(json) => serde_json::from_value(json.clone()).ok(),
        _ => None,
    }
}

// impl_field_value
macro_rules! impl_field_value {
    ( $( $type:ty => $variant:ident ( $scalar:ident ) ),* $(,)? ) => {
        $(
            impl FieldValue for $type {
                fn shape() -> FieldShape {
                    FieldShape::scalar(ScalarType::$scalar)
                }

                fn to_value(&self) -> Result<Value, ValueError> {
                    Ok(Value::$variant((*self).into()))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => (*v).try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field_value!(
    i8 => Int(Int),
    i16 => Int(Int),
    i32 => Int(Int),
    i64 => Int(Int),
    u8 => Uint(Uint),
    u16 => Uint(Uint),
    u32 => Uint(Uint),
    u64 => Uint(Uint),
);

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_integers_reject_out_of_range_values() {
        assert_eq!(i8::from_value(&Value::Int(12)), Some(12));
        assert_eq!(i8::from_value(&Value::Int(300)), None);
        assert_eq!(u16::from_value(&Value::Int(1)), None);
    }

    #[test]
    fn option_marks_scalar_as_optional() {
        assert_eq!(
            <Option<i32>>::shape(),
            FieldShape::optional(ScalarType::Int)
        );
        assert_eq!(<Option<i32>>::from_value(&Value::Null), Some(None));
        assert_eq!(<Option<i32>>::from_value(&Value::Int(7)), Some(Some(7)));
        assert_eq!(None::<i32>.to_value().expect("null"), Value::Null);
    }

    #[test]
    fn maps_round_trip_through_json() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1_u32);
        map.insert("b".to_string(), 2_u32);

        let value = map.to_value().expect("map should serialize");
        assert!(matches!(value, Value::Json(_)));
        assert_eq!(BTreeMap::<String, u32>::from_value(&value), Some(map));
    }

    #[test]
    fn non_finite_floats_in_json_are_refused() {
        let mut map = BTreeMap::new();
        map.insert("x".to_string(), f64::NAN);

        let err = map.to_value().expect_err("NaN has no json form");
        assert!(matches!(err, ValueError::Lossy(_)));

        map.insert("x".to_string(), 1.5);
        assert!(map.to_value().is_ok());
    }
}
