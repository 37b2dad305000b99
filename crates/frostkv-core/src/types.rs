use crate::{
    model::field::FieldShape,
    traits::{FieldValue, Model, from_json_value, json_value},
    value::{Value, ValueError},
};
use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{fmt, marker::PhantomData};

///
/// DefaultData
///
/// Identity block embedded in every record. `#[derive(Model)]` flattens it:
/// the id is the key of the record, never a stored hash field.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct DefaultData {
    pub id: String,
}

impl DefaultData {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

///
/// Embedded
///
/// A nested struct stored inline in the primary hash as JSON.
///

#[derive(
    Clone, Debug, Default, Deref, DerefMut, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct Embedded<T>(pub T);

impl<T: Serialize + DeserializeOwned> FieldValue for Embedded<T> {
    fn shape() -> FieldShape {
        FieldShape::Embedded
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        json_value(&self.0)
    }

    fn from_value(value: &Value) -> Option<Self> {
        from_json_value(value).map(Self)
    }
}

///
/// Ref
///
/// Pointer to one related record, stored as that record's id.
/// Loading the related record is left to the caller.
///

pub struct Ref<M> {
    id: Option<String>,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Ref<M> {
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self {
            id: Some(id),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self {
            id: None,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl<M: Model> Ref<M> {
    /// Point at a saved record; an unsaved record yields an empty ref.
    #[must_use]
    pub fn to(record: &M) -> Self {
        match record.id() {
            "" => Self::none(),
            id => Self::new(id.to_string()),
        }
    }
}

impl<M> Clone for Ref<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M> Default for Ref<M> {
    fn default() -> Self {
        Self::none()
    }
}

impl<M> PartialEq for Ref<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M> Eq for Ref<M> {}

impl<M> fmt::Debug for Ref<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.id).finish()
    }
}

impl<M> FieldValue for Ref<M> {
    fn shape() -> FieldShape {
        FieldShape::Record
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(self.id.clone().map_or(Value::Null, Value::Ref))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Ref(id) => Some(Self::new(id.clone())),
            Value::Null => Some(Self::none()),
            _ => None,
        }
    }
}

///
/// Refs
///
/// Ordered ids of many related records, stored as a JSON array.
///

pub struct Refs<M> {
    ids: Vec<String>,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Refs<M> {
    #[must_use]
    pub const fn new(ids: Vec<String>) -> Self {
        Self {
            ids,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn push(&mut self, id: impl Into<String>) {
        self.ids.push(id.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<M> Clone for Refs<M> {
    fn clone(&self) -> Self {
        Self::new(self.ids.clone())
    }
}

impl<M> Default for Refs<M> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<M> PartialEq for Refs<M> {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl<M> Eq for Refs<M> {}

impl<M> fmt::Debug for Refs<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Refs").field(&self.ids).finish()
    }
}

impl<M> FieldValue for Refs<M> {
    fn shape() -> FieldShape {
        FieldShape::Records
    }

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Refs(self.ids.clone()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Refs(ids) => Some(Self::new(ids.clone())),
            Value::Null => Some(Self::default()),
            _ => None,
        }
    }
}
