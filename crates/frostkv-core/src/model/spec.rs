use crate::{model::field::FieldModel, traits::Model};
use std::{any::TypeId, collections::HashMap};

///
/// ModelSpec
///
/// Compiled, immutable description of one record type: its external model
/// name and the ordered list of stored fields. Built once by
/// [`compile`](crate::model::compile) and shared behind an `Arc` by the
/// registry.
///

#[derive(Debug)]
pub struct ModelSpec {
    type_id: TypeId,
    type_name: &'static str,
    name: String,
    fields: Vec<FieldModel>,
    by_name: HashMap<&'static str, usize>,
}

impl ModelSpec {
    pub(crate) fn new(
        type_id: TypeId,
        type_name: &'static str,
        name: String,
        fields: Vec<FieldModel>,
    ) -> Self {
        let by_name = fields
            .iter()
            .enumerate()
            .map(|(pos, field)| (field.name, pos))
            .collect();

        Self {
            type_id,
            type_name,
            name,
            fields,
            by_name,
        }
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the described record.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Logical model name used as the key prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored fields in declaration order. Excluded fields are absent.
    #[must_use]
    pub fn fields(&self) -> &[FieldModel] {
        &self.fields
    }

    /// Look up a stored field by its declared name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.by_name.get(name).map(|pos| &self.fields[*pos])
    }

    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields.iter().filter(|field| field.is_indexed())
    }

    #[must_use]
    pub fn has_indexes(&self) -> bool {
        self.indexed_fields().next().is_some()
    }

    /// Whether this spec was compiled from `M`.
    #[must_use]
    pub fn is_for<M: Model>(&self) -> bool {
        self.type_id == TypeId::of::<M>()
    }
}
