//! Key namer.
//!
//! These names are the on-store contract. Records written by any earlier
//! build must stay addressable, so the formats below never change:
//!
//! ```text
//! <model>:<id>       primary hash
//! <model>:all        all-ids set
//! <model>:<field>    secondary index (sorted set)
//! ```

use crate::{
    error::Error,
    model::{ModelSpec, field::IndexKind},
    store::StoreError,
};

pub const KEY_SEPARATOR: char = ':';
pub const ALL_IDS_SUFFIX: &str = "all";

/// Key of the primary hash of one record.
#[must_use]
pub fn primary_key(model: &str, id: &str) -> String {
    format!("{model}{KEY_SEPARATOR}{id}")
}

/// Key of the set holding every id of a model.
#[must_use]
pub fn all_ids_key(model: &str) -> String {
    format!("{model}{KEY_SEPARATOR}{ALL_IDS_SUFFIX}")
}

/// Key of the secondary index for one field.
#[must_use]
pub fn index_key(model: &str, redis_field: &str, kind: IndexKind) -> String {
    match kind.key_suffix() {
        Some(suffix) => format!("{model}{KEY_SEPARATOR}{redis_field}{KEY_SEPARATOR}{suffix}"),
        None => format!("{model}{KEY_SEPARATOR}{redis_field}"),
    }
}

/// Primary key of a record of `spec`.
///
/// Refuses an empty id, and any id whose key would land on the all-ids set
/// or on one of the model's indexes.
pub(crate) fn checked_primary_key(spec: &ModelSpec, id: &str) -> Result<String, Error> {
    let model = spec.name();
    if id.is_empty() {
        return Err(StoreError::InvalidKey {
            message: format!("empty id for model '{model}'"),
        }
        .into());
    }

    let key = primary_key(model, id);
    let reserved = key == all_ids_key(model)
        || spec
            .indexed_fields()
            .any(|field| index_key(model, field.redis_name, field.index_kind) == key);
    if reserved {
        return Err(StoreError::InvalidKey {
            message: format!("id '{id}' collides with a reserved key of model '{model}'"),
        }
        .into());
    }

    Ok(key)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        compile::compile_decls,
        field::{FieldDecl, FieldShape, ScalarType},
    };
    use std::any::TypeId;

    struct Marker;

    fn person_spec() -> ModelSpec {
        compile_decls(
            TypeId::of::<Marker>(),
            "Marker",
            "person",
            &[
                FieldDecl::new("age", Some("index"), FieldShape::scalar(ScalarType::Uint)),
                FieldDecl::new("name", Some("n, index"), FieldShape::scalar(ScalarType::Text)),
                FieldDecl::new("bio", None, FieldShape::scalar(ScalarType::Text)),
            ],
        )
        .expect("person spec should compile")
    }

    #[test]
    fn key_formats_are_stable() {
        assert_eq!(primary_key("person", "01HX"), "person:01HX");
        assert_eq!(all_ids_key("person"), "person:all");
        assert_eq!(index_key("person", "age", IndexKind::Numeric), "person:age");
        assert_eq!(
            index_key("person", "name", IndexKind::Alphabetical),
            "person:name"
        );
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = checked_primary_key(&person_spec(), "").expect_err("empty id should fail");

        assert!(err.message.contains("empty id"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn ids_shadowing_model_keys_are_rejected() {
        let spec = person_spec();

        for id in ["all", "age", "n"] {
            let err = checked_primary_key(&spec, id).expect_err("reserved id should fail");
            assert!(err.message.contains("reserved key"), "{id}: {}", err.message);
            assert!(!err.is_transport());
        }

        // unindexed and pre-rename names create no key of their own
        for id in ["bio", "name", "ALL", "01HX"] {
            assert_eq!(
                checked_primary_key(&spec, id).expect("plain id"),
                format!("person:{id}")
            );
        }
    }
}
