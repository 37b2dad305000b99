//! Secondary-index maintenance.
//!
//! Pure planning: given a spec and the old/new indexed values of one
//! record, emit the sorted-set operations that bring every index in line
//! with the new values. Nothing here talks to the store.

mod score;

pub use score::{RANK_BYTES, prefix_rank_bounds, score, text_rank};

use crate::{
    db::keys::{all_ids_key, index_key, primary_key},
    error::Error,
    model::ModelSpec,
    store::Command,
    value::Value,
};
use std::collections::BTreeMap;

/// Indexed field values of one record, keyed by declared field name.
/// A missing entry reads as `Value::Null`.
pub type IndexedValues = BTreeMap<&'static str, Value>;

///
/// IndexOp
///

#[derive(Clone, Debug, PartialEq)]
pub enum IndexOp {
    Add { key: String, id: String, score: f64 },
    Remove { key: String, id: String },
}

impl IndexOp {
    #[must_use]
    pub const fn is_add(&self) -> bool {
        matches!(self, Self::Add { .. })
    }
}

impl From<IndexOp> for Command {
    fn from(op: IndexOp) -> Self {
        match op {
            IndexOp::Add { key, id, score } => Self::ZAdd {
                key,
                score,
                member: id,
            },
            IndexOp::Remove { key, id } => Self::ZRem { key, member: id },
        }
    }
}

fn value_of<'a>(values: &'a IndexedValues, field: &str) -> &'a Value {
    values.get(field).unwrap_or(&Value::Null)
}

/// Plan index updates for a save.
///
/// `old` is `None` on first save. A changed field is always a remove
/// followed by an add, never an in-place score update.
pub fn plan_save(
    spec: &ModelSpec,
    id: &str,
    old: Option<&IndexedValues>,
    new: &IndexedValues,
) -> Result<Vec<IndexOp>, Error> {
    let mut ops = Vec::new();

    for field in spec.indexed_fields() {
        let new_value = value_of(new, field.name);
        let old_value = old.map(|values| value_of(values, field.name));
        if old_value == Some(new_value) {
            continue;
        }

        let key = index_key(spec.name(), field.redis_name, field.index_kind);
        let new_score = score(field.index_kind, new_value)?;

        if let Some(old_value) = old_value
            && !old_value.is_null()
        {
            ops.push(IndexOp::Remove {
                key: key.clone(),
                id: id.to_string(),
            });
        }
        if let Some(score) = new_score {
            ops.push(IndexOp::Add {
                key,
                id: id.to_string(),
                score,
            });
        }
    }

    Ok(ops)
}

/// Plan the full removal of one record: its entry in every index, its
/// all-ids membership and its primary hash.
#[must_use]
pub fn plan_delete(spec: &ModelSpec, id: &str) -> Vec<Command> {
    let mut commands: Vec<Command> = spec
        .indexed_fields()
        .map(|field| {
            IndexOp::Remove {
                key: index_key(spec.name(), field.redis_name, field.index_kind),
                id: id.to_string(),
            }
            .into()
        })
        .collect();

    commands.push(Command::SRem {
        key: all_ids_key(spec.name()),
        member: id.to_string(),
    });
    commands.push(Command::Del {
        key: primary_key(spec.name(), id),
    });

    commands
}

///
/// TESTS
///
