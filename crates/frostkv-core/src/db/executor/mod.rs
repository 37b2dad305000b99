//! Persistence orchestrator.
//!
//! Each executor drives one record operation through
//! `Validated → IdAssigned → BatchBuilt → Submitted → Committed | Failed`.
//! Reads and the single atomic batch of an operation share one pooled
//! connection, released when the operation returns.
//!
//! Concurrent writers to the same id race on the read-old-values → diff →
//! write step: the last submitted batch wins and index entries written by
//! the loser can go stale. `Config::record_locks` closes the gap for
//! writers inside one process only.

mod context;
mod delete;
mod load;
mod lookup;
mod save;

pub(crate) use context::Context;
pub(crate) use delete::DeleteExecutor;
pub(crate) use load::LoadExecutor;
pub(crate) use lookup::LookupExecutor;
pub(crate) use save::SaveExecutor;

use crate::{error::ErrorClass, model::field::IndexKind, value::ValueError};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// ExecutorError
///

#[derive(Debug, ThisError)]
pub enum ExecutorError {
    #[error("model '{model}' describes type '{expected}', not '{found}'")]
    TypeMismatch {
        model: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("id '{id}' appears more than once in one {model} batch")]
    DuplicateKey { model: String, id: String },

    #[error("field '{field}' of model '{model}' is not indexed")]
    FieldNotIndexed { model: String, field: String },

    #[error("{lookup} lookup on {kind} index '{model}.{field}'")]
    IndexKindMismatch {
        model: String,
        field: String,
        kind: IndexKind,
        lookup: &'static str,
    },

    #[error("batch of {commands} commands exceeds the limit of {max}")]
    BatchTooLarge { commands: usize, max: usize },

    #[error("field '{model}.{field}' rejected stored {value} value")]
    FieldRejected {
        model: String,
        field: &'static str,
        value: &'static str,
    },

    #[error("record type does not expose declared field '{model}.{field}'")]
    MissingField { model: String, field: &'static str },

    #[error("field '{model}.{field}' cannot be stored: {source}")]
    FieldUnencodable {
        model: String,
        field: &'static str,
        #[source]
        source: ValueError,
    },
}

impl ExecutorError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::TypeMismatch { .. } => ErrorClass::Mismatch,
            Self::DuplicateKey { .. } => ErrorClass::Conflict,
            Self::FieldNotIndexed { .. }
            | Self::IndexKindMismatch { .. }
            | Self::BatchTooLarge { .. }
            | Self::FieldUnencodable { .. } => ErrorClass::Unsupported,
            Self::FieldRejected { .. } => ErrorClass::Corruption,
            Self::MissingField { .. } => ErrorClass::InvariantViolation,
        }
    }
}

///
/// OpState
/// Per-record operation state, reported through `tracing`.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub(crate) enum OpState {
    Validated,
    IdAssigned,
    BatchBuilt,
    Submitted,
    Committed,
    Failed,
}
