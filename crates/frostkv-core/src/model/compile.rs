//! Spec compiler: declared fields + option strings → [`ModelSpec`].
//!
//! Option strings are comma-separated token lists:
//! - `-`       exclude the field from storage and indexing (must stand alone)
//! - `<name>`  external field name; only valid as the first token
//! - `index`   index the field, kind inferred from its scalar type
//!
//! Compilation has no side effects. Registering the result is a separate
//! step owned by the registry.

use crate::{
    error::{Error, ErrorClass},
    db::keys::{ALL_IDS_SUFFIX, KEY_SEPARATOR},
    model::{
        field::{FieldDecl, FieldModel, IndexKind},
        spec::ModelSpec,
    },
    traits::Model,
};
use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
};
use thiserror::Error as ThisError;

const EXCLUDE_TOKEN: &str = "-";
const INDEX_TOKEN: &str = "index";

///
/// SpecError
///

#[derive(Debug, ThisError)]
pub enum SpecError {
    #[error("invalid option '{token}' on field '{model}.{field}': {reason}")]
    InvalidOption {
        model: String,
        field: &'static str,
        token: String,
        reason: &'static str,
    },

    #[error("fields '{first}' and '{second}' of model '{model}' both store as '{name}'")]
    DuplicateName {
        model: String,
        name: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error("field '{field}' is declared twice on model '{model}'")]
    DuplicateField { model: String, field: &'static str },

    #[error("invalid model name '{name}': {reason}")]
    InvalidModelName { name: String, reason: &'static str },
}

impl SpecError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidOption { .. } | Self::InvalidModelName { .. } => ErrorClass::Unsupported,
            Self::DuplicateName { .. } | Self::DuplicateField { .. } => ErrorClass::Conflict,
        }
    }
}

///
/// FieldOptions
/// Parsed form of one option string.
///

#[derive(Debug, Default, Eq, PartialEq)]
struct FieldOptions {
    excluded: bool,
    redis_name: Option<&'static str>,
    index: bool,
}

/// Compile the spec for `M`, named `explicit_name` or `M::TYPE_NAME`.
pub fn compile<M: Model>(explicit_name: Option<&str>) -> Result<ModelSpec, Error> {
    let spec = compile_decls(
        TypeId::of::<M>(),
        M::TYPE_NAME,
        explicit_name.unwrap_or(M::TYPE_NAME),
        &M::fields(),
    )?;

    Ok(spec)
}

pub(crate) fn compile_decls(
    type_id: TypeId,
    type_name: &'static str,
    name: &str,
    decls: &[FieldDecl],
) -> Result<ModelSpec, SpecError> {
    validate_model_name(name)?;

    let mut fields = Vec::with_capacity(decls.len());
    let mut declared = HashSet::with_capacity(decls.len());
    let mut external: HashMap<&'static str, &'static str> = HashMap::with_capacity(decls.len());

    for decl in decls {
        if !declared.insert(decl.name) {
            return Err(SpecError::DuplicateField {
                model: name.to_string(),
                field: decl.name,
            });
        }

        let options = match decl.options {
            Some(raw) => parse_options(name, decl.name, raw)?,
            None => FieldOptions::default(),
        };
        if options.excluded {
            continue;
        }

        let index_kind = if options.index {
            let Some(ty) = decl.shape.scalar_type() else {
                return Err(SpecError::InvalidOption {
                    model: name.to_string(),
                    field: decl.name,
                    token: INDEX_TOKEN.to_string(),
                    reason: "only scalar fields can be indexed",
                });
            };
            IndexKind::for_scalar(ty)
        } else {
            IndexKind::None
        };

        let redis_name = options.redis_name.unwrap_or(decl.name);

        // `<model>:all` is the all-ids set; an index there would clobber it.
        if index_kind.is_indexed() && redis_name == ALL_IDS_SUFFIX {
            return Err(SpecError::InvalidOption {
                model: name.to_string(),
                field: decl.name,
                token: redis_name.to_string(),
                reason: "indexed fields cannot store as the reserved name 'all'",
            });
        }

        if let Some(first) = external.insert(redis_name, decl.name) {
            return Err(SpecError::DuplicateName {
                model: name.to_string(),
                name: redis_name,
                first,
                second: decl.name,
            });
        }

        fields.push(FieldModel {
            name: decl.name,
            redis_name,
            kind: decl.shape.kind(),
            index_kind,
            shape: decl.shape,
        });
    }

    Ok(ModelSpec::new(type_id, type_name, name.to_string(), fields))
}

fn validate_model_name(name: &str) -> Result<(), SpecError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains(KEY_SEPARATOR) {
        "name contains the key separator"
    } else if name.chars().any(char::is_whitespace) {
        "name contains whitespace"
    } else {
        return Ok(());
    };

    Err(SpecError::InvalidModelName {
        name: name.to_string(),
        reason,
    })
}

fn parse_options(
    model: &str,
    field: &'static str,
    raw: &'static str,
) -> Result<FieldOptions, SpecError> {
    let invalid = |token: &str, reason: &'static str| SpecError::InvalidOption {
        model: model.to_string(),
        field,
        token: token.to_string(),
        reason,
    };

    let tokens: Vec<&'static str> = raw.split(',').map(str::trim).collect();
    let mut options = FieldOptions::default();

    if tokens.contains(&EXCLUDE_TOKEN) {
        if tokens.len() > 1 {
            return Err(invalid(raw, "'-' cannot be combined with other options"));
        }
        options.excluded = true;

        return Ok(options);
    }

    for (pos, token) in tokens.into_iter().enumerate() {
        match token {
            INDEX_TOKEN if options.index => return Err(invalid(token, "duplicate 'index'")),
            INDEX_TOKEN => options.index = true,
            "" if pos == 0 => {}
            "" => return Err(invalid(token, "empty option")),
            name if pos == 0 => {
                if name.chars().any(char::is_whitespace) {
                    return Err(invalid(name, "field names cannot contain whitespace"));
                }
                options.redis_name = Some(name);
            }
            other => return Err(invalid(other, "unrecognized option")),
        }
    }

    Ok(options)
}

///
/// TESTS
///
