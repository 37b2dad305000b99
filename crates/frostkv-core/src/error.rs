use crate::{
    config::ConfigError, db::executor::ExecutorError, db::registry::RegistryError,
    model::compile::SpecError, store::StoreError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable class + origin classification.
/// Every public operation returns this type; the typed cause is kept in
/// `detail` so callers can match on it without parsing messages.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl Error {
    /// Construct an error without a structured detail payload.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct an index-origin invariant violation.
    pub(crate) fn index_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Index,
            message.into(),
        )
    }

    /// Construct an index-origin unsupported error.
    pub(crate) fn index_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Index, message.into())
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self.detail,
            Some(ErrorDetail::Store(StoreError::KeyNotFound { .. }))
        )
    }

    #[must_use]
    pub const fn is_model_not_registered(&self) -> bool {
        matches!(&self.detail, Some(ErrorDetail::Registry(err)) if err.is_not_registered())
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self.class, ErrorClass::Transport)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }

    fn with_detail(class: ErrorClass, origin: ErrorOrigin, detail: ErrorDetail) -> Self {
        Self {
            class,
            origin,
            message: detail.to_string(),
            detail: Some(detail),
        }
    }
}

impl From<SpecError> for Error {
    fn from(err: SpecError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Model, ErrorDetail::Spec(err))
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Registry, ErrorDetail::Registry(err))
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Store, ErrorDetail::Store(err))
    }
}

impl From<ExecutorError> for Error {
    fn from(err: ExecutorError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Executor, ErrorDetail::Executor(err))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::with_detail(
            ErrorClass::Unsupported,
            ErrorOrigin::Config,
            ErrorDetail::Config(err),
        )
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`Error`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Spec(SpecError),

    #[error("{0}")]
    Registry(RegistryError),

    #[error("{0}")]
    Store(StoreError),

    #[error("{0}")]
    Executor(ExecutorError),

    #[error("{0}")]
    Config(ConfigError),
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Unsupported,
    Conflict,
    NotFound,
    Mismatch,
    Transport,
    Corruption,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unsupported => "unsupported",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Mismatch => "mismatch",
            Self::Transport => "transport",
            Self::Corruption => "corruption",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Model,
    Registry,
    Index,
    Store,
    Executor,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Model => "model",
            Self::Registry => "registry",
            Self::Index => "index",
            Self::Store => "store",
            Self::Executor => "executor",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_is_classified_and_detected() {
        let err: Error = StoreError::KeyNotFound {
            key: "person:abc".to_string(),
        }
        .into();

        assert_eq!(err.class, ErrorClass::NotFound);
        assert_eq!(err.origin, ErrorOrigin::Store);
        assert!(err.is_not_found());
        assert!(!err.is_transport());
        assert_eq!(
            err.display_with_class(),
            "store:not_found: key not found: person:abc"
        );
    }

    #[test]
    fn registry_not_registered_is_not_a_store_miss() {
        let err: Error = RegistryError::TypeNotRegistered {
            type_name: "Person",
        }
        .into();

        assert!(err.is_model_not_registered());
        assert!(!err.is_not_found());
        assert_eq!(err.class, ErrorClass::NotFound);
        assert_eq!(err.origin, ErrorOrigin::Registry);
    }
}
