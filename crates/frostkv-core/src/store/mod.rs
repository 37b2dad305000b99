//! Store port.
//!
//! The backing store, its client and its connection pool live outside this
//! crate. `Store` and `Connection` are the boundary: a pool hands out one
//! connection per logical operation, released when the guard drops, and a
//! connection can read keys and submit a [`Batch`] atomically.

mod memory;

pub use memory::MemoryStore;

use crate::error::ErrorClass;
use std::error::Error as StdError;
use thiserror::Error as ThisError;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("store transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("connection pool exhausted: {max} connections in use")]
    PoolExhausted { max: usize },

    #[error("stored value is corrupt: {message}")]
    Corrupt { message: String },

    #[error("invalid key: {message}")]
    InvalidKey { message: String },
}

impl StoreError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::KeyNotFound { .. } => ErrorClass::NotFound,
            Self::Transport(_) | Self::PoolExhausted { .. } => ErrorClass::Transport,
            Self::Corrupt { .. } => ErrorClass::Corruption,
            Self::InvalidKey { .. } => ErrorClass::Unsupported,
        }
    }
}

///
/// TransportError
///
/// Failure reported by the store client. Carried verbatim, with the
/// client's own error as the source when there is one.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

///
/// Command
/// One write primitive inside an atomic batch.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    HDel {
        key: String,
        fields: Vec<String>,
    },
    Del {
        key: String,
    },
    SAdd {
        key: String,
        member: String,
    },
    SRem {
        key: String,
        member: String,
    },
    ZAdd {
        key: String,
        score: f64,
        member: String,
    },
    ZRem {
        key: String,
        member: String,
    },
}

impl Command {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::HSet { key, .. }
            | Self::HDel { key, .. }
            | Self::Del { key }
            | Self::SAdd { key, .. }
            | Self::SRem { key, .. }
            | Self::ZAdd { key, .. }
            | Self::ZRem { key, .. } => key,
        }
    }
}

///
/// Batch
///
/// Ordered commands submitted together. The store applies all of them or
/// none of them.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }
}

impl Extend<Command> for Batch {
    fn extend<T: IntoIterator<Item = Command>>(&mut self, iter: T) {
        self.commands.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

///
/// Connection
///
/// One pooled connection. Reads follow Redis semantics: missing keys read
/// as empty collections, never as errors.
///

pub trait Connection {
    /// All field/value pairs of a hash.
    fn hget_all(&mut self, key: &str) -> Result<Vec<(String, String)>, TransportError>;

    /// Values of the given hash fields, positionally.
    fn hmget(&mut self, key: &str, fields: &[&str])
    -> Result<Vec<Option<String>>, TransportError>;

    fn sismember(&mut self, key: &str, member: &str) -> Result<bool, TransportError>;

    fn smembers(&mut self, key: &str) -> Result<Vec<String>, TransportError>;

    fn scard(&mut self, key: &str) -> Result<u64, TransportError>;

    /// Members with `min <= score <= max`, ordered by score then member.
    fn zrange_by_score(
        &mut self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>, TransportError>;

    /// Apply every command of `batch` atomically.
    fn exec(&mut self, batch: &Batch) -> Result<(), TransportError>;
}

///
/// Store
///
/// Connection pool. The returned connection is released when dropped.
///

pub trait Store: Send + Sync {
    fn connection(&self) -> Result<Box<dyn Connection + '_>, StoreError>;
}
