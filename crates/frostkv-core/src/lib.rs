//! Core runtime for frostkv: values, model specs, the registry, the index
//! engine, the store port and the executors behind `Db`.
#![warn(unreachable_pub)]

extern crate self as frostkv;

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod store;
pub mod traits;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Domain vocabulary only: the handle, the record traits and the field
/// types a model is built from.
///

pub mod prelude {
    pub use crate::{
        db::Db,
        error::Error,
        store::{MemoryStore, Store},
        traits::{FieldValue, Model},
        types::{DefaultData, Embedded, Ref, Refs},
        value::Value,
    };
}
