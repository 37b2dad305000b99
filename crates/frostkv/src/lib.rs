//! ## Crate layout
//! - `config`: TOML-backed runtime settings for a `Db`.
//! - `db`: the `Db` handle, registry, key namer, index planner and executors.
//! - `model`: compiled model specs and field metadata.
//! - `obs`: metrics events, sinks and the global counters report.
//! - `store`: the store port plus the in-memory reference store.
//! - `traits`, `types`, `value`: the record-facing vocabulary.
//!
//! `#[derive(Model)]` lives here too; its generated code refers to
//! `::frostkv::…` paths, so depend on this crate rather than the core one.

pub use frostkv_core::{config, db, error, model, obs, store, traits, types, value};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Macros
//

pub use frostkv_core::{db::Db, error::Error};
pub use frostkv_derive::Model;

///
/// Prelude
/// The `Model` trait and derive share a name, as serde's do.
///

pub mod prelude {
    pub use frostkv_derive::Model;
    pub use frostkv_core::{
        config::Config,
        db::Db,
        error::{Error, ErrorClass},
        store::{MemoryStore, Store},
        traits::{FieldValue, Model},
        types::{DefaultData, Embedded, Ref, Refs},
        value::Value,
    };
}
