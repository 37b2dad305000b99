//! Runtime model definitions.
//!
//! `field` holds the per-field type descriptors, `spec` the compiled,
//! immutable description of one record type, and `compile` the step that
//! turns a type's declared fields and option strings into a spec.
//!
//! In general:
//! - `#[derive(Model)]` declares *what exists*
//! - `model` defines *what runs*
pub mod compile;
pub mod field;
pub mod spec;

pub use compile::compile;
pub use spec::ModelSpec;
