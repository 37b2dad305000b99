use proc_macro::TokenStream;

mod model;

/// Derive `frostkv::traits::Model` for a struct with named fields.
///
/// Exactly one field must have type `DefaultData`; it carries the id and is
/// not stored as a field. Every other field is declared in order, with its
/// option string taken from `#[frost("...")]`.
#[proc_macro_derive(Model, attributes(frost))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input.into()).into()
}
