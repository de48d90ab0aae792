//! Derive macro for `vc_archive::Archive`.
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

// -----------------------------------------------------------------------------
// Modules

mod expand;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// Implements `Archive` for a struct by archiving its fields in
/// declaration order, with no framing between them.
///
/// Named, tuple and unit structs are supported. Each type parameter that
/// appears in a field type picks up an `Archive` bound on that field type.
///
/// Enums are rejected: their discriminant encoding is a choice the type's
/// author makes in a manual impl.
///
/// ```rust, ignore
/// #[derive(Archive)]
/// struct Span {
///     start: u32,
///     len: u32,
/// }
///
/// #[derive(Archive)]
/// struct Labeled<T>(T, String);
/// ```
#[proc_macro_derive(Archive)]
pub fn derive_archive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    expand::impl_archive(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
