#![recursion_limit = "128"]
//! # docquery derive macros
//!
//! ### `Convertible`
//!
//! Maps a struct with named fields to a document and back. Every field type
//! must itself implement `Convertible`. Fields listed in
//! `#[converter(ignored = "a, b")]` are not stored and come back as
//! `Default::default()`. Enums with unit variants only are stored as the
//! variant name.
//!
//! ```rust,ignore
//! use docquery_derive::Convertible;
//!
//! #[derive(Convertible)]
//! #[converter(ignored = "cache")]
//! pub struct User {
//!     pub name: String,
//!     pub age: u32,
//!     pub cache: Vec<String>,
//! }
//! ```
//!
//! ### `Entity`
//!
//! Implements `docquery::repository::Entity` so the type works with
//! `DefaultQuery`. The key field defaults to `id`.
//!
//! ```rust,ignore
//! use docquery_derive::{Convertible, Entity};
//!
//! #[derive(Convertible, Entity)]
//! #[entity(name = "products", key = "sku", index(type = "non-unique", fields = "category"))]
//! pub struct Product {
//!     pub sku: String,
//!     pub category: String,
//!     pub price: f64,
//! }
//! ```

extern crate proc_macro;
mod convertible;
mod entity;

use crate::convertible::{generate_convertible_for_enum, generate_convertible_for_struct};
use crate::entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives `docquery::common::Convertible`.
///
/// # Errors
///
/// Compile error for tuple structs, unit structs, unions, enums with data
/// and unknown `ignored` fields.
#[proc_macro_derive(Convertible, attributes(converter))]
pub fn derive_convert(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_convertible_for_struct(&ast, data),
        Data::Enum(ref data) => generate_convertible_for_enum(&ast, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Convertible for unions",
        )),
    };

    result.unwrap_or_else(|e| {
        syn::Error::new(
            e.span(),
            format!("Failed to derive Convertible for '{}': {}", ast.ident, e),
        )
        .to_compile_error()
        .into()
    })
}

/// Derives `docquery::repository::Entity`.
///
/// # Attributes
///
/// - `#[entity(name = "...")]` collection name, defaults to the type name
/// - `#[entity(key = "field")]` key field, defaults to `id`
/// - `#[entity(index(type = "unique" | "non-unique", fields = "a, b"))]` repeatable
///
/// # Errors
///
/// Compile error for enums, unions, tuple structs, a key naming a field that
/// does not exist, and an index over unknown fields.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_entity_for_struct(&ast, data),
        Data::Enum(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for enums. Only structs are supported.",
        )),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for unions. Only structs are supported.",
        )),
    };

    result.unwrap_or_else(|e| {
        syn::Error::new(
            e.span(),
            format!("Failed to derive Entity for '{}': {}", ast.ident, e),
        )
        .to_compile_error()
        .into()
    })
}
