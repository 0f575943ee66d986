use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::quote;
use syn::{DataEnum, DataStruct, DeriveInput, Field, Fields, LitStr, Result, Type};

/// Names listed in `#[converter(ignored = "a, b")]`.
fn ignored_fields(ast: &DeriveInput) -> Result<Vec<String>> {
    let mut ignored = Vec::new();
    for attr in &ast.attrs {
        if attr.path().is_ident("converter") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ignored") {
                    let s: LitStr = meta.value()?.parse()?;
                    ignored.extend(
                        s.value()
                            .split(',')
                            .map(|field| field.trim().to_string())
                            .filter(|field| !field.is_empty()),
                    );
                    Ok(())
                } else {
                    Err(meta.error("Unknown converter attribute, expected `ignored`"))
                }
            })?;
        }
    }
    Ok(ignored)
}

pub(crate) fn generate_convertible_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let ignored = ignored_fields(ast)?;

    let fields: Vec<&Field> = match &data.fields {
        Fields::Named(fields) => fields.named.iter().collect(),
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "only structs with named fields are supported",
            ))
        }
    };

    for name in &ignored {
        if !fields
            .iter()
            .any(|f| f.ident.as_ref().is_some_and(|ident| ident == name))
        {
            return Err(syn::Error::new_spanned(
                ast,
                format!("ignored field {} not found in struct", name),
            ));
        }
    }

    let stored: Vec<&Ident> = fields
        .iter()
        .filter_map(|f| f.ident.as_ref())
        .filter(|ident| !ignored.contains(&ident.to_string()))
        .collect();
    let stored_names: Vec<String> = stored.iter().map(|i| i.to_string()).collect();

    let initializers: Vec<proc_macro2::TokenStream> = fields
        .iter()
        .filter_map(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)))
        .map(|(ident, ty): (&Ident, &Type)| {
            let name = ident.to_string();
            if ignored.contains(&name) {
                quote! { #ident: ::core::default::Default::default() }
            } else {
                quote! { #ident: docquery::common::from_value::<#ty>(&doc.get(#name)?)? }
            }
        })
        .collect();

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let gen = quote! {
        impl #impl_generics docquery::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docquery::errors::QueryResult<docquery::common::Value> {
                let mut doc = docquery::collection::Document::new();
                #(doc.put(#stored_names, docquery::common::Convertible::to_value(&self.#stored)?)?;)*
                Ok(docquery::common::Value::Document(doc))
            }

            fn from_value(value: &docquery::common::Value) -> docquery::errors::QueryResult<Self::Output> {
                match value {
                    docquery::common::Value::Document(doc) => Ok(#name {
                        #(#initializers,)*
                    }),
                    other => Err(docquery::errors::QueryError::new(
                        &format!("Expected a document for {} but found {}", stringify!(#name), other.type_name()),
                        docquery::errors::ErrorKind::ObjectMappingError,
                    )),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}

/// Unit-only enums map to the variant name as a string.
pub(crate) fn generate_convertible_for_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(ast, "enums without variants are not supported"));
    }

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "only enums with unit variants are supported",
            ));
        }
        variants.push(&variant.ident);
    }
    let variant_names: Vec<String> = variants.iter().map(|v| v.to_string()).collect();

    let gen = quote! {
        impl #impl_generics docquery::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docquery::errors::QueryResult<docquery::common::Value> {
                let variant = match self {
                    #(#name::#variants => #variant_names,)*
                };
                Ok(docquery::common::Value::from(variant))
            }

            fn from_value(value: &docquery::common::Value) -> docquery::errors::QueryResult<Self::Output> {
                match value.as_str() {
                    #(Some(#variant_names) => Ok(#name::#variants),)*
                    _ => Err(docquery::errors::QueryError::new(
                        &format!("{} is not a variant of {}", value, stringify!(#name)),
                        docquery::errors::ErrorKind::ObjectMappingError,
                    )),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}
