use proc_macro::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput, Fields, LitStr, Result};

struct IndexAttr {
    unique: bool,
    fields: Vec<String>,
}

fn split_fields(s: &LitStr) -> Vec<String> {
    s.value()
        .split(',')
        .map(|field| field.trim().to_string())
        .filter(|field| !field.is_empty())
        .collect()
}

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let named = match &data.fields {
        Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "only structs with named fields are supported",
            ))
        }
    };

    let mut entity_name: Option<String> = None;
    let mut key: Option<String> = None;
    let mut indexes: Vec<IndexAttr> = Vec::new();

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    if s.value().trim().is_empty() || s.value().contains('+') {
                        return Err(meta.error("entity name must be non-empty and must not contain '+'"));
                    }
                    entity_name = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("key") {
                    if key.is_some() {
                        return Err(meta.error("Multiple key attributes are not allowed"));
                    }
                    let s: LitStr = meta.value()?.parse()?;
                    key = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("index") {
                    let mut unique: Option<bool> = None;
                    let mut fields: Vec<String> = Vec::new();

                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("type") {
                            let s: LitStr = inner.value()?.parse()?;
                            unique = match s.value().as_str() {
                                "unique" => Some(true),
                                "non-unique" => Some(false),
                                other => {
                                    return Err(inner.error(format!(
                                        "unknown index type {}, expected unique or non-unique",
                                        other
                                    )))
                                }
                            };
                            Ok(())
                        } else if inner.path.is_ident("fields") {
                            let s: LitStr = inner.value()?.parse()?;
                            fields = split_fields(&s);
                            Ok(())
                        } else {
                            Err(inner.error("Unknown index attribute"))
                        }
                    })?;

                    match unique {
                        Some(unique) if !fields.is_empty() => {
                            indexes.push(IndexAttr { unique, fields });
                            Ok(())
                        }
                        _ => Err(meta.error("Index type and fields are required")),
                    }
                } else {
                    Err(meta.error("Unknown entity attribute"))
                }
            })?;
        }
    }

    let has_field = |field_name: &str| {
        named
            .iter()
            .any(|f| f.ident.as_ref().is_some_and(|ident| ident == field_name))
    };

    // without an explicit key, a field named `id` is the key
    let key = match key {
        Some(key) => key,
        None if has_field("id") => "id".to_string(),
        None => {
            return Err(syn::Error::new_spanned(
                ast,
                "no key field; add #[entity(key = \"field\")]",
            ))
        }
    };

    let key_field = named
        .iter()
        .find(|f| f.ident.as_ref().is_some_and(|ident| *ident == key))
        .ok_or_else(|| syn::Error::new_spanned(ast, format!("Field {} not found in struct", key)))?;
    let key_ident = &key_field.ident;
    let key_type = &key_field.ty;

    for index in &indexes {
        for field in &index.fields {
            // nested paths are checked on their first segment only
            let root = field.split('.').next().unwrap_or(field);
            if !has_field(root) {
                return Err(syn::Error::new_spanned(
                    ast,
                    format!("Index field {} not found in struct", field),
                ));
            }
        }
    }

    let entity_name_code = entity_name.map(|entity_name| {
        quote! {
            fn entity_name() -> String {
                #entity_name.to_string()
            }
        }
    });

    let entity_indexes_code = if indexes.is_empty() {
        None
    } else {
        let indexes_code = indexes.iter().map(|index| {
            let fields = &index.fields;
            let index_type = if index.unique {
                quote!(docquery::collection::IndexType::Unique)
            } else {
                quote!(docquery::collection::IndexType::NonUnique)
            };
            quote! {
                docquery::repository::EntityIndex::new(vec![#(#fields),*], #index_type)
            }
        });
        Some(quote! {
            fn entity_indexes() -> Vec<docquery::repository::EntityIndex> {
                vec![#(#indexes_code),*]
            }
        })
    };

    let gen = quote! {
        impl #impl_generics docquery::repository::Entity for #name #ty_generics #where_clause {
            type Key = #key_type;

            #entity_name_code

            fn key_field() -> String {
                #key.to_string()
            }

            fn key(&self) -> Self::Key {
                ::core::clone::Clone::clone(&self.#key_ident)
            }

            #entity_indexes_code
        }
    };

    Ok(TokenStream::from(gen))
}
