//! Implementation of the Queryable derive macro.
//!
//! This macro generates an implementation of the `Queryable` trait and
//! field name constants for building conditions without string typos.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument, Ident, PathArguments,
    Result, Type,
};

use super::attrs::{parse_query_attrs, QueryType};

/// Main implementation of the Queryable derive macro.
pub fn queryable_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Queryable can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Queryable can only be derived for structs",
            ))
        }
    };

    let mut schema_entries: Vec<TokenStream> = Vec::new();
    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut seen = HashSet::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let query_attrs = parse_query_attrs(&field.attrs)?;
        if query_attrs.skip {
            continue;
        }
        let query_type = match query_attrs.query_type {
            Some(t) => t,
            None => continue,
        };

        let query_name = query_attrs
            .rename
            .unwrap_or_else(|| field_name.to_string());
        if !seen.insert(query_name.clone()) {
            return Err(Error::new(
                query_attrs.span,
                format!("duplicate query field name '{}'", query_name),
            ));
        }

        let const_text = to_screaming_snake_case(&query_name);
        let const_name: Ident = syn::parse_str(&const_text).map_err(|_| {
            Error::new(
                query_attrs.span,
                format!(
                    "query field name '{}' does not give a valid constant name ('{}')",
                    query_name, const_text
                ),
            )
        })?;
        field_constants.push(quote! {
            /// Field name for building conditions.
            pub const #const_name: &'static str = #query_name;
        });

        let variant = format_ident!("{}", query_type.variant());
        schema_entries.push(quote! {
            ::rulematrix::FieldSpec::new(#query_name, ::rulematrix::FieldType::#variant)
        });

        let value_expr = if is_option(&field.ty) {
            let inner = value_of(query_type, quote! { *value }, quote! { value });
            quote! {
                match &self.#field_name {
                    ::core::option::Option::Some(value) => #inner,
                    ::core::option::Option::None => ::rulematrix::Value::None,
                }
            }
        } else {
            value_of(
                query_type,
                quote! { self.#field_name },
                quote! { &self.#field_name },
            )
        };

        field_matches.push(quote! {
            #query_name => #value_expr,
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::rulematrix::Queryable for #struct_name #ty_generics #where_clause {
            fn schema() -> &'static [::rulematrix::FieldSpec] {
                const SCHEMA: &[::rulematrix::FieldSpec] = &[
                    #(#schema_entries),*
                ];
                SCHEMA
            }

            fn field_value(&self, field: &str) -> ::rulematrix::Value<'_> {
                match field {
                    #(#field_matches)*
                    _ => ::rulematrix::Value::None,
                }
            }
        }
    };

    Ok(expanded)
}

/// Builds the value expression for one field. `copied` reads the field by
/// value (numbers, bools), `borrowed` by reference (text).
fn value_of(query_type: QueryType, copied: TokenStream, borrowed: TokenStream) -> TokenStream {
    match query_type {
        QueryType::Text => quote! {
            ::rulematrix::Value::Text(::core::convert::AsRef::<str>::as_ref(#borrowed))
        },
        QueryType::Number => quote! {
            ::rulematrix::Value::Number(::rulematrix::Number::from(#copied))
        },
        QueryType::Bool => quote! {
            ::rulematrix::Value::Bool(#copied)
        },
    }
}

/// Returns `true` for `Option<T>` (however the path is spelled).
fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.qself.is_none()
        && path.path.segments.last().is_some_and(|segment| {
            segment.ident == "Option"
                && matches!(
                    &segment.arguments,
                    PathArguments::AngleBracketed(args)
                        if matches!(args.args.first(), Some(GenericArgument::Type(_)))
                )
        })
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == '.' || c == ' ' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_alphanumeric();
        }
    }

    result
}
