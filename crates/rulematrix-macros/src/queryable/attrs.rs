//! Parsing of `#[query(...)]` field attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Ident, Lit, Meta, Result, Token,
};

/// The static type of a queryable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Text,
    Number,
    Bool,
}

impl QueryType {
    pub fn from_ident(ident: &Ident) -> Result<Self> {
        match ident.to_string().as_str() {
            "Text" | "text" | "String" | "string" => Ok(QueryType::Text),
            "Number" | "number" => Ok(QueryType::Number),
            "Bool" | "bool" | "boolean" => Ok(QueryType::Bool),
            other => Err(Error::new(
                ident.span(),
                format!(
                    "unknown query type: '{}'. Expected one of: Text, Number, Bool",
                    other
                ),
            )),
        }
    }

    /// Name of the matching `rulematrix::FieldType` variant.
    pub fn variant(self) -> &'static str {
        match self {
            QueryType::Text => "Text",
            QueryType::Number => "Number",
            QueryType::Bool => "Bool",
        }
    }
}

/// Field-level attributes from `#[query(...)]`.
#[derive(Debug, Clone)]
pub struct QueryAttr {
    pub query_type: Option<QueryType>,
    pub skip: bool,
    /// Name used in conditions (default: the Rust field name).
    pub rename: Option<String>,
    pub span: Span,
}

impl Default for QueryAttr {
    fn default() -> Self {
        QueryAttr {
            query_type: None,
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for QueryAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = QueryAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        if attr.query_type.is_some() {
                            return Err(Error::new(ident.span(), "query type given twice"));
                        }
                        attr.query_type = Some(QueryType::from_ident(ident)?);
                        attr.span = ident.span();
                    } else {
                        return Err(Error::new(
                            p.span(),
                            "expected query type: Text, Number, Bool, or skip",
                        ));
                    }
                }

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    match &nv.value {
                        syn::Expr::Lit(syn::ExprLit {
                            lit: Lit::Str(s), ..
                        }) if !s.value().trim().is_empty() => {
                            attr.rename = Some(s.value());
                        }
                        _ => {
                            return Err(Error::new(
                                nv.value.span(),
                                "rename must be a non-empty string literal",
                            ))
                        }
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown query attribute. Expected: Text, Number, Bool, skip, or rename = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extracts the `#[query(...)]` attribute of a field, if any.
pub fn parse_query_attrs(attrs: &[Attribute]) -> Result<QueryAttr> {
    for attr in attrs {
        if attr.path().is_ident("query") {
            return attr.parse_args::<QueryAttr>();
        }
    }
    Ok(QueryAttr::default())
}
