//! Proc macros for rulematrix.
//!
//! # Available Macros
//!
//! - [`Queryable`] - Generate the field accessor registry (schema plus
//!   value accessor) that rulematrix processors compile against
//!
//! Enable the `derive` feature of `rulematrix` to use it as
//! `rulematrix::Queryable`.

mod queryable;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Queryable` trait for structs with named fields.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `Text` | Text field (`String`, `&str`, anything `AsRef<str>`) |
/// | `Number` | Numeric field (any primitive integer or float) |
/// | `Bool` | Boolean field |
/// | `skip` | Exclude this field from queries |
/// | `rename = "..."` | Use a custom name in conditions |
///
/// Fields without a `#[query(...)]` type are not queryable. `Option<T>`
/// fields read as missing when `None`, and a missing value never matches.
///
/// # Generated Code
///
/// 1. A `&'static str` constant per field (e.g., `Employee::DEPARTMENT`)
/// 2. `Queryable::schema()` listing every queryable field and its type
/// 3. `Queryable::field_value()` matching on the field name
///
/// # Example
///
/// ```ignore
/// use rulematrix::{FlatProcessor, MatrixBuilder, Operator, Processor, Queryable};
///
/// #[derive(Queryable)]
/// struct Employee {
///     #[query(Text, rename = "Department")]
///     department: String,
///
///     #[query(Number, rename = "Experience")]
///     experience: u32,
///
///     #[query(Text)]
///     nickname: Option<String>,
///
///     #[query(skip)]
///     internal_id: u64,
/// }
///
/// let matrix = MatrixBuilder::new()
///     .add_condition(Employee::DEPARTMENT, Operator::Eq, "Sales")?
///     .add_condition(Employee::EXPERIENCE, Operator::Gte, 3)?
///     .build();
///
/// let hits = FlatProcessor.filter(&staff, &matrix)?;
/// ```
#[proc_macro_derive(Queryable, attributes(query))]
pub fn queryable_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    queryable::queryable_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
