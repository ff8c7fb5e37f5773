//! Rulematrix - composable filter rules over Rust record collections.
//!
//! A rule is a [`Matrix`]: a tree of conditions (`field operator value`)
//! combined under `_and`, `_or` or `_not`. Matrices are built with
//! [`MatrixBuilder`], stored as compact text with the [`Codec`], and compiled
//! by a [`Processor`] into a reusable [`Predicate`]. Field names are checked
//! against the record's [`Queryable`] schema when the matrix is compiled, not
//! when it is evaluated.
//!
//! # Quick Start
//!
//! ```rust
//! use rulematrix::{
//!     parse, serialize, FieldSpec, FieldType, FlatProcessor, MatrixBuilder, Number, Operator,
//!     Processor, Queryable, Value,
//! };
//!
//! struct Employee {
//!     department: String,
//!     title: String,
//!     experience: u32,
//! }
//!
//! impl Queryable for Employee {
//!     fn schema() -> &'static [FieldSpec] {
//!         const SCHEMA: &[FieldSpec] = &[
//!             FieldSpec::new("Department", FieldType::Text),
//!             FieldSpec::new("Title", FieldType::Text),
//!             FieldSpec::new("Experience", FieldType::Number),
//!         ];
//!         SCHEMA
//!     }
//!
//!     fn field_value(&self, field: &str) -> Value<'_> {
//!         match field {
//!             "Department" => Value::Text(&self.department),
//!             "Title" => Value::Text(&self.title),
//!             "Experience" => Value::Number(Number::from(self.experience)),
//!             _ => Value::None,
//!         }
//!     }
//! }
//!
//! let matrix = MatrixBuilder::new()
//!     .add_condition("Department", Operator::Eq, "Sales")?
//!     .add_nested_conditions(|b| {
//!         b.with_logical_operator(Operator::Or)?
//!             .add_condition("Experience", Operator::Gt, 5)?
//!             .add_condition("Title", Operator::Eq, "Manager")
//!     })?
//!     .build();
//!
//! let stored = serialize(&matrix);
//! assert_eq!(
//!     stored,
//!     "[_and][Department_eq_Sales][_or][Experience_gt_5][Title_eq_Manager]"
//! );
//! assert_eq!(parse(&stored)?, matrix);
//!
//! let staff = vec![
//!     Employee { department: "Sales".into(), title: "Manager".into(), experience: 2 },
//!     Employee { department: "Sales".into(), title: "Associate".into(), experience: 1 },
//! ];
//! let hits = FlatProcessor.filter(&staff, &matrix)?;
//! assert_eq!(hits.len(), 1);
//! # Ok::<(), rulematrix::QueryError>(())
//! ```
//!
//! # Operators
//!
//! | Token | Kind | Meaning |
//! |-------|------|---------|
//! | `_eq` `_neq` | comparison | equality |
//! | `_gt` `_lt` `_gte` `_lte` | comparison | ordering, number fields only |
//! | `_in` `_nin` | comparison | membership in a list |
//! | `_like` `_ilike` | text | substring, `_ilike` ignores case |
//! | `_and` `_or` `_not` | logical | combine expressions |
//!
//! `_and` and `_or` over nothing always match. `_not` takes exactly one
//! expression. A record whose field has no value never matches a condition
//! on that field.
//!
//! # Relationships
//!
//! [`EntityProcessor`] and [`AttributeProcessor`] compile matrices across a
//! one-to-many attribute relationship (see [`PrimaryEntity`] and
//! [`AttributeEntity`]), routing fields by prefix: `metadata.<key>` tests
//! linked attributes, `employee.<field>` tests the owning entity. Prefixes
//! are set in [`RelationConventions`].
//!
//! # Derive Macro
//!
//! With the `derive` feature, `#[derive(Queryable)]` generates the schema
//! and accessor:
//!
//! ```ignore
//! use rulematrix::Queryable;
//!
//! #[derive(Queryable)]
//! struct Employee {
//!     #[query(Text, rename = "Department")]
//!     department: String,
//!     #[query(Number, rename = "Experience")]
//!     experience: u32,
//!     #[query(skip)]
//!     internal_id: u64,
//! }
//! ```

mod builder;
mod codec;
mod config;
mod engine;
mod error;
mod expr;
mod flat;
mod model;
mod op;
mod predicate;
mod processor;
mod relational;
mod traits;
mod value;

pub use builder::MatrixBuilder;
pub use codec::{parse, serialize, Codec};
pub use config::{CodecOptions, EngineConfig, RelationConventions};
pub use engine::Engine;
pub use error::{QueryError, Result};
pub use expr::{combine, compare_values, comparison, FieldHandle, Node};
pub use flat::FlatProcessor;
pub use model::{Condition, ConditionValue, Matrix};
pub use op::{Operator, OperatorKind};
pub use predicate::Predicate;
pub use processor::Processor;
pub use relational::{AttributeProcessor, EntityProcessor};
pub use traits::{
    AttributeEntity, AttributeRecord, FieldSpec, FieldType, LinkRecord, OwnedLink,
    PrimaryEntity, Queryable,
};
pub use value::{Literal, Number, Scalar, Value};

#[cfg(feature = "derive")]
pub use rulematrix_macros::Queryable;
