//! Implementation of the `#[derive(Queryable)]` macro.
//!
//! Generates the static schema, the value accessor and field name constants
//! from `#[query(...)]` field annotations.

mod attrs;
mod derive;

pub use derive::queryable_derive_impl;
