//! Record traits.
//!
//! [`Queryable`] is the per-type field accessor registry the compilers use
//! in place of reflection: a static schema (name to [`FieldType`]) checked at
//! compile time, and a borrowed [`Value`] read at evaluation time. It is
//! normally generated with `#[derive(Queryable)]` from `rulematrix-macros`.
//!
//! The remaining traits describe the one-to-many attribute relationship the
//! relational processors traverse:
//!
//! ```text
//! PrimaryEntity ──links()──▶ LinkRecord ──attributes()──▶ AttributeRecord
//! AttributeEntity ──link()──▶ OwnedLink ──owner()──▶ Queryable owner
//! ```

use crate::value::Value;

/// Static type of a queryable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Number,
    Bool,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
        }
    }
}

/// One entry of a record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldSpec {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        FieldSpec { name, ty }
    }
}

/// Trait for record types a matrix can be compiled against.
///
/// # Derive Usage
///
/// ```ignore
/// use rulematrix::Queryable;
///
/// #[derive(Queryable)]
/// struct Employee {
///     #[query(Text, rename = "Department")]
///     department: String,
///     #[query(Number, rename = "Experience")]
///     experience: u32,
/// }
/// ```
///
/// # Manual Implementation
///
/// ```
/// use rulematrix::{FieldSpec, FieldType, Number, Queryable, Value};
///
/// struct Employee {
///     department: String,
///     experience: u32,
/// }
///
/// impl Queryable for Employee {
///     fn schema() -> &'static [FieldSpec] {
///         const SCHEMA: &[FieldSpec] = &[
///             FieldSpec::new("Department", FieldType::Text),
///             FieldSpec::new("Experience", FieldType::Number),
///         ];
///         SCHEMA
///     }
///
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "Department" => Value::Text(&self.department),
///             "Experience" => Value::Number(Number::from(self.experience)),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait Queryable {
    /// Every field that conditions may name.
    fn schema() -> &'static [FieldSpec]
    where
        Self: Sized;

    /// Returns the value of a field, or [`Value::None`] when the field is
    /// unknown or currently has no value.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Looks up the static type of a field.
    fn field_type(field: &str) -> Option<FieldType>
    where
        Self: Sized,
    {
        Self::schema()
            .iter()
            .find(|spec| spec.name == field)
            .map(|spec| spec.ty)
    }
}

/// A key/value attribute attached to a link record. Values are stored as
/// text.
pub trait AttributeRecord {
    fn key(&self) -> &str;
    fn value(&self) -> &str;
}

/// The join record connecting a primary entity to its attributes.
pub trait LinkRecord {
    type Attribute: AttributeRecord + 'static;

    fn attributes(&self) -> &[Self::Attribute];
}

/// An entity that owns link records, each owning attribute records.
pub trait PrimaryEntity: Queryable + Sized + 'static {
    type Link: LinkRecord + 'static;

    fn links(&self) -> &[Self::Link];
}

/// A link record that can navigate back to the entity owning it.
pub trait OwnedLink {
    type Owner: Queryable + Sized + 'static;

    fn owner(&self) -> Option<&Self::Owner>;
}

/// An attribute record that can navigate back to its link.
pub trait AttributeEntity: AttributeRecord + Queryable + Sized + 'static {
    type Link: OwnedLink + 'static;

    fn link(&self) -> Option<&Self::Link>;

    /// Navigates attribute to link to owning entity.
    fn owner(&self) -> Option<&<Self::Link as OwnedLink>::Owner> {
        self.link().and_then(OwnedLink::owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Number;

    struct TestItem {
        name: String,
        count: i32,
    }

    impl Queryable for TestItem {
        fn schema() -> &'static [FieldSpec] {
            const SCHEMA: &[FieldSpec] = &[
                FieldSpec::new("name", FieldType::Text),
                FieldSpec::new("count", FieldType::Number),
            ];
            SCHEMA
        }

        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "name" => Value::Text(&self.name),
                "count" => Value::Number(Number::from(self.count)),
                _ => Value::None,
            }
        }
    }

    #[test]
    fn queryable_manual_impl() {
        let item = TestItem {
            name: "test".to_string(),
            count: 42,
        };

        assert_eq!(item.field_value("name"), Value::Text("test"));
        assert_eq!(item.field_value("count"), Value::Number(Number::I64(42)));
        assert_eq!(item.field_value("unknown"), Value::None);
    }

    #[test]
    fn field_type_lookup() {
        assert_eq!(TestItem::field_type("name"), Some(FieldType::Text));
        assert_eq!(TestItem::field_type("count"), Some(FieldType::Number));
        assert_eq!(TestItem::field_type("missing"), None);
    }
}
