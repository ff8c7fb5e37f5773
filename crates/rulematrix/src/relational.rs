//! Compiling matrices across the entity/link/attribute relationship.
//!
//! Two roots are supported:
//!
//! - [`EntityProcessor`] filters primary entities. A field such as
//!   `metadata.expense_limit` tests the entity's linked attributes: the
//!   condition holds when any link has any attribute with that key whose
//!   value satisfies it.
//! - [`AttributeProcessor`] filters attribute records. A field such as
//!   `employee.Department` navigates attribute to link to owner and tests
//!   the owner's field. A record whose chain is broken never matches.
//!
//! Attribute values are stored as text. Ordering operators parse both the
//! stored value and the constant as numbers; everything else compares text.

use log::{debug, trace};

use crate::config::RelationConventions;
use crate::error::{QueryError, Result};
use crate::expr::{comparison, FieldHandle, Node};
use crate::flat::direct_condition;
use crate::model::{Condition, ConditionValue, Matrix};
use crate::op::Operator;
use crate::predicate::Predicate;
use crate::processor::{compile_matrix, Processor};
use crate::traits::{AttributeEntity, AttributeRecord, LinkRecord, OwnedLink, PrimaryEntity};
use crate::value::{Number, Scalar};

type ValueTest = Box<dyn Fn(&str) -> Result<bool> + Send + Sync>;

type OwnerOf<A> = <<A as AttributeEntity>::Link as OwnedLink>::Owner;

/// Filters primary entities, including through their linked attributes.
#[derive(Debug, Clone, Default)]
pub struct EntityProcessor {
    conventions: RelationConventions,
}

impl EntityProcessor {
    pub fn new(conventions: RelationConventions) -> Self {
        EntityProcessor { conventions }
    }

    pub fn conventions(&self) -> &RelationConventions {
        &self.conventions
    }

    fn condition<P: PrimaryEntity>(&self, condition: &Condition) -> Result<Node<P>> {
        match self.conventions.attribute_key(condition.field()) {
            Some(key) => linked_attribute::<P>(key, condition),
            None => direct_condition::<P>(condition),
        }
    }
}

impl<P: PrimaryEntity> Processor<P> for EntityProcessor {
    fn compile(&self, matrix: &Matrix) -> Result<Predicate<P>> {
        debug!(
            "compiling {} entity matrix over {} ({} expressions)",
            matrix.logical_operator(),
            std::any::type_name::<P>(),
            matrix.arity()
        );
        let node = compile_matrix(matrix, &|c: &Condition| self.condition::<P>(c))?;
        Ok(Predicate::from_node(node))
    }
}

/// Filters attribute records, including through their owning entity.
#[derive(Debug, Clone, Default)]
pub struct AttributeProcessor {
    conventions: RelationConventions,
}

impl AttributeProcessor {
    pub fn new(conventions: RelationConventions) -> Self {
        AttributeProcessor { conventions }
    }

    pub fn conventions(&self) -> &RelationConventions {
        &self.conventions
    }

    fn condition<A: AttributeEntity>(&self, condition: &Condition) -> Result<Node<A>> {
        match self.conventions.entity_field(condition.field()) {
            Some(name) => owner_field::<A>(name, condition),
            None => direct_condition::<A>(condition),
        }
    }
}

impl<A: AttributeEntity> Processor<A> for AttributeProcessor {
    fn compile(&self, matrix: &Matrix) -> Result<Predicate<A>> {
        debug!(
            "compiling {} attribute matrix over {} ({} expressions)",
            matrix.logical_operator(),
            std::any::type_name::<A>(),
            matrix.arity()
        );
        let node = compile_matrix(matrix, &|c: &Condition| self.condition::<A>(c))?;
        Ok(Predicate::from_node(node))
    }
}

fn linked_attribute<P: PrimaryEntity>(key: &str, condition: &Condition) -> Result<Node<P>> {
    if key.trim().is_empty() {
        return Err(QueryError::InvalidArgument(format!(
            "attribute key in '{}' must not be empty",
            condition.field()
        )));
    }
    trace!("attribute condition on key '{}'", key);
    let test = value_test(key, condition.operator(), condition.value())?;
    let key = key.to_string();

    Ok(Box::new(move |entity: &P| -> Result<bool> {
        for link in entity.links() {
            for attribute in link.attributes() {
                if attribute.key() == key && test(attribute.value())? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }))
}

fn owner_field<A: AttributeEntity>(name: &str, condition: &Condition) -> Result<Node<A>> {
    if name.trim().is_empty() {
        return Err(QueryError::InvalidArgument(format!(
            "entity field in '{}' must not be empty",
            condition.field()
        )));
    }
    trace!("owner condition on field '{}'", name);
    let field = FieldHandle::<OwnerOf<A>>::of(name)?;
    let inner = comparison(field, condition.value(), condition.operator())?;

    Ok(Box::new(move |attribute: &A| -> Result<bool> {
        match attribute.owner() {
            Some(owner) => inner(owner),
            None => Ok(false),
        }
    }))
}

/// Compiles the test applied to a stored attribute value.
fn value_test(key: &str, op: Operator, constant: &ConditionValue) -> Result<ValueTest> {
    match op {
        Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => {
            let literal = single(key, op, constant)?.to_string();
            let bound = Number::parse(&literal)
                .ok_or_else(|| QueryError::NumericParse(literal.clone()))?;
            Ok(Box::new(move |stored: &str| -> Result<bool> {
                let value = Number::parse(stored)
                    .ok_or_else(|| QueryError::NumericParse(stored.to_string()))?;
                Ok(value
                    .compare(bound)
                    .map_or(false, |ordering| op.eval_ordering(ordering)))
            }))
        }
        Operator::Eq | Operator::Neq => {
            let literal = single(key, op, constant)?.to_string();
            let negate = op == Operator::Neq;
            Ok(Box::new(move |stored: &str| -> Result<bool> {
                Ok((stored == literal) != negate)
            }))
        }
        Operator::In | Operator::Nin => {
            let set: Vec<String> = match constant {
                ConditionValue::Array(items) => items.iter().map(Scalar::to_string).collect(),
                _ => return Err(shape_mismatch(key, op, "an array constant")),
            };
            let negate = op == Operator::Nin;
            Ok(Box::new(move |stored: &str| -> Result<bool> {
                Ok(set.iter().any(|s| s == stored) != negate)
            }))
        }
        Operator::Like | Operator::ILike => {
            let pattern = match constant {
                ConditionValue::Pattern(p) => p.clone(),
                ConditionValue::Single(s) => s.to_string(),
                ConditionValue::Array(_) => return Err(shape_mismatch(key, op, "a text pattern")),
            };
            if op == Operator::ILike {
                let pattern = pattern.to_lowercase();
                Ok(Box::new(move |stored: &str| -> Result<bool> {
                    Ok(stored.to_lowercase().contains(&pattern))
                }))
            } else {
                Ok(Box::new(move |stored: &str| -> Result<bool> {
                    Ok(stored.contains(&pattern))
                }))
            }
        }
        Operator::And | Operator::Or | Operator::Not => Err(QueryError::UnsupportedOperator(
            format!("{} cannot compare attribute '{}'", op, key),
        )),
    }
}

fn single<'a>(key: &str, op: Operator, constant: &'a ConditionValue) -> Result<&'a Scalar> {
    match constant {
        ConditionValue::Single(s) => Ok(s),
        _ => Err(shape_mismatch(key, op, "a single constant")),
    }
}

fn shape_mismatch(key: &str, op: Operator, expected: &str) -> QueryError {
    QueryError::type_mismatch(key, format!("{} needs {}", op, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::builder::MatrixBuilder;
    use crate::traits::{FieldSpec, FieldType, Queryable};
    use crate::value::Value;

    #[derive(Debug)]
    struct Attr {
        key: String,
        value: String,
    }

    impl AttributeRecord for Attr {
        fn key(&self) -> &str {
            &self.key
        }

        fn value(&self) -> &str {
            &self.value
        }
    }

    #[derive(Debug)]
    struct Assignment {
        attributes: Vec<Attr>,
    }

    impl LinkRecord for Assignment {
        type Attribute = Attr;

        fn attributes(&self) -> &[Attr] {
            &self.attributes
        }
    }

    #[derive(Debug)]
    struct Employee {
        name: String,
        department: String,
        assignments: Vec<Assignment>,
    }

    impl Queryable for Employee {
        fn schema() -> &'static [FieldSpec] {
            const SCHEMA: &[FieldSpec] = &[
                FieldSpec::new("Name", FieldType::Text),
                FieldSpec::new("Department", FieldType::Text),
            ];
            SCHEMA
        }

        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "Name" => Value::Text(&self.name),
                "Department" => Value::Text(&self.department),
                _ => Value::None,
            }
        }
    }

    impl PrimaryEntity for Employee {
        type Link = Assignment;

        fn links(&self) -> &[Assignment] {
            &self.assignments
        }
    }

    fn employee(name: &str, department: &str, attrs: &[(&str, &str)]) -> Employee {
        Employee {
            name: name.into(),
            department: department.into(),
            assignments: vec![Assignment {
                attributes: attrs
                    .iter()
                    .map(|(k, v)| Attr {
                        key: k.to_string(),
                        value: v.to_string(),
                    })
                    .collect(),
            }],
        }
    }

    fn names<'a>(hits: &[&'a Employee]) -> Vec<&'a str> {
        hits.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn attribute_ordering_parses_numbers() {
        let _ = env_logger::builder().is_test(true).try_init();
        let data = vec![
            employee("ana", "Sales", &[("expense_limit", "5000")]),
            employee("bo", "Sales", &[("expense_limit", "10000")]),
        ];
        let matrix = MatrixBuilder::new()
            .add_condition("metadata.expense_limit", Operator::Gt, "7500")
            .unwrap()
            .build();

        let hits = EntityProcessor::default().filter(&data, &matrix).unwrap();
        assert_eq!(names(&hits), vec!["bo"]);
    }

    #[test]
    fn attribute_and_own_field_mix() {
        let data = vec![
            employee("ana", "Sales", &[("region", "north")]),
            employee("bo", "Support", &[("region", "north")]),
            employee("cy", "Sales", &[("region", "south")]),
        ];
        let matrix = MatrixBuilder::new()
            .add_condition("Department", Operator::Eq, "Sales")
            .unwrap()
            .add_condition("metadata.region", Operator::In, ["north", "east"])
            .unwrap()
            .build();

        let hits = EntityProcessor::default().filter(&data, &matrix).unwrap();
        assert_eq!(names(&hits), vec!["ana"]);
    }

    #[test]
    fn any_link_any_attribute() {
        let mut multi = employee("ana", "Sales", &[("level", "2")]);
        multi.assignments.push(Assignment {
            attributes: vec![Attr {
                key: "level".into(),
                value: "7".into(),
            }],
        });
        let data = vec![multi, employee("bo", "Sales", &[])];
        let matrix = MatrixBuilder::new()
            .add_condition("metadata.level", Operator::Gte, 5)
            .unwrap()
            .build();

        let hits = EntityProcessor::default().filter(&data, &matrix).unwrap();
        assert_eq!(names(&hits), vec!["ana"]);
    }

    #[test]
    fn text_operators_render_literals() {
        let data = vec![
            employee("ana", "Sales", &[("remote", "true"), ("title", "Senior Manager")]),
            employee("bo", "Sales", &[("remote", "false"), ("title", "Associate")]),
        ];
        let processor = EntityProcessor::default();

        let remote = MatrixBuilder::new()
            .add_condition("metadata.remote", Operator::Eq, true)
            .unwrap()
            .build();
        assert_eq!(names(&processor.filter(&data, &remote).unwrap()), vec!["ana"]);

        let title = MatrixBuilder::new()
            .add_condition("metadata.title", Operator::ILike, "manager")
            .unwrap()
            .build();
        assert_eq!(names(&processor.filter(&data, &title).unwrap()), vec!["ana"]);
    }

    #[test]
    fn non_numeric_literal_fails_at_compile() {
        let matrix = MatrixBuilder::new()
            .add_condition("metadata.expense_limit", Operator::Gt, "lots")
            .unwrap()
            .build();
        let err = Processor::<Employee>::compile(&EntityProcessor::default(), &matrix).unwrap_err();
        assert!(matches!(err, QueryError::NumericParse(_)));
    }

    #[test]
    fn non_numeric_stored_value_fails_at_evaluation() {
        let data = vec![employee("ana", "Sales", &[("expense_limit", "n/a")])];
        let matrix = MatrixBuilder::new()
            .add_condition("metadata.expense_limit", Operator::Lt, 100)
            .unwrap()
            .build();
        let predicate: Predicate<Employee> = EntityProcessor::default().compile(&matrix).unwrap();
        assert!(matches!(
            predicate.evaluate(&data[0]),
            Err(QueryError::NumericParse(_))
        ));
    }

    #[test]
    fn empty_attribute_key_is_invalid() {
        let matrix = MatrixBuilder::new()
            .add_condition("metadata.", Operator::Eq, "x")
            .unwrap()
            .build();
        let err = Processor::<Employee>::compile(&EntityProcessor::default(), &matrix).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn custom_attribute_prefix() {
        let processor = EntityProcessor::new(RelationConventions {
            attribute_prefix: "attr:".into(),
            ..RelationConventions::default()
        });
        let data = vec![employee("ana", "Sales", &[("badge", "A1")])];
        let matrix = MatrixBuilder::new()
            .add_condition("attr:badge", Operator::Eq, "A1")
            .unwrap()
            .build();
        assert_eq!(processor.filter(&data, &matrix).unwrap().len(), 1);
    }

    // Reverse navigation: attribute -> link -> owner.

    #[derive(Debug)]
    struct OwnedAssignment {
        employee: Option<Arc<Employee>>,
    }

    impl OwnedLink for OwnedAssignment {
        type Owner = Employee;

        fn owner(&self) -> Option<&Employee> {
            self.employee.as_deref()
        }
    }

    #[derive(Debug)]
    struct OwnedAttr {
        key: String,
        value: String,
        link: Option<Arc<OwnedAssignment>>,
    }

    impl AttributeRecord for OwnedAttr {
        fn key(&self) -> &str {
            &self.key
        }

        fn value(&self) -> &str {
            &self.value
        }
    }

    impl Queryable for OwnedAttr {
        fn schema() -> &'static [FieldSpec] {
            const SCHEMA: &[FieldSpec] = &[
                FieldSpec::new("Key", FieldType::Text),
                FieldSpec::new("Value", FieldType::Text),
            ];
            SCHEMA
        }

        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "Key" => Value::Text(&self.key),
                "Value" => Value::Text(&self.value),
                _ => Value::None,
            }
        }
    }

    impl AttributeEntity for OwnedAttr {
        type Link = OwnedAssignment;

        fn link(&self) -> Option<&OwnedAssignment> {
            self.link.as_deref()
        }
    }

    fn owned(key: &str, value: &str, owner: Option<&Arc<Employee>>) -> OwnedAttr {
        OwnedAttr {
            key: key.into(),
            value: value.into(),
            link: Some(Arc::new(OwnedAssignment {
                employee: owner.cloned(),
            })),
        }
    }

    #[test]
    fn reverse_navigation_to_owner() {
        let sales = Arc::new(employee("ana", "Sales", &[]));
        let support = Arc::new(employee("bo", "Support", &[]));
        let attrs = vec![
            owned("badge", "A1", Some(&sales)),
            owned("badge", "B2", Some(&support)),
            owned("badge", "C3", None),
            OwnedAttr {
                key: "badge".into(),
                value: "D4".into(),
                link: None,
            },
        ];

        let matrix = MatrixBuilder::new()
            .add_condition("Key", Operator::Eq, "badge")
            .unwrap()
            .add_condition("employee.Department", Operator::Eq, "Sales")
            .unwrap()
            .build();
        let hits = AttributeProcessor::default().filter(&attrs, &matrix).unwrap();
        let values: Vec<_> = hits.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["A1"]);
    }

    #[test]
    fn broken_chain_never_matches_even_negated() {
        let attrs = vec![owned("badge", "C3", None)];
        let matrix = MatrixBuilder::new()
            .add_condition("employee.Department", Operator::Neq, "Sales")
            .unwrap()
            .build();
        let hits = AttributeProcessor::default().filter(&attrs, &matrix).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn unknown_owner_field() {
        let matrix = MatrixBuilder::new()
            .add_condition("employee.Salary", Operator::Eq, "x")
            .unwrap()
            .build();
        let err = Processor::<OwnedAttr>::compile(&AttributeProcessor::default(), &matrix)
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { ref field, .. } if field == "Salary"));
    }
}
