//! Compiling matrices against a record's own fields.

use log::debug;

use crate::error::Result;
use crate::expr::{comparison, FieldHandle, Node};
use crate::model::{Condition, Matrix};
use crate::predicate::Predicate;
use crate::processor::{compile_matrix, Processor};
use crate::traits::Queryable;

/// Compiles matrices whose conditions all name fields of the record itself.
///
/// # Example
///
/// ```
/// use rulematrix::{FieldSpec, FieldType, FlatProcessor, MatrixBuilder, Number, Operator, Processor, Queryable, Value};
///
/// struct Employee {
///     department: &'static str,
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
///             "Department" => Value::Text(self.department),
///             "Experience" => Value::Number(Number::from(self.experience)),
///             _ => Value::None,
///         }
///     }
/// }
///
/// let staff = vec![
///     Employee { department: "Sales", experience: 7 },
///     Employee { department: "Sales", experience: 2 },
///     Employee { department: "Support", experience: 9 },
/// ];
///
/// let matrix = MatrixBuilder::new()
///     .add_condition("Department", Operator::Eq, "Sales")?
///     .add_condition("Experience", Operator::Gt, 5)?
///     .build();
///
/// let hits = FlatProcessor.filter(&staff, &matrix)?;
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].experience, 7);
/// # Ok::<(), rulematrix::QueryError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatProcessor;

impl FlatProcessor {
    pub fn new() -> Self {
        FlatProcessor
    }
}

impl<T: Queryable + 'static> Processor<T> for FlatProcessor {
    fn compile(&self, matrix: &Matrix) -> Result<Predicate<T>> {
        debug!(
            "compiling {} matrix over {} ({} expressions)",
            matrix.logical_operator(),
            std::any::type_name::<T>(),
            matrix.arity()
        );
        let node = compile_matrix(matrix, &direct_condition::<T>)?;
        Ok(Predicate::from_node(node))
    }
}

/// Compiles a condition on one of `T`'s own fields.
pub(crate) fn direct_condition<T: Queryable + 'static>(condition: &Condition) -> Result<Node<T>> {
    let field = FieldHandle::<T>::of(condition.field())?;
    comparison(field, condition.value(), condition.operator())
}
