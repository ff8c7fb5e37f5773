//! Expression compiler primitives.
//!
//! [`comparison`] turns one field, one constant and one operator into an
//! executable test node; [`combine`] folds a list of nodes under a logical
//! operator. Both are pure: all type checking happens here, once, and the
//! returned closures only read values.

use std::cmp::Ordering;

use crate::error::{QueryError, Result};
use crate::model::ConditionValue;
use crate::op::{Operator, OperatorKind};
use crate::traits::{FieldType, Queryable};
use crate::value::{Scalar, Value};

/// An executable boolean test over a `T`.
///
/// Evaluation is fallible only where reading the field is (see
/// [`FieldHandle::new`]).
pub type Node<T> = Box<dyn Fn(&T) -> Result<bool> + Send + Sync>;

type Reader<T> = Box<dyn for<'a> Fn(&'a T) -> Result<Value<'a>> + Send + Sync>;

/// A typed handle to one field of a record.
pub struct FieldHandle<T> {
    name: String,
    ty: FieldType,
    read: Reader<T>,
}

impl<T: 'static> FieldHandle<T> {
    /// Creates a handle from an explicit reader.
    ///
    /// The reader may fail; its error surfaces when the compiled node is
    /// evaluated.
    pub fn new<F>(name: impl Into<String>, ty: FieldType, read: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> Result<Value<'a>> + Send + Sync + 'static,
    {
        FieldHandle {
            name: name.into(),
            ty,
            read: Box::new(read),
        }
    }

    /// Resolves `field` against the schema of `T`.
    ///
    /// Fails with `UnknownField` if `T` has no such field.
    pub fn of(field: &str) -> Result<Self>
    where
        T: Queryable,
    {
        let ty = T::field_type(field).ok_or_else(|| QueryError::UnknownField {
            field: field.to_string(),
            record: std::any::type_name::<T>(),
        })?;
        let key = field.to_string();
        Ok(FieldHandle::new(field, ty, move |item: &T| Ok(item.field_value(&key))))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }
}

/// Compiles a single comparison.
///
/// | Operator | Test | Field |
/// |----------|------|-------|
/// | `_eq` `_neq` | equality | any |
/// | `_gt` `_lt` `_gte` `_lte` | ordering | number |
/// | `_in` `_nin` | membership in an array constant | any |
/// | `_like` | substring | text |
/// | `_ilike` | substring, case-folded | text |
///
/// A record whose field has no value never matches, whatever the operator.
///
/// # Errors
///
/// - `UnsupportedOperator` for logical operators
/// - `TypeMismatch` when the field type, the constant and the operator do
///   not fit together
pub fn comparison<T: 'static>(
    field: FieldHandle<T>,
    constant: &ConditionValue,
    op: Operator,
) -> Result<Node<T>> {
    match op.kind() {
        OperatorKind::Logical => Err(QueryError::UnsupportedOperator(format!(
            "{} cannot compare field '{}'",
            op, field.name
        ))),
        OperatorKind::Text => text_test(field, constant, op),
        OperatorKind::Comparison if op.is_membership() => membership_test(field, constant, op),
        OperatorKind::Comparison => relational_test(field, constant, op),
    }
}

fn text_test<T: 'static>(
    field: FieldHandle<T>,
    constant: &ConditionValue,
    op: Operator,
) -> Result<Node<T>> {
    if field.ty != FieldType::Text {
        return Err(QueryError::type_mismatch(
            &field.name,
            format!("{} needs a text field, found {}", op, field.ty.as_str()),
        ));
    }
    let pattern = match constant {
        ConditionValue::Pattern(p) | ConditionValue::Single(Scalar::Text(p)) => p.clone(),
        _ => {
            return Err(QueryError::type_mismatch(
                &field.name,
                format!("{} needs a text pattern", op),
            ))
        }
    };

    let ignore_case = op == Operator::ILike;
    let pattern = if ignore_case {
        pattern.to_lowercase()
    } else {
        pattern
    };
    let read = field.read;

    Ok(Box::new(move |item: &T| -> Result<bool> {
        Ok(match read(item)? {
            Value::Text(s) if ignore_case => s.to_lowercase().contains(&pattern),
            Value::Text(s) => s.contains(&pattern),
            _ => false,
        })
    }))
}

fn membership_test<T: 'static>(
    field: FieldHandle<T>,
    constant: &ConditionValue,
    op: Operator,
) -> Result<Node<T>> {
    let set = match constant {
        ConditionValue::Array(items) => items.clone(),
        _ => {
            return Err(QueryError::type_mismatch(
                &field.name,
                format!("{} needs an array constant", op),
            ))
        }
    };
    for item in &set {
        check_constant(&field, item)?;
    }

    let negate = op == Operator::Nin;
    let read = field.read;

    Ok(Box::new(move |item: &T| -> Result<bool> {
        let value = read(item)?;
        if value.is_none() {
            return Ok(false);
        }
        let found = set
            .iter()
            .any(|s| compare_values(&value, &s.as_value()) == Some(Ordering::Equal));
        Ok(found != negate)
    }))
}

fn relational_test<T: 'static>(
    field: FieldHandle<T>,
    constant: &ConditionValue,
    op: Operator,
) -> Result<Node<T>> {
    let scalar = match constant {
        ConditionValue::Single(s) => s.clone(),
        _ => {
            return Err(QueryError::type_mismatch(
                &field.name,
                format!("{} needs a single constant", op),
            ))
        }
    };
    check_constant(&field, &scalar)?;
    if op.is_ordering() && field.ty != FieldType::Number {
        return Err(QueryError::type_mismatch(
            &field.name,
            format!("{} is not defined for {} fields", op, field.ty.as_str()),
        ));
    }

    let read = field.read;

    Ok(Box::new(move |item: &T| -> Result<bool> {
        let value = read(item)?;
        Ok(match compare_values(&value, &scalar.as_value()) {
            Some(ordering) => op.eval_ordering(ordering),
            None => false,
        })
    }))
}

fn check_constant<T>(field: &FieldHandle<T>, constant: &Scalar) -> Result<()> {
    let fits = matches!(
        (field.ty, constant),
        (FieldType::Text, Scalar::Text(_))
            | (FieldType::Number, Scalar::Number(_))
            | (FieldType::Bool, Scalar::Bool(_))
    );
    if fits {
        Ok(())
    } else {
        Err(QueryError::type_mismatch(
            &field.name,
            format!(
                "{} constant cannot be compared with a {} field",
                constant.type_name(),
                field.ty.as_str()
            ),
        ))
    }
}

/// Compares two values of the same type.
///
/// Returns `None` on a type mismatch, a missing value, or NaN.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Folds nodes under a logical operator.
///
/// - `_and`: all must hold; an empty list always holds
/// - `_or`: at least one must hold; an empty list always holds
/// - `_not`: exactly one node, negated
///
/// Evaluation short-circuits and returns the first evaluation error.
///
/// # Errors
///
/// - `InvalidArity` when `_not` receives anything but one node
/// - `UnsupportedOperator` for non-logical operators
pub fn combine<T: 'static>(mut nodes: Vec<Node<T>>, op: Operator) -> Result<Node<T>> {
    match op {
        Operator::And | Operator::Or if nodes.is_empty() => {
            Ok(Box::new(|_: &T| -> Result<bool> { Ok(true) }))
        }
        Operator::And | Operator::Or if nodes.len() == 1 => Ok(nodes.remove(0)),
        Operator::And => Ok(Box::new(move |item: &T| -> Result<bool> {
            for node in &nodes {
                if !node(item)? {
                    return Ok(false);
                }
            }
            Ok(true)
        })),
        Operator::Or => Ok(Box::new(move |item: &T| -> Result<bool> {
            for node in &nodes {
                if node(item)? {
                    return Ok(true);
                }
            }
            Ok(false)
        })),
        Operator::Not => {
            if nodes.len() != 1 {
                return Err(QueryError::InvalidArity {
                    operator: Operator::Not.token(),
                    expected: 1,
                    actual: nodes.len(),
                });
            }
            let inner = nodes.remove(0);
            Ok(Box::new(move |item: &T| -> Result<bool> {
                Ok(!inner(item)?)
            }))
        }
        other => Err(QueryError::UnsupportedOperator(format!(
            "{} cannot combine expressions",
            other
        ))),
    }
}
