//! Fluent, validating matrix builder.
//!
//! Every step is checked as it is applied, so a [`Matrix`] that comes out
//! of [`MatrixBuilder::build`] already satisfies the model invariants.

use crate::error::{QueryError, Result};
use crate::model::{Condition, ConditionValue, Matrix};
use crate::op::{Operator, OperatorKind};
use crate::value::{Literal, Scalar};

/// Builds a [`Matrix`] step by step.
///
/// # Example
///
/// ```
/// use rulematrix::{MatrixBuilder, Operator};
///
/// # fn main() -> rulematrix::Result<()> {
/// let matrix = MatrixBuilder::new()
///     .add_condition("Department", Operator::Eq, "Sales")?
///     .add_nested_conditions(|b| {
///         b.with_logical_operator(Operator::Or)?
///             .add_condition("Experience", Operator::Gt, 5)?
///             .add_condition("Title", Operator::Eq, "Manager")
///     })?
///     .build();
///
/// assert_eq!(matrix.conditions().len(), 1);
/// assert_eq!(matrix.nested().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    logical_operator: Operator,
    conditions: Vec<Condition>,
    nested: Vec<Matrix>,
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        MatrixBuilder {
            logical_operator: Operator::And,
            conditions: Vec::new(),
            nested: Vec::new(),
        }
    }
}

impl MatrixBuilder {
    /// Creates a builder combining with `_and`.
    pub fn new() -> Self {
        MatrixBuilder::default()
    }

    /// Sets the operator combining this level.
    ///
    /// Fails with `UnsupportedOperator` unless `op` is logical.
    pub fn with_logical_operator(mut self, op: Operator) -> Result<Self> {
        if !op.is_logical() {
            return Err(QueryError::UnsupportedOperator(format!(
                "{} is not a logical operator",
                op
            )));
        }
        self.logical_operator = op;
        Ok(self)
    }

    /// Adds a leaf condition.
    ///
    /// The stored value shape follows the operator: text operators keep a
    /// pattern, `_in` / `_nin` keep an array (and require a list), every
    /// other comparison keeps a single value.
    pub fn add_condition(
        mut self,
        field: &str,
        op: Operator,
        value: impl Into<Literal>,
    ) -> Result<Self> {
        if field.trim().is_empty() {
            return Err(QueryError::InvalidArgument(
                "condition field must not be empty".into(),
            ));
        }
        if op.is_logical() {
            return Err(QueryError::UnsupportedOperator(format!(
                "{} cannot be used in a condition",
                op
            )));
        }
        let value = condition_value(field, op, value.into())?;
        self.conditions.push(Condition::new(field, op, value)?);
        Ok(self)
    }

    /// Appends an already built matrix.
    pub fn add_nested_matrix(mut self, matrix: Matrix) -> Self {
        self.nested.push(matrix);
        self
    }

    /// Builds a nested matrix with a fresh builder and appends it.
    ///
    /// Any error returned by `configure` is propagated unchanged.
    pub fn add_nested_conditions<F>(self, configure: F) -> Result<Self>
    where
        F: FnOnce(MatrixBuilder) -> Result<MatrixBuilder>,
    {
        let nested = configure(MatrixBuilder::new())?.build();
        Ok(self.add_nested_matrix(nested))
    }

    /// Finalizes the matrix.
    pub fn build(self) -> Matrix {
        Matrix::assemble(self.logical_operator, self.conditions, self.nested)
    }
}

fn condition_value(field: &str, op: Operator, value: Literal) -> Result<ConditionValue> {
    match (op.kind(), value) {
        (_, Literal::Null) => Err(QueryError::InvalidArgument(format!(
            "value for '{}' must not be empty",
            field
        ))),
        (OperatorKind::Text, Literal::Scalar(s)) => Ok(ConditionValue::Pattern(pattern_text(s))),
        (_, Literal::List(items)) if op.is_membership() => Ok(ConditionValue::Array(items)),
        (_, Literal::Scalar(_)) if op.is_membership() => Err(QueryError::InvalidArgument(
            format!("{} on '{}' requires a list of values", op, field),
        )),
        (_, Literal::List(_)) => Err(QueryError::InvalidArgument(format!(
            "{} on '{}' takes a single value, not a list",
            op, field
        ))),
        (_, Literal::Scalar(s)) => Ok(ConditionValue::Single(s)),
    }
}

fn pattern_text(scalar: Scalar) -> String {
    match scalar {
        Scalar::Text(s) => s,
        other => other.to_string(),
    }
}
