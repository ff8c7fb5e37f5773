//! The matrix tree: conditions, condition values and nested matrices.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::op::{Operator, OperatorKind};
use crate::value::Scalar;

/// The value half of a condition.
///
/// - `Array` goes with `_in` / `_nin`
/// - `Pattern` goes with the text operators `_like` / `_ilike`
/// - `Single` goes with every other comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionValue {
    Single(Scalar),
    Array(Vec<Scalar>),
    Pattern(String),
}

impl ConditionValue {
    /// Returns `true` if this value shape is the one `op` expects.
    pub fn fits(&self, op: Operator) -> bool {
        match self {
            ConditionValue::Array(_) => op.is_membership(),
            ConditionValue::Pattern(_) => op.kind() == OperatorKind::Text,
            ConditionValue::Single(_) => {
                op.kind() == OperatorKind::Comparison && !op.is_membership()
            }
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            ConditionValue::Single(_) => "single value",
            ConditionValue::Array(_) => "array",
            ConditionValue::Pattern(_) => "pattern",
        }
    }
}

/// A single leaf test: field, operator, value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition")]
pub struct Condition {
    field: String,
    operator: Operator,
    value: ConditionValue,
}

impl Condition {
    /// Creates a condition, checking its invariants.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the field is blank or the value shape does not
    ///   match the operator
    /// - `UnsupportedOperator` if the operator is logical
    pub fn new(field: impl Into<String>, operator: Operator, value: ConditionValue) -> Result<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(QueryError::InvalidArgument(
                "condition field must not be empty".into(),
            ));
        }
        if operator.is_logical() {
            return Err(QueryError::UnsupportedOperator(format!(
                "{} cannot be used in a condition",
                operator
            )));
        }
        if !value.fits(operator) {
            return Err(QueryError::InvalidArgument(format!(
                "{} does not accept a {} (field '{}')",
                operator,
                value.shape(),
                field
            )));
        }
        Ok(Condition {
            field,
            operator,
            value,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }
}

/// The recursive boolean-condition tree.
///
/// A matrix combines its conditions and then its nested matrices, in order,
/// under one logical operator. Matrices are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    logical_operator: Operator,
    conditions: Vec<Condition>,
    nested: Vec<Matrix>,
}

// Deserialized shapes, checked by the constructors before use.

#[derive(Deserialize)]
struct RawCondition {
    field: String,
    operator: Operator,
    value: ConditionValue,
}

impl TryFrom<RawCondition> for Condition {
    type Error = QueryError;

    fn try_from(raw: RawCondition) -> Result<Self> {
        Condition::new(raw.field, raw.operator, raw.value)
    }
}

#[derive(Deserialize)]
struct RawMatrix {
    logical_operator: Operator,
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    nested: Vec<Matrix>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = QueryError;

    fn try_from(raw: RawMatrix) -> Result<Self> {
        Matrix::new(raw.logical_operator, raw.conditions, raw.nested)
    }
}

impl Matrix {
    /// Creates a matrix from its parts.
    ///
    /// Fails with `UnsupportedOperator` if `logical_operator` is not logical.
    /// The `_not` arity rule is enforced when the matrix is compiled.
    pub fn new(
        logical_operator: Operator,
        conditions: Vec<Condition>,
        nested: Vec<Matrix>,
    ) -> Result<Self> {
        if !logical_operator.is_logical() {
            return Err(QueryError::UnsupportedOperator(format!(
                "{} is not a logical operator",
                logical_operator
            )));
        }
        Ok(Matrix {
            logical_operator,
            conditions,
            nested,
        })
    }

    /// Assembles a matrix whose operator is already known to be logical.
    pub(crate) fn assemble(
        logical_operator: Operator,
        conditions: Vec<Condition>,
        nested: Vec<Matrix>,
    ) -> Self {
        debug_assert!(logical_operator.is_logical());
        Matrix {
            logical_operator,
            conditions,
            nested,
        }
    }

    pub fn logical_operator(&self) -> Operator {
        self.logical_operator
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn nested(&self) -> &[Matrix] {
        &self.nested
    }

    /// Number of expressions combined at this level.
    pub fn arity(&self) -> usize {
        self.conditions.len() + self.nested.len()
    }

    /// Returns `true` if the matrix holds no conditions at any depth.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.nested.iter().all(Matrix::is_empty)
    }
}
