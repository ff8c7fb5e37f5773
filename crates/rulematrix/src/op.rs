//! The operator catalog.
//!
//! [`Operator`] is a closed enum: the set of tokens understood by the
//! builder, the codec and the compilers is fixed, and every `match` over it
//! is exhaustive.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// How an operator is used inside a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    /// Leaf-level relational or membership test.
    Comparison,
    /// Leaf-level substring test on text.
    Text,
    /// Combines conditions and nested matrices.
    Logical,
}

/// An operator from the fixed catalog.
///
/// Serializes as its token (`"_eq"`, `"_and"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    // Comparison
    #[serde(rename = "_eq")]
    Eq,
    #[serde(rename = "_neq")]
    Neq,
    #[serde(rename = "_gt")]
    Gt,
    #[serde(rename = "_lt")]
    Lt,
    #[serde(rename = "_gte")]
    Gte,
    #[serde(rename = "_lte")]
    Lte,
    #[serde(rename = "_in")]
    In,
    #[serde(rename = "_nin")]
    Nin,

    // Text
    #[serde(rename = "_like")]
    Like,
    #[serde(rename = "_ilike")]
    ILike,

    // Logical
    #[serde(rename = "_and")]
    And,
    #[serde(rename = "_or")]
    Or,
    #[serde(rename = "_not")]
    Not,
}

impl Operator {
    /// Every operator in the catalog.
    pub const ALL: [Operator; 13] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::In,
        Operator::Nin,
        Operator::Like,
        Operator::ILike,
        Operator::And,
        Operator::Or,
        Operator::Not,
    ];

    /// Finds the operator for a token such as `_gte`.
    pub fn lookup(token: &str) -> Result<Operator> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.token() == token)
            .ok_or_else(|| QueryError::UnsupportedOperator(token.to_string()))
    }

    /// The operator token, including its leading underscore.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "_eq",
            Operator::Neq => "_neq",
            Operator::Gt => "_gt",
            Operator::Lt => "_lt",
            Operator::Gte => "_gte",
            Operator::Lte => "_lte",
            Operator::In => "_in",
            Operator::Nin => "_nin",
            Operator::Like => "_like",
            Operator::ILike => "_ilike",
            Operator::And => "_and",
            Operator::Or => "_or",
            Operator::Not => "_not",
        }
    }

    /// The token without its leading underscore, as written inside a
    /// serialized condition group.
    pub fn suffix(self) -> &'static str {
        &self.token()[1..]
    }

    /// Human readable description.
    pub fn description(self) -> &'static str {
        match self {
            Operator::Eq => "Equal to",
            Operator::Neq => "Not equal to",
            Operator::Gt => "Greater than",
            Operator::Lt => "Less than",
            Operator::Gte => "Greater than or equal to",
            Operator::Lte => "Less than or equal to",
            Operator::In => "In list",
            Operator::Nin => "Not in list",
            Operator::Like => "Contains text",
            Operator::ILike => "Contains text, ignoring case",
            Operator::And => "All must match",
            Operator::Or => "Any must match",
            Operator::Not => "Must not match",
        }
    }

    pub fn kind(self) -> OperatorKind {
        match self {
            Operator::Eq
            | Operator::Neq
            | Operator::Gt
            | Operator::Lt
            | Operator::Gte
            | Operator::Lte
            | Operator::In
            | Operator::Nin => OperatorKind::Comparison,
            Operator::Like | Operator::ILike => OperatorKind::Text,
            Operator::And | Operator::Or | Operator::Not => OperatorKind::Logical,
        }
    }

    pub fn is_logical(self) -> bool {
        self.kind() == OperatorKind::Logical
    }

    /// Returns `true` for `_gt`, `_lt`, `_gte` and `_lte`.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte
        )
    }

    /// Returns `true` for `_in` and `_nin`.
    pub fn is_membership(self) -> bool {
        matches!(self, Operator::In | Operator::Nin)
    }

    /// Evaluates a relational operator given an ordering result.
    ///
    /// Operators that are not relational never match.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Neq => ordering != Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Operator::lookup(s)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
