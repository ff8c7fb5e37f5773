//! Error types for the rulematrix crate.

use thiserror::Error;

/// Errors raised while building, parsing, compiling or evaluating a matrix.
///
/// Every failure is reported at the first violation encountered; there is
/// no partial success.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A required argument was empty, absent, or of the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown operator token, or an operator of the wrong kind.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// The field, the constant and the operator cannot be combined.
    #[error("type mismatch on '{field}': {reason}")]
    TypeMismatch { field: String, reason: String },

    /// A logical operator received the wrong number of expressions.
    #[error("operator '{operator}' expects {expected} expression(s), got {actual}")]
    InvalidArity {
        operator: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The named field does not exist on the record type.
    #[error("unknown field '{field}' on {record}")]
    UnknownField { field: String, record: &'static str },

    /// Malformed serialized matrix text.
    #[error("parse error: {0}")]
    Parse(String),

    /// An ordering comparison met a value that is not a number.
    #[error("cannot parse '{0}' as a number")]
    NumericParse(String),

    /// The configuration document could not be read.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl QueryError {
    pub(crate) fn type_mismatch(field: &str, reason: impl Into<String>) -> Self {
        QueryError::TypeMismatch {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for rulematrix operations.
pub type Result<T> = std::result::Result<T, QueryError>;
