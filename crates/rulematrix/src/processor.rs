//! The compile/filter contract shared by all processors.

use log::trace;

use crate::error::{QueryError, Result};
use crate::expr::{combine, Node};
use crate::model::{Condition, Matrix};
use crate::predicate::Predicate;

/// Compiles matrices into predicates over `T`.
///
/// Implemented by [`FlatProcessor`](crate::FlatProcessor),
/// [`EntityProcessor`](crate::EntityProcessor) and
/// [`AttributeProcessor`](crate::AttributeProcessor); they differ only in
/// which field conventions they understand.
pub trait Processor<T> {
    /// Compiles `matrix` into a reusable predicate.
    fn compile(&self, matrix: &Matrix) -> Result<Predicate<T>>;

    /// Compiles `matrix` and applies it to `source`.
    fn filter<'a>(&self, source: &'a [T], matrix: &Matrix) -> Result<Vec<&'a T>> {
        self.compile(matrix)?.filter(source)
    }
}

/// Walks a matrix bottom-up: conditions first, then nested matrices, each
/// level folded with its logical operator.
pub(crate) fn compile_matrix<T: 'static>(
    matrix: &Matrix,
    leaf: &dyn Fn(&Condition) -> Result<Node<T>>,
) -> Result<Node<T>> {
    let op = matrix.logical_operator();
    if !op.is_logical() {
        return Err(QueryError::UnsupportedOperator(format!(
            "{} is not a logical operator",
            op
        )));
    }

    let mut nodes = Vec::with_capacity(matrix.arity());
    for condition in matrix.conditions() {
        trace!(
            "compiling condition {} {} under {}",
            condition.field(),
            condition.operator(),
            op
        );
        if condition.operator().is_logical() {
            return Err(QueryError::UnsupportedOperator(format!(
                "{} cannot be used in a condition",
                condition.operator()
            )));
        }
        nodes.push(leaf(condition)?);
    }
    for nested in matrix.nested() {
        nodes.push(compile_matrix(nested, leaf)?);
    }

    combine(nodes, op)
}
