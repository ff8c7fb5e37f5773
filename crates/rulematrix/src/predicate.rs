//! Compiled predicates.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::expr::Node;

/// The executable form of a matrix over records of type `T`.
///
/// Predicates are immutable, `Send + Sync` and cheap to clone, so one
/// compiled matrix can filter many collections from many threads.
pub struct Predicate<T> {
    test: Arc<dyn Fn(&T) -> Result<bool> + Send + Sync>,
}

impl<T> Predicate<T> {
    pub(crate) fn from_node(node: Node<T>) -> Self {
        Predicate {
            test: Arc::from(node),
        }
    }

    /// Tests a single record.
    pub fn evaluate(&self, item: &T) -> Result<bool> {
        (self.test)(item)
    }

    /// Filters a slice, returning references to matching records in their
    /// original order.
    pub fn filter<'a>(&self, items: &'a [T]) -> Result<Vec<&'a T>> {
        self.filter_iter(items)
    }

    /// Filters any sequence of borrowed records.
    pub fn filter_iter<'a, I>(&self, items: I) -> Result<Vec<&'a T>>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut results = Vec::new();
        for item in items {
            if self.evaluate(item)? {
                results.push(item);
            }
        }
        Ok(results)
    }

    /// Filters and clones matching records.
    pub fn filter_cloned(&self, items: &[T]) -> Result<Vec<T>>
    where
        T: Clone,
    {
        Ok(self.filter(items)?.into_iter().cloned().collect())
    }

    /// Counts the matching records.
    pub fn count(&self, items: &[T]) -> Result<usize> {
        let mut count = 0;
        for item in items {
            if self.evaluate(item)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Returns `true` if any record matches.
    pub fn any(&self, items: &[T]) -> Result<bool> {
        Ok(self.find(items)?.is_some())
    }

    /// Finds the first matching record.
    pub fn find<'a>(&self, items: &'a [T]) -> Result<Option<&'a T>> {
        for item in items {
            if self.evaluate(item)? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Predicate {
            test: Arc::clone(&self.test),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate<{}>", std::any::type_name::<T>())
    }
}
