//! Invocation arguments
//!
//! The host hands every invocation an ordered list of opaque values (a request
//! context, a response writer, ...). The engine never looks inside; steps pull
//! typed values back out by position.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use super::error::ArgError;

/// Shared, type-erased argument value
pub type ArgValue = Arc<dyn Any + Send + Sync>;

/// Ordered, heterogeneous list of values passed unchanged to every step
#[derive(Clone, Default)]
pub struct Args {
    values: Vec<ArgValue>,
}

impl Args {
    /// Create an empty argument list
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value, builder style
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Append a value
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push(Arc::new(value));
    }

    /// Append an already shared value (the host keeps its own handle)
    pub fn push_shared(&mut self, value: ArgValue) {
        self.values.push(value);
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed access by position; `None` when absent or of another type
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// Typed access by position, reporting why the lookup failed
    pub fn require<T: Any>(&self, index: usize) -> Result<&T, ArgError> {
        let value = self.values.get(index).ok_or(ArgError::Missing { index })?;
        value.downcast_ref::<T>().ok_or(ArgError::TypeMismatch {
            index,
            expected: type_name::<T>(),
        })
    }

    /// Raw shared handle by position
    pub fn shared(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index)
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.values.len()).finish()
    }
}

impl FromIterator<ArgValue> for Args {
    fn from_iter<T: IntoIterator<Item = ArgValue>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
