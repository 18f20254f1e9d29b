//! Ready-made steps over dynamic records

use serde_json::Value;
use thiserror::Error;

use super::DynInstance;
use crate::handler::step::{Flow, Step};

/// Errors raised by record steps
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A required field is absent or null
    #[error("field '{0}' is required")]
    MissingField(String),
}

/// Set `field` to a fixed value
pub fn set_field(field: impl Into<String>, value: impl Into<Value>) -> Step<DynInstance> {
    let field = field.into();
    let value = value.into();
    Step::named(format!("set:{}", field), move |instance: &mut DynInstance, _| {
        instance.set(field.clone(), value.clone());
        Ok(Flow::Continue)
    })
}

/// Copy the JSON argument at `index` into `field`.
///
/// Stops when there is no JSON argument at that position.
pub fn bind_field(field: impl Into<String>, index: usize) -> Step<DynInstance> {
    let field = field.into();
    Step::named(format!("bind:{}", field), move |instance: &mut DynInstance, args| {
        match args.get::<Value>(index) {
            Some(value) => {
                instance.set(field.clone(), value.clone());
                Ok(Flow::Continue)
            }
            None => Ok(Flow::Stop),
        }
    })
}

/// Fail with [`RecordError::MissingField`] unless `field` holds a non-null value
pub fn require_field(field: impl Into<String>) -> Step<DynInstance> {
    let field = field.into();
    Step::named(format!("require:{}", field), move |instance: &mut DynInstance, _| {
        match instance.get(&field) {
            Some(value) if !value.is_null() => Ok(Flow::Continue),
            _ => Err(RecordError::MissingField(field.clone()).into()),
        }
    })
}
