//! Runtime-shaped records and seeds
//!
//! Typed seeds settle their shape at compile time. Hosts that only learn the
//! shape of their instances at runtime (scripted handlers, JSON-defined
//! routes) use [`DynSeed`] instead: instances are JSON records, and the seed is
//! checked when the factory is built, so an unusable seed is reported as a
//! [`BuildError`] before any invocation runs.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::handler::error::{BuildError, BuildResult};
use crate::handler::factory::{InstanceFactory, IntoFactory};

pub mod steps;

pub use steps::{RecordError, bind_field, require_field, set_field};

/// Field map backing a dynamic instance
pub type Record = serde_json::Map<String, Value>;

/// A dynamic instance: a record held by value or behind a pointer
#[derive(Debug, Clone, PartialEq)]
pub enum DynInstance {
    /// Record held by value
    Record(Record),
    /// Record behind a heap pointer
    Pointer(Box<Record>),
}

impl DynInstance {
    /// Borrow the underlying record
    pub fn record(&self) -> &Record {
        match self {
            DynInstance::Record(record) => record,
            DynInstance::Pointer(record) => &**record,
        }
    }

    /// Mutably borrow the underlying record
    pub fn record_mut(&mut self) -> &mut Record {
        match self {
            DynInstance::Record(record) => record,
            DynInstance::Pointer(record) => &mut **record,
        }
    }

    /// Whether the record sits behind a pointer
    pub fn is_pointer(&self) -> bool {
        matches!(self, DynInstance::Pointer(_))
    }

    /// Read a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record().get(field)
    }

    /// Write a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.record_mut().insert(field.into(), value.into())
    }

    /// Same record, held by value
    pub fn into_value(self) -> Self {
        match self {
            DynInstance::Pointer(record) => DynInstance::Record(*record),
            record => record,
        }
    }

    /// Same record, held behind a pointer
    pub fn into_pointer(self) -> Self {
        match self {
            DynInstance::Record(record) => DynInstance::Pointer(Box::new(record)),
            pointer => pointer,
        }
    }
}

/// A seed value as supplied by the host
#[derive(Debug, Clone, PartialEq)]
pub enum DynValue {
    /// Plain JSON data
    Json(Value),
    /// A host value that cannot be inspected or copied
    Opaque {
        /// Host type name, for error reporting
        type_name: String,
    },
}

impl DynValue {
    /// Opaque host value
    pub fn opaque(type_name: impl Into<String>) -> Self {
        DynValue::Opaque {
            type_name: type_name.into(),
        }
    }
}

impl From<Value> for DynValue {
    fn from(value: Value) -> Self {
        DynValue::Json(value)
    }
}

/// Declared result shape of a constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynShape {
    /// A record by value
    Record,
    /// A pointer to something
    PointerTo(Box<DynShape>),
    /// The instance factory shape itself
    Factory,
    /// Any other named type (`int`, `string`, ...)
    Other(String),
}

impl fmt::Display for DynShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynShape::Record => write!(f, "record"),
            DynShape::PointerTo(inner) => write!(f, "*{}", inner),
            DynShape::Factory => write!(f, "factory"),
            DynShape::Other(name) => write!(f, "{}", name),
        }
    }
}

type ConstructFn = dyn Fn() -> DynInstance + Send + Sync;

/// A runtime-described constructor function
#[derive(Clone)]
pub struct DynConstructor {
    params: usize,
    returns: Vec<DynShape>,
    call: Arc<ConstructFn>,
}

impl DynConstructor {
    /// Describe a constructor by its parameter count and result shapes
    pub fn new<F>(params: usize, returns: Vec<DynShape>, call: F) -> Self
    where
        F: Fn() -> DynInstance + Send + Sync + 'static,
    {
        Self {
            params,
            returns,
            call: Arc::new(call),
        }
    }

    /// Zero-argument constructor returning a record by value
    pub fn returning_record<F>(call: F) -> Self
    where
        F: Fn() -> DynInstance + Send + Sync + 'static,
    {
        Self::new(0, vec![DynShape::Record], call)
    }

    /// Zero-argument constructor returning a pointer to a record
    pub fn returning_pointer<F>(call: F) -> Self
    where
        F: Fn() -> DynInstance + Send + Sync + 'static,
    {
        Self::new(0, vec![DynShape::PointerTo(Box::new(DynShape::Record))], call)
    }

    fn into_factory(self) -> BuildResult<InstanceFactory<DynInstance>> {
        if self.params != 0 {
            return Err(BuildError::ConstructorHasArguments { arity: self.params });
        }

        let shape = match self.returns.as_slice() {
            [] => return Err(BuildError::ConstructorVoid),
            [shape] => shape,
            many => {
                return Err(BuildError::ConstructorMultipleReturns { count: many.len() });
            }
        };

        let call = self.call;
        match shape {
            DynShape::Record => Ok(InstanceFactory::new(move || call().into_value())),
            DynShape::PointerTo(inner) if **inner == DynShape::Record => {
                Ok(InstanceFactory::new(move || call().into_pointer()))
            }
            DynShape::PointerTo(inner) => Err(BuildError::PointerToNonRecord {
                found: inner.to_string(),
            }),
            DynShape::Factory => Ok(InstanceFactory::new(move || call())),
            DynShape::Other(name) => Err(BuildError::InvalidConstructorType {
                found: name.clone(),
            }),
        }
    }
}

impl fmt::Debug for DynConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynConstructor")
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

/// Seed whose shape is only known at runtime
#[derive(Debug, Clone)]
pub enum DynSeed {
    /// Copy a record value per invocation
    Value(DynValue),
    /// Copy a pointed-to record into a new pointer per invocation
    Pointer(DynValue),
    /// Call a constructor per invocation
    Constructor(DynConstructor),
    /// Use a factory as-is
    Prebuilt(InstanceFactory<DynInstance>),
}

impl DynSeed {
    /// Seed from a JSON value held by value
    pub fn value(value: impl Into<DynValue>) -> Self {
        DynSeed::Value(value.into())
    }

    /// Seed from a JSON value held behind a pointer
    pub fn pointer(value: impl Into<DynValue>) -> Self {
        DynSeed::Pointer(value.into())
    }
}

impl IntoFactory<DynInstance> for DynSeed {
    fn into_factory(self) -> BuildResult<InstanceFactory<DynInstance>> {
        match self {
            DynSeed::Value(value) => {
                let record = exposed_record(value, false)?;
                Ok(InstanceFactory::new(move || {
                    DynInstance::Record(record.as_ref().clone())
                }))
            }
            DynSeed::Pointer(value) => {
                let record = exposed_record(value, true)?;
                Ok(InstanceFactory::new(move || {
                    DynInstance::Pointer(Box::new(record.as_ref().clone()))
                }))
            }
            DynSeed::Constructor(constructor) => constructor.into_factory(),
            DynSeed::Prebuilt(factory) => Ok(factory),
        }
    }
}

fn exposed_record(value: DynValue, behind_pointer: bool) -> BuildResult<Arc<Record>> {
    let json = match value {
        DynValue::Json(json) => json,
        DynValue::Opaque { type_name } => return Err(BuildError::NotExposable { type_name }),
    };

    match json {
        Value::Object(record) => Ok(Arc::new(record)),
        Value::Null => Err(BuildError::MissingSeed),
        other if behind_pointer => Err(BuildError::PointerToNonRecord {
            found: json_kind(&other).to_string(),
        }),
        other => Err(BuildError::InvalidConstructorType {
            found: json_kind(&other).to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "record",
    }
}
