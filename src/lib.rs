//! pipehandle – per-request handlers built from declarative pipe trees
//!
//! This crate implements:
//! - Instance factories that hand every invocation its own fresh instance,
//!   built from a value, a boxed value, a constructor, or an existing factory
//! - Pipe trees of steps, sequences, and nested groups with well-defined
//!   stop and error propagation
//! - Converters that adapt the engine's generic handler to a host's calling
//!   convention
//! - Runtime-shaped JSON records for hosts that only know instance shapes at
//!   runtime

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Handler construction, pipe trees, and the traversal engine
pub mod handler;

/// Runtime-shaped records, seeds, and record steps
pub mod dynamic;

// Re-export key types for convenience
pub use handler::{
    Args, BuildError, Converter, Flow, GenericHandler, Handler, HandlerConfig, Seed, Step,
    StepError,
};
pub use handler::tree::PipeGroup;

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
