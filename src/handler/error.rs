//! Error types for handler construction and invocation
//!
//! Construction failures are a closed `thiserror` enum so callers can match on
//! the exact kind. Step failures stay opaque (`anyhow::Error`) and travel back
//! to the host untouched.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised by a step. Returned verbatim from the invocation; use
/// `downcast_ref` to recover the concrete error a step produced.
pub type StepError = anyhow::Error;

/// Convenience result alias for invocations.
pub type StepResult<T> = std::result::Result<T, StepError>;

/// Errors surfaced while constructing a handler or an instance factory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No pipe tree was supplied
    #[error("handler build: pipe group missing")]
    MissingPipes,

    /// No seed was supplied (or the seed was null)
    #[error("handler build: seed missing")]
    MissingSeed,

    /// No converter was supplied
    #[error("handler build: converter missing")]
    MissingConverter,

    /// Seed, or constructor result, points at something that is not a record
    #[error("handler build: pointer to non-record type ({found}) as constructor")]
    PointerToNonRecord {
        /// Shape that was found behind the pointer
        found: String,
    },

    /// Seed value cannot be inspected or copied
    #[error("handler build: value of type {type_name} is not exposable")]
    NotExposable {
        /// Name of the opaque type
        type_name: String,
    },

    /// Seed has a shape the factory does not accept
    #[error("handler build: invalid constructor type ({found})")]
    InvalidConstructorType {
        /// Shape that was found
        found: String,
    },

    /// Constructor function takes parameters
    #[error("handler build: constructor takes {arity} argument(s), expected none")]
    ConstructorHasArguments {
        /// Number of declared parameters
        arity: usize,
    },

    /// Constructor function returns nothing
    #[error("handler build: constructor does not return a value")]
    ConstructorVoid,

    /// Constructor function returns more than one value
    #[error("handler build: constructor returns {count} values, expected one")]
    ConstructorMultipleReturns {
        /// Number of declared results
        count: usize,
    },
}

/// Convenience result alias for construction
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Errors raised while reading invocation arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    /// No argument at the requested position
    #[error("argument {index} missing")]
    Missing {
        /// Requested position
        index: usize,
    },

    /// Argument exists but has another type
    #[error("argument {index} is not a {expected}")]
    TypeMismatch {
        /// Requested position
        index: usize,
        /// Type the caller asked for
        expected: &'static str,
    },
}

/// Handler configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file does not exist
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
