//! Converters from the generic handler shape to host calling conventions
//!
//! The engine exposes one shape, [`GenericHandler`]: take the invocation
//! arguments, return the first step error. A host integration supplies a
//! [`Converter`] that wraps it into whatever its framework expects.
//!
//! ```
//! use pipehandle::handler::{Args, Converter, GenericHandler};
//!
//! struct Request(String);
//!
//! let to_host = Converter::new(|generic: GenericHandler| {
//!     move |request: Request| generic(Args::new().with(request))
//! });
//! # let _ = to_host;
//! ```

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::args::Args;
use super::error::StepResult;

/// Engine-side callable: run one invocation with the given arguments
pub type GenericHandler = Arc<dyn Fn(Args) -> StepResult<()> + Send + Sync>;

/// Async host callable produced by [`blocking_async`]
pub type AsyncHandler = Arc<dyn Fn(Args) -> BoxFuture<'static, StepResult<()>> + Send + Sync>;

type ConvertFn<H> = dyn Fn(GenericHandler) -> H + Send + Sync;

/// Adapter from [`GenericHandler`] to a host-specific handler type `H`
pub struct Converter<H> {
    convert: Arc<ConvertFn<H>>,
}

impl<H> Converter<H> {
    /// Wrap a conversion function
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(GenericHandler) -> H + Send + Sync + 'static,
    {
        Self {
            convert: Arc::new(convert),
        }
    }

    /// Produce the host handler around a generic one
    pub fn convert(&self, handler: GenericHandler) -> H {
        (self.convert)(handler)
    }
}

impl<H> Clone for Converter<H> {
    fn clone(&self) -> Self {
        Self {
            convert: self.convert.clone(),
        }
    }
}

/// Identity converter: the host calls the generic handler directly
pub fn generic() -> Converter<GenericHandler> {
    Converter::new(|handler| handler)
}

/// Converter for async hosts: each call runs the invocation on tokio's
/// blocking pool and resolves to its result.
///
/// A panicking step resumes the panic in the awaiting task.
pub fn blocking_async() -> Converter<AsyncHandler> {
    Converter::new(|handler: GenericHandler| -> AsyncHandler {
        Arc::new(move |args: Args| {
            let handler = handler.clone();
            async move {
                match tokio::task::spawn_blocking(move || handler(args)).await {
                    Ok(result) => result,
                    Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
                    Err(join) => Err(anyhow::Error::new(join).context("invocation cancelled")),
                }
            }
            .boxed()
        })
    })
}
