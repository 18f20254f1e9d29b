//! Handler construction and public API
//!
//! A [`Handler`] ties together a pipe tree, an instance factory and a
//! converter. Every call of the produced host handler builds a fresh instance,
//! walks the tree against it, and reports the first step error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Submodules
pub mod args;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod factory;
pub mod step;
pub mod tree;

use engine::Engine;
use error::{BuildResult, StepResult};
use factory::IntoFactory;
use tree::PipeGroup;

/// Configuration for a handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Name used in invocation spans
    pub name: String,

    /// Emit a trace event for every step that runs
    pub trace_steps: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            name: "handler".to_string(),
            trace_steps: false,
        }
    }
}

/// A constructed handler
///
/// Immutable once built; safe to share across threads and invoke concurrently.
pub struct Handler<I, H> {
    engine: Engine<I>,
    factory: InstanceFactory<I>,
    converter: Converter<H>,
    config: HandlerConfig,
}

impl<I: 'static, H> Handler<I, H> {
    /// Start building a handler
    pub fn builder() -> HandlerBuilder<I, H> {
        HandlerBuilder::new()
    }

    /// Build a handler from a pipe tree, a seed and a converter with the
    /// default configuration
    pub fn new(
        pipes: PipeGroup<I>,
        seed: impl IntoFactory<I>,
        converter: Converter<H>,
    ) -> BuildResult<Self> {
        Self::builder()
            .pipes(pipes)
            .seed(seed)
            .converter(converter)
            .build()
    }

    /// Get the configuration
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Get the pipe tree
    pub fn pipes(&self) -> &PipeGroup<I> {
        self.engine.tree()
    }

    /// Run one invocation directly, bypassing the converter
    pub fn invoke(&self, args: Args) -> StepResult<()> {
        run_invocation(&self.engine, &self.factory, &self.config.name, args)
    }

    /// The engine-side callable handed to the converter
    pub fn generic(&self) -> GenericHandler {
        let engine = self.engine.clone();
        let factory = self.factory.clone();
        let name: Arc<str> = self.config.name.as_str().into();

        Arc::new(move |args: Args| run_invocation(&engine, &factory, &name, args))
    }

    /// Produce the host-specific handler
    pub fn produce(&self) -> H {
        self.converter.convert(self.generic())
    }
}

fn run_invocation<I>(
    engine: &Engine<I>,
    factory: &InstanceFactory<I>,
    name: &str,
    args: Args,
) -> StepResult<()> {
    let id = Uuid::new_v4();
    let span = tracing::debug_span!("invocation", handler = name, %id);
    let _enter = span.enter();

    let mut instance = factory.produce();
    engine.run(&mut instance, &args)
}

/// Step-by-step handler construction
///
/// `build` checks for a missing tree, seed and converter in that order, then
/// reports any seed validation error.
pub struct HandlerBuilder<I, H> {
    pipes: Option<PipeGroup<I>>,
    factory: Option<BuildResult<InstanceFactory<I>>>,
    converter: Option<Converter<H>>,
    config: HandlerConfig,
}

impl<I, H> Default for HandlerBuilder<I, H> {
    fn default() -> Self {
        Self {
            pipes: None,
            factory: None,
            converter: None,
            config: HandlerConfig::default(),
        }
    }
}

impl<I: 'static, H> HandlerBuilder<I, H> {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pipe tree
    pub fn pipes(mut self, pipes: PipeGroup<I>) -> Self {
        self.pipes = Some(pipes);
        self
    }

    /// Set the seed instances are constructed from
    pub fn seed(mut self, seed: impl IntoFactory<I>) -> Self {
        self.factory = Some(seed.into_factory());
        self
    }

    /// Set the host converter
    pub fn converter(mut self, converter: Converter<H>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Set the configuration
    pub fn config(mut self, config: HandlerConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and assemble the handler
    pub fn build(self) -> BuildResult<Handler<I, H>> {
        let pipes = self.pipes.ok_or(BuildError::MissingPipes)?;
        let factory = self.factory.ok_or(BuildError::MissingSeed)?;
        let converter = self.converter.ok_or(BuildError::MissingConverter)?;
        let factory = factory.inspect_err(|err| {
            tracing::debug!(handler = %self.config.name, error = %err, "seed rejected");
        })?;

        tracing::debug!(
            handler = %self.config.name,
            steps = pipes.step_count(),
            depth = pipes.depth(),
            "handler built"
        );

        let engine = Engine::new(pipes).with_step_tracing(self.config.trace_steps);

        Ok(Handler {
            engine,
            factory,
            converter,
            config: self.config,
        })
    }
}

// Re-export commonly used types
pub use args::Args;
pub use converter::{AsyncHandler, Converter, GenericHandler};
pub use error::{ArgError, BuildError, ConfigError, StepError};
pub use factory::{InstanceFactory, Seed};
pub use step::{Flow, Step};
pub use tree::PipeNode;
