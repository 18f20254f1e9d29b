//! Pipe tree traversal
//!
//! Walks a [`PipeGroup`] depth-first, left to right, for one invocation:
//! - a step error aborts the whole walk and is returned untouched
//! - a stop inside a sequence ends that sequence only
//! - a stop from a bare step or a nested group ends the enclosing group and
//!   propagates to its parent
//! - an empty nested group counts as a stop

use std::sync::Arc;

use super::args::Args;
use super::error::StepResult;
use super::step::{Flow, Step};
use super::tree::{PipeGroup, PipeNode};

/// How a node finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Carry on with the next sibling
    Proceed,
    /// Stop the enclosing group and propagate
    Stop,
}

/// Executes a shared pipe tree against caller-owned instances
pub struct Engine<I> {
    tree: Arc<PipeGroup<I>>,
    trace_steps: bool,
}

impl<I> Clone for Engine<I> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            trace_steps: self.trace_steps,
        }
    }
}

impl<I> Engine<I> {
    /// Create an engine over a pipe tree
    pub fn new(tree: PipeGroup<I>) -> Self {
        Self {
            tree: Arc::new(tree),
            trace_steps: false,
        }
    }

    /// Emit a trace event for every step that runs
    pub fn with_step_tracing(mut self, enabled: bool) -> Self {
        self.trace_steps = enabled;
        self
    }

    /// The tree this engine walks
    pub fn tree(&self) -> &PipeGroup<I> {
        &self.tree
    }

    /// Walk the whole tree for one invocation.
    ///
    /// Returns the first step error, or `Ok(())` when the walk completed or
    /// was stopped.
    pub fn run(&self, instance: &mut I, args: &Args) -> StepResult<()> {
        let outcome = self.run_group(&self.tree, instance, args)?;
        if outcome == Outcome::Stop {
            tracing::debug!("pipe tree stopped early");
        }
        Ok(())
    }

    fn run_node(&self, node: &PipeNode<I>, instance: &mut I, args: &Args) -> StepResult<Outcome> {
        match node {
            PipeNode::Step(step) => self.run_step(step, instance, args),
            PipeNode::Sequence(steps) => {
                self.run_sequence(steps, instance, args)?;
                Ok(Outcome::Proceed)
            }
            PipeNode::Group(group) if group.is_empty() => {
                tracing::debug!("empty group stopped its parent");
                Ok(Outcome::Stop)
            }
            PipeNode::Group(group) => self.run_group(group, instance, args),
        }
    }

    fn run_group(
        &self,
        group: &PipeGroup<I>,
        instance: &mut I,
        args: &Args,
    ) -> StepResult<Outcome> {
        for node in group.nodes() {
            if self.run_node(node, instance, args)? == Outcome::Stop {
                return Ok(Outcome::Stop);
            }
        }
        Ok(Outcome::Proceed)
    }

    // A stop inside a sequence is absorbed here.
    fn run_sequence(&self, steps: &[Step<I>], instance: &mut I, args: &Args) -> StepResult<()> {
        for (position, step) in steps.iter().enumerate() {
            if self.run_step(step, instance, args)? == Outcome::Stop {
                tracing::debug!(
                    step = step.name(),
                    position,
                    skipped = steps.len() - position - 1,
                    "sequence stopped"
                );
                break;
            }
        }
        Ok(())
    }

    fn run_step(&self, step: &Step<I>, instance: &mut I, args: &Args) -> StepResult<Outcome> {
        if self.trace_steps {
            tracing::trace!(step = step.name(), "running step");
        }

        let flow = step.call(instance, args).inspect_err(|err| {
            tracing::debug!(step = step.name(), error = %err, "step failed");
        })?;

        Ok(match flow {
            Flow::Continue => Outcome::Proceed,
            Flow::Replace(next) => {
                *instance = next;
                Outcome::Proceed
            }
            Flow::Stop => Outcome::Stop,
        })
    }
}
