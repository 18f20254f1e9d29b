//! Steps: the atomic unit of work in a pipe tree
//!
//! A step receives the invocation's instance and arguments and tells the
//! engine how to carry on: keep the instance, swap in a replacement, or stop.

use std::fmt;
use std::sync::Arc;

use super::args::Args;
use super::error::StepResult;

/// What a step asks the engine to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow<I> {
    /// Continue with the current instance (possibly mutated in place)
    Continue,

    /// Continue with a replacement instance
    Replace(I),

    /// Local stop: do not run the rest of the enclosing sequence or group.
    ///
    /// In-place mutations made before returning `Stop` are kept.
    Stop,
}

impl<I> Flow<I> {
    /// Whether this is a stop signal
    pub fn is_stop(&self) -> bool {
        matches!(self, Flow::Stop)
    }
}

type StepFn<I> = dyn Fn(&mut I, &Args) -> StepResult<Flow<I>> + Send + Sync;

/// A single pipe in the tree
pub struct Step<I> {
    name: Arc<str>,
    func: Arc<StepFn<I>>,
}

impl<I> Step<I> {
    /// Wrap a function as an anonymous step
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut I, &Args) -> StepResult<Flow<I>> + Send + Sync + 'static,
    {
        Self::named("step", func)
    }

    /// Wrap a function as a named step (the name shows up in traces)
    pub fn named<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&mut I, &Args) -> StepResult<Flow<I>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Step name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the step against an instance
    pub fn call(&self, instance: &mut I, args: &Args) -> StepResult<Flow<I>> {
        (self.func)(instance, args)
    }
}

impl<I> Clone for Step<I> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: self.func.clone(),
        }
    }
}

impl<I> fmt::Debug for Step<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Step").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_mutates_in_place() {
        let step = Step::named("incr", |n: &mut u32, _args: &Args| {
            *n += 1;
            Ok(Flow::Continue)
        });

        let mut value = 1;
        let flow = step.call(&mut value, &Args::new()).unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(value, 2);
        assert_eq!(step.name(), "incr");
    }

    #[test]
    fn test_step_clones_share_function() {
        let step: Step<u32> = Step::new(|_, _| Ok(Flow::Stop));
        let copy = step.clone();

        assert!(copy.call(&mut 0, &Args::new()).unwrap().is_stop());
        assert_eq!(format!("{:?}", copy), "Step(\"step\")");
    }
}
