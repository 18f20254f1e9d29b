//! Instance factories
//!
//! Every invocation runs against its own instance. A [`Seed`] says how that
//! instance comes to be, and turns into an [`InstanceFactory`] that hands out
//! a brand-new, independent instance on every call:
//! - `from_value`: clone a prototype value
//! - `from_pointer`: clone a boxed prototype into a new box
//! - `from_factory`: call a zero-argument function each time
//! - `from_prebuilt`: use an existing factory verbatim

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use super::error::BuildResult;

type MakeFn<I> = dyn Fn() -> I + Send + Sync;

/// Produces a fresh instance per call
pub struct InstanceFactory<I> {
    make: Arc<MakeFn<I>>,
}

impl<I> InstanceFactory<I> {
    /// Wrap a producing function
    pub fn new<F>(make: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
    {
        Self {
            make: Arc::new(make),
        }
    }

    /// Produce a new instance
    pub fn produce(&self) -> I {
        (self.make)()
    }
}

impl<I> Clone for InstanceFactory<I> {
    fn clone(&self) -> Self {
        Self {
            make: self.make.clone(),
        }
    }
}

impl<I> fmt::Debug for InstanceFactory<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceFactory")
            .field("instance", &type_name::<I>())
            .finish()
    }
}

/// Read-only prototype plus the copy routine captured from its `Clone` impl
pub struct Prototype<I> {
    value: Arc<I>,
    copy: fn(&I) -> I,
}

impl<I: Clone> Prototype<I> {
    fn new(value: I) -> Self {
        Self {
            value: Arc::new(value),
            copy: I::clone,
        }
    }
}

/// How instances are constructed
pub enum Seed<I> {
    /// Copy a prototype value
    Value(Prototype<I>),
    /// Copy a boxed prototype into a new box (`I` is the box type)
    Pointer(Prototype<I>),
    /// Call a zero-argument function per invocation
    Factory(Arc<MakeFn<I>>),
    /// Use a factory as-is
    Prebuilt(InstanceFactory<I>),
}

impl<I: Clone> Seed<I> {
    /// Seed from a value; each invocation gets a clone
    pub fn from_value(value: I) -> Self {
        Seed::Value(Prototype::new(value))
    }
}

impl<T: Clone> Seed<Box<T>> {
    /// Seed from a boxed value; each invocation gets a new box holding a clone
    pub fn from_pointer(pointer: Box<T>) -> Self {
        Seed::Pointer(Prototype::new(pointer))
    }
}

impl<I> Seed<I> {
    /// Seed from a zero-argument function, called once per invocation
    pub fn from_factory<F>(make: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
    {
        Seed::Factory(Arc::new(make))
    }

    /// Seed from an existing factory
    pub fn from_prebuilt(factory: InstanceFactory<I>) -> Self {
        Seed::Prebuilt(factory)
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Seed::Value(_) => "value",
            Seed::Pointer(_) => "pointer",
            Seed::Factory(_) => "factory",
            Seed::Prebuilt(_) => "prebuilt",
        }
    }
}

impl<I> fmt::Debug for Seed<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("kind", &self.kind())
            .field("instance", &type_name::<I>())
            .finish()
    }
}

/// Anything that can be validated into an instance factory
pub trait IntoFactory<I> {
    /// Build the factory, or report why the seed is unusable
    fn into_factory(self) -> BuildResult<InstanceFactory<I>>;
}

impl<I: Send + Sync + 'static> IntoFactory<I> for Seed<I> {
    fn into_factory(self) -> BuildResult<InstanceFactory<I>> {
        Ok(match self {
            Seed::Value(prototype) | Seed::Pointer(prototype) => {
                let Prototype { value, copy } = prototype;
                InstanceFactory::new(move || copy(value.as_ref()))
            }
            Seed::Factory(make) => InstanceFactory { make },
            Seed::Prebuilt(factory) => factory,
        })
    }
}

impl<I> IntoFactory<I> for InstanceFactory<I> {
    fn into_factory(self) -> BuildResult<InstanceFactory<I>> {
        Ok(self)
    }
}

/// Turn a seed into a factory
pub fn build<I, S: IntoFactory<I>>(seed: S) -> BuildResult<InstanceFactory<I>> {
    seed.into_factory()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Form {
        title: String,
        tags: Vec<String>,
    }

    fn form() -> Form {
        Form {
            title: "draft".into(),
            tags: vec!["a".into()],
        }
    }

    #[test]
    fn test_value_seed_copies_every_time() {
        let factory = build(Seed::from_value(form())).unwrap();

        let mut first = factory.produce();
        first.tags.push("mutated".into());
        let second = factory.produce();

        assert_eq!(second, form());
        assert_ne!(first, second);
    }

    #[test]
    fn test_pointer_seed_allocates_new_boxes() {
        let factory = build(Seed::from_pointer(Box::new(form()))).unwrap();

        let first = factory.produce();
        let second = factory.produce();

        assert_eq!(*first, form());
        assert!(!std::ptr::eq(&*first, &*second));
    }

    #[test]
    fn test_function_seed_called_per_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory = build(Seed::from_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            form()
        }))
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        factory.produce();
        factory.produce();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_prebuilt_used_verbatim() {
        let prebuilt = InstanceFactory::new(|| 41_u32 + 1);
        let factory = build(Seed::from_prebuilt(prebuilt.clone())).unwrap();
        assert_eq!(factory.produce(), 42);
        assert!(Arc::ptr_eq(&factory.make, &prebuilt.make));

        let direct = build(prebuilt).unwrap();
        assert_eq!(direct.produce(), 42);
    }

    #[test]
    fn test_seed_kind_labels() {
        assert_eq!(Seed::from_value(1_u8).kind(), "value");
        assert_eq!(Seed::from_pointer(Box::new(1_u8)).kind(), "pointer");
        assert_eq!(Seed::from_factory(|| 1_u8).kind(), "factory");
    }
}
