//! Binding descriptors
//!
//! A [`Binding`] is what a key maps to in the registry: a factory invoked
//! with the caller's [`Args`], a prebuilt [`Instance`] handed back as-is, or
//! an alias naming the type to autowire instead.

use crate::{Args, Injectable, Instance, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Type-erased factory function
type FactoryFn = Arc<dyn Fn(&Args) -> Result<Instance> + Send + Sync>;

/// A factory invoked on every resolution of its key (unless the key is a
/// singleton, in which case it runs once).
#[derive(Clone)]
pub struct Factory {
    create: FactoryFn,
    /// Type name for logging
    type_name: &'static str,
}

impl Factory {
    /// Wrap an infallible factory
    #[inline]
    pub fn new<T: Injectable, F>(factory: F) -> Self
    where
        F: Fn(&Args) -> T + Send + Sync + 'static,
    {
        Self {
            create: Arc::new(move |args: &Args| Ok(Instance::new(factory(args)))),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap a factory that can fail
    #[inline]
    pub fn fallible<T: Injectable, F>(factory: F) -> Self
    where
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            create: Arc::new(move |args: &Args| factory(args).map(Instance::new)),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an infallible factory whose products are also exposed as `Arc<V>`
    #[inline]
    pub fn viewed<T: Injectable, V, F>(factory: F, cast: fn(Arc<T>) -> Arc<V>) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&Args) -> T + Send + Sync + 'static,
    {
        Self {
            create: Arc::new(move |args: &Args| {
                let value = Arc::new(factory(args));
                Ok(Instance::from_arc(Arc::clone(&value)).with_view::<V>(cast(value)))
            }),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap a factory that already produces erased instances
    #[inline]
    pub fn erased<F>(factory: F) -> Self
    where
        F: Fn(&Args) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            create: Arc::new(factory),
            type_name: std::any::type_name::<Instance>(),
        }
    }

    /// Run the factory
    #[inline]
    pub fn create(&self, args: &Args) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_autowire",
            produces = self.type_name,
            args = args.len(),
            "Invoking factory"
        );

        (self.create)(args)
    }

    /// Name of the type the factory produces
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// How a key is resolved.
///
/// `&str` and `String` convert into [`Binding::Alias`], so the common
/// "interface name to concrete type name" binding reads naturally:
///
/// ```rust
/// use dependency_autowire::Binding;
///
/// let binding: Binding = "FileLogger".into();
/// assert_eq!(binding.alias_target(), Some("FileLogger"));
/// ```
#[derive(Clone)]
pub enum Binding {
    /// Invoked with the caller's arguments
    Factory(Factory),
    /// Returned unchanged
    Instance(Instance),
    /// Resolved as a type name
    Alias(String),
}

impl Binding {
    /// Bind an infallible factory
    #[inline]
    pub fn factory<T: Injectable, F>(factory: F) -> Self
    where
        F: Fn(&Args) -> T + Send + Sync + 'static,
    {
        Binding::Factory(Factory::new(factory))
    }

    /// Bind a fallible factory
    #[inline]
    pub fn try_factory<T: Injectable, F>(factory: F) -> Self
    where
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        Binding::Factory(Factory::fallible(factory))
    }

    /// Bind a factory for an interface key, so dependents can take the
    /// product as `Arc<dyn Trait>`.
    ///
    /// ```rust
    /// use dependency_autowire::{Args, Binding};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync {}
    /// struct SystemClock;
    /// impl Clock for SystemClock {}
    ///
    /// let Binding::Factory(factory) =
    ///     Binding::factory_as(|_| SystemClock, |c: Arc<SystemClock>| c as Arc<dyn Clock>)
    /// else {
    ///     unreachable!()
    /// };
    /// assert!(factory.create(&Args::new()).unwrap().view::<dyn Clock>().is_ok());
    /// ```
    #[inline]
    pub fn factory_as<T: Injectable, V, F>(factory: F, cast: fn(Arc<T>) -> Arc<V>) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&Args) -> T + Send + Sync + 'static,
    {
        Binding::Factory(Factory::viewed(factory, cast))
    }

    /// Bind a prebuilt value
    #[inline]
    pub fn instance<T: Injectable>(value: T) -> Self {
        Binding::Instance(Instance::new(value))
    }

    /// Bind to another type name
    #[inline]
    pub fn alias(target: impl Into<String>) -> Self {
        Binding::Alias(target.into())
    }

    /// Alias target, if this is an alias
    #[inline]
    pub fn alias_target(&self) -> Option<&str> {
        match self {
            Binding::Alias(target) => Some(target.as_str()),
            _ => None,
        }
    }

    /// Short name of the variant, used in log fields
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Binding::Factory(_) => "factory",
            Binding::Instance(_) => "instance",
            Binding::Alias(_) => "alias",
        }
    }
}

impl From<&str> for Binding {
    fn from(target: &str) -> Self {
        Binding::Alias(target.to_string())
    }
}

impl From<String> for Binding {
    fn from(target: String) -> Self {
        Binding::Alias(target)
    }
}

impl From<Instance> for Binding {
    fn from(instance: Instance) -> Self {
        Binding::Instance(instance)
    }
}

impl From<Factory> for Binding {
    fn from(factory: Factory) -> Self {
        Binding::Factory(factory)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Factory(factory) => f.debug_tuple("Factory").field(factory).finish(),
            Binding::Instance(instance) => f.debug_tuple("Instance").field(instance).finish(),
            Binding::Alias(target) => f.debug_tuple("Alias").field(target).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Clone)]
    struct TestService {
        id: u32,
    }

    #[test]
    fn test_factory_runs_every_time() {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let factory = Factory::new(|_| TestService {
            id: COUNTER.fetch_add(1, Ordering::SeqCst),
        });

        let a = factory.create(&Args::new()).unwrap();
        let b = factory.create(&Args::new()).unwrap();

        assert_eq!(a.downcast::<TestService>().unwrap().id, 0);
        assert_eq!(b.downcast::<TestService>().unwrap().id, 1);
        assert!(!Instance::ptr_eq(&a, &b));
    }

    #[test]
    fn test_factory_reads_args() {
        let factory = Factory::new(|args: &Args| TestService {
            id: args.get::<u32>(0).map(|v| *v).unwrap_or_default(),
        });

        let made = factory.create(&Args::new().with(7u32)).unwrap();
        assert_eq!(made.downcast::<TestService>().unwrap().id, 7);
        assert!(factory.type_name().ends_with("TestService"));
    }

    #[test]
    fn test_fallible_factory() {
        let factory = Factory::fallible(|args: &Args| {
            args.get::<u32>(0)
                .map(|id| TestService { id: *id })
                .ok_or_else(|| DiError::creation_failed("TestService", "missing id"))
        });

        assert!(factory.create(&Args::new().with(1u32)).is_ok());
        assert_eq!(
            factory.create(&Args::new()).unwrap_err(),
            DiError::creation_failed("TestService", "missing id")
        );
    }

    #[test]
    fn test_viewed_factory_exposes_trait_object() {
        trait Named: Send + Sync {
            fn id(&self) -> u32;
        }

        impl Named for TestService {
            fn id(&self) -> u32 {
                self.id
            }
        }

        let factory = Factory::viewed(
            |_| TestService { id: 5 },
            |s: Arc<TestService>| s as Arc<dyn Named>,
        );

        let made = factory.create(&Args::new()).unwrap();
        assert_eq!(made.view::<dyn Named>().unwrap().id(), 5);
        assert_eq!(made.downcast::<TestService>().unwrap().id, 5);
    }

    #[test]
    fn test_binding_conversions() {
        let alias: Binding = "Concrete".into();
        assert_eq!(alias.kind(), "alias");
        assert_eq!(alias.alias_target(), Some("Concrete"));

        let owned: Binding = String::from("Concrete").into();
        assert_eq!(owned.alias_target(), Some("Concrete"));

        let instance = Binding::instance(TestService { id: 1 });
        assert_eq!(instance.kind(), "instance");
        assert!(instance.alias_target().is_none());

        let factory = Binding::factory(|_| TestService { id: 2 });
        assert_eq!(factory.kind(), "factory");
    }
}
