//! The autowiring container
//!
//! The `Container` owns the binding registry and the singleton cache and
//! resolves keys into instances, recursively building constructor
//! dependencies from the type schema supplied by an [`Introspector`].

use crate::storage::{BindingRegistry, SingletonStorage};
use crate::{
    Args, Binding, Constructor, Dependencies, DiError, Injectable, Instance, Introspector, Result,
    TypeDescriptor, TypeRegistry,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Default limit on nested type resolutions
pub const DEFAULT_MAX_DEPTH: usize = 128;

thread_local! {
    /// Singleton slots being filled on this thread, tagged with the owning
    /// container's cache. Shared by every call on the thread, so a factory
    /// that calls back into its own container still sees them.
    static FILLING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a singleton slot as being filled until dropped.
struct FillGuard;

impl FillGuard {
    /// Fails with the chain of in-progress keys if `key` is already being
    /// filled on this thread. Filling it again would block on its own
    /// `OnceCell`.
    fn enter(owner: usize, key: &str) -> Result<Self> {
        FILLING.with(|filling| {
            let mut filling = filling.borrow_mut();
            if let Some(start) = filling.iter().position(|(o, k)| *o == owner && k == key) {
                let mut chain: Vec<String> = filling[start..]
                    .iter()
                    .filter(|(o, _)| *o == owner)
                    .map(|(_, k)| k.clone())
                    .collect();
                chain.push(key.to_string());
                return Err(DiError::CircularDependency { chain });
            }
            filling.push((owner, key.to_string()));
            Ok(FillGuard)
        })
    }
}

impl Drop for FillGuard {
    fn drop(&mut self) {
        FILLING.with(|filling| {
            filling.borrow_mut().pop();
        });
    }
}

/// Per-call bookkeeping: type names currently under construction,
/// outermost first.
#[derive(Default)]
struct Resolution {
    types: Vec<String>,
}

impl Resolution {
    fn chain_to(&self, name: &str) -> Vec<String> {
        let start = self.types.iter().position(|t| t == name).unwrap_or(0);
        let mut chain = self.types[start..].to_vec();
        chain.push(name.to_string());
        chain
    }
}

/// String-keyed autowiring container.
///
/// Cloning is cheap and yields a handle to the same bindings and singletons.
///
/// # Examples
///
/// ```rust
/// use dependency_autowire::{Constructor, Container, Parameter, TypeDescriptor, TypeRegistry};
///
/// struct FileLogger { path: String }
///
/// let types = TypeRegistry::new();
/// types.register(TypeDescriptor::interface("Logger"));
/// types.register(
///     TypeDescriptor::concrete("FileLogger").with_constructor(
///         Constructor::new(|deps| Ok(FileLogger { path: deps.cloned::<String>(0)? }))
///             .param(Parameter::primitive::<String>("path").with_default(String::from("app.log"))),
///     ),
/// );
///
/// let container = Container::new(types);
/// container.bind("Logger", "FileLogger");
///
/// let logger = container.get::<FileLogger>("Logger").unwrap();
/// assert_eq!(logger.path, "app.log");
/// ```
#[derive(Clone)]
pub struct Container {
    /// Key -> bindings, plus singleton flags
    registry: Arc<BindingRegistry>,
    /// Constructed singletons
    singletons: Arc<SingletonStorage>,
    /// Type schema
    types: Arc<dyn Introspector>,
    /// Nested resolution limit
    max_depth: usize,
}

impl Container {
    /// Create a container reading type schemas from `types`.
    #[inline]
    pub fn new(types: impl Introspector + 'static) -> Self {
        Self::builder().build(types)
    }

    /// Start configuring a container
    #[inline]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Bind a key to a factory, a prebuilt instance, or a type name.
    ///
    /// Binding a key again shadows the earlier binding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dependency_autowire::{Binding, Container, TypeRegistry};
    ///
    /// let container = Container::new(TypeRegistry::new());
    /// container.bind("Storage", "FileStorage");
    /// container.bind("config.port", Binding::instance(8080u16));
    /// container.bind("request.id", Binding::factory(|_| 42u64));
    ///
    /// assert_eq!(*container.get::<u16>("config.port").unwrap(), 8080);
    /// ```
    pub fn bind(&self, key: impl Into<String>, binding: impl Into<Binding>) {
        let key = key.into();
        let binding = binding.into();

        #[cfg(feature = "logging")]
        let kind = binding.kind();

        #[cfg(feature = "logging")]
        let shadowed = self.registry.is_bound(&key);

        let _depth = self.registry.bind(&key, binding);

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_autowire",
            key = key.as_str(),
            binding = kind,
            shadowed,
            history = _depth,
            "Registering binding"
        );
    }

    /// Bind a key and flag it as singleton.
    ///
    /// The first resolution is cached for the lifetime of the container.
    ///
    /// The flag applies to lookups of the key itself. When an interface is
    /// reached as a constructor dependency, a type-name binding is followed
    /// straight to the concrete type and builds a fresh instance each time,
    /// while a factory or instance binding goes through the key and so shares
    /// the cached value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dependency_autowire::{Binding, Container, Instance, TypeRegistry};
    ///
    /// #[derive(Default)]
    /// struct Cache;
    ///
    /// let container = Container::new(TypeRegistry::new());
    /// container.singleton("Cache", Binding::factory(|_| Cache));
    ///
    /// let a = container.make("Cache", &Default::default()).unwrap();
    /// let b = container.make("Cache", &Default::default()).unwrap();
    /// assert!(Instance::ptr_eq(&a, &b));
    /// ```
    pub fn singleton(&self, key: impl Into<String>, binding: impl Into<Binding>) {
        let key = key.into();
        self.bind(key.as_str(), binding);
        self.registry.mark_singleton(&key);

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_autowire",
            key = key.as_str(),
            "Flagged binding as singleton"
        );
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve a key.
    ///
    /// Unbound keys are treated as type names. Singleton keys go through the
    /// singleton cache. Otherwise the latest binding decides: factories are
    /// invoked with `args`, instances are returned as-is, and aliases are
    /// autowired.
    pub fn make(&self, key: &str, args: &Args) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_autowire",
            key,
            args = args.len(),
            "Making key"
        );

        let result = self.make_in(key, args, &mut Resolution::default());
        self.log_failure(key, &result);
        result
    }

    /// Resolve a key through the singleton cache.
    ///
    /// The key does not need to be flagged: an unbound key is autowired as a
    /// type name and cached under itself, and a bound key caches whatever
    /// its latest binding produces.
    pub fn make_singleton(&self, key: &str, args: &Args) -> Result<Instance> {
        let result = self.make_singleton_in(key, args, &mut Resolution::default());
        self.log_failure(key, &result);
        result
    }

    /// Autowire a type by name, bypassing its own binding.
    ///
    /// With `as_singleton`, the instance is cached under the singleton key
    /// bound to this type name (if there is one) or under the type name, and
    /// an already-cached instance is returned instead of building a new one.
    pub fn resolve(&self, type_name: &str, as_singleton: bool) -> Result<Instance> {
        let mut resolution = Resolution::default();

        let result = if as_singleton {
            let key = self
                .registry
                .singleton_key_for(type_name)
                .unwrap_or_else(|| type_name.to_string());

            #[cfg(feature = "logging")]
            trace!(
                target: "dependency_autowire",
                type_name,
                cache_key = key.as_str(),
                "Resolving type as singleton"
            );

            if let Some(cached) = self.singletons.get(&key) {
                return Ok(cached);
            }

            FillGuard::enter(self.cache_id(), &key).and_then(|_guard| {
                self.singletons
                    .get_or_try_init(&key, || self.resolve_type(type_name, &mut resolution))
            })
        } else {
            self.resolve_type(type_name, &mut resolution)
        };

        self.log_failure(type_name, &result);
        result
    }

    /// Resolve a key with no arguments and downcast it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dependency_autowire::{Binding, Container, TypeRegistry};
    ///
    /// let container = Container::new(TypeRegistry::new());
    /// container.bind("greeting", Binding::instance(String::from("hi")));
    ///
    /// assert_eq!(container.get::<String>("greeting").unwrap().as_str(), "hi");
    /// assert!(container.get::<u32>("greeting").is_err());
    /// ```
    #[inline]
    pub fn get<T: Injectable>(&self, key: &str) -> Result<Arc<T>> {
        self.make(key, &Args::new())?.downcast::<T>()
    }

    /// Like `get`, returning `None` on any failure
    #[inline]
    pub fn try_get<T: Injectable>(&self, key: &str) -> Option<Arc<T>> {
        self.get::<T>(key).ok()
    }

    /// Resolve a key with no arguments as a trait object.
    #[inline]
    pub fn get_view<V: ?Sized + Send + Sync + 'static>(&self, key: &str) -> Result<Arc<V>> {
        self.make(key, &Args::new())?.view::<V>()
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Sorted snapshot of every key's binding history (latest last)
    #[inline]
    pub fn bindings(&self) -> BTreeMap<String, Vec<Binding>> {
        self.registry.snapshot()
    }

    /// Every binding registered for `key`, oldest first
    #[inline]
    pub fn history(&self, key: &str) -> Vec<Binding> {
        self.registry.history(key)
    }

    #[inline]
    pub fn is_bound(&self, key: &str) -> bool {
        self.registry.is_bound(key)
    }

    #[inline]
    pub fn is_singleton(&self, key: &str) -> bool {
        self.registry.is_singleton(key)
    }

    /// Check if a singleton has been constructed for `key`
    #[inline]
    pub fn is_cached(&self, key: &str) -> bool {
        self.singletons.contains(key)
    }

    /// Keys with a constructed singleton, sorted
    #[inline]
    pub fn cached_keys(&self) -> Vec<String> {
        self.singletons.keys()
    }

    /// Number of bound keys
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// The type schema this container reads
    #[inline]
    pub fn types(&self) -> &dyn Introspector {
        &*self.types
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    // =========================================================================
    // Resolver internals
    // =========================================================================

    fn make_in(&self, key: &str, args: &Args, res: &mut Resolution) -> Result<Instance> {
        let Some(binding) = self.registry.latest(key) else {
            return self.resolve_type(key, res);
        };

        if self.registry.is_singleton(key) {
            return self.make_singleton_in(key, args, res);
        }

        self.produce(binding, args, res)
    }

    fn make_singleton_in(&self, key: &str, args: &Args, res: &mut Resolution) -> Result<Instance> {
        if let Some(cached) = self.singletons.get(key) {
            #[cfg(feature = "logging")]
            trace!(
                target: "dependency_autowire",
                key,
                "Singleton resolved from cache"
            );
            return Ok(cached);
        }

        let _guard = FillGuard::enter(self.cache_id(), key)?;
        self.singletons.get_or_try_init(key, || {
            #[cfg(feature = "logging")]
            debug!(
                target: "dependency_autowire",
                key,
                "Singleton initializing on first access"
            );

            match self.registry.latest(key) {
                Some(binding) => self.produce(binding, args, res),
                None => self.resolve_type(key, res),
            }
        })
    }

    /// Identity of the singleton cache shared by this container's clones
    #[inline]
    fn cache_id(&self) -> usize {
        Arc::as_ptr(&self.singletons) as usize
    }

    fn produce(&self, binding: Binding, args: &Args, res: &mut Resolution) -> Result<Instance> {
        match binding {
            Binding::Factory(factory) => factory.create(args),
            Binding::Instance(instance) => Ok(instance),
            Binding::Alias(target) => self.resolve_type(&target, res),
        }
    }

    /// Cycle and depth guard around `build_type`
    fn resolve_type(&self, type_name: &str, res: &mut Resolution) -> Result<Instance> {
        if res.types.iter().any(|t| t == type_name) {
            return Err(DiError::CircularDependency {
                chain: res.chain_to(type_name),
            });
        }

        if res.types.len() >= self.max_depth {
            return Err(DiError::DepthExceeded {
                type_name: type_name.to_string(),
                limit: self.max_depth,
            });
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_autowire",
            type_name,
            depth = res.types.len(),
            "Resolving type"
        );

        res.types.push(type_name.to_string());
        let result = self.build_type(type_name, res);
        res.types.pop();
        result
    }

    fn build_type(&self, type_name: &str, res: &mut Resolution) -> Result<Instance> {
        let Some(descriptor) = self.types.describe(type_name) else {
            // Names the schema does not know can still be satisfied by a binding
            if self.registry.is_bound(type_name) {
                return self.make_in(type_name, &Args::new(), res);
            }
            return Err(DiError::unknown_type(type_name));
        };

        if descriptor.is_abstract() && !descriptor.is_interface() {
            return Err(DiError::abstract_instantiation(type_name, "type is abstract"));
        }

        if descriptor.is_interface() {
            return match self.registry.latest(type_name) {
                None => Err(DiError::abstract_instantiation(
                    type_name,
                    "interface is not bound",
                )),
                Some(Binding::Alias(target)) => {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: "dependency_autowire",
                        interface = type_name,
                        concrete = target.as_str(),
                        "Substituting bound type for interface"
                    );
                    self.resolve_type(&target, res)
                }
                Some(_) => self.make_in(type_name, &Args::new(), res),
            };
        }

        let instance = match descriptor.constructor() {
            Some(constructor) => self.construct(&descriptor, constructor, res)?,
            None => {
                let Some((_method, accessor)) = descriptor.factory_method() else {
                    return Err(DiError::non_instantiable(type_name));
                };

                #[cfg(feature = "logging")]
                trace!(
                    target: "dependency_autowire",
                    type_name,
                    method = _method,
                    "Type has no constructor, using static method"
                );

                self.construct(&descriptor, accessor, res)?
            }
        };

        Ok(descriptor.apply_views(instance))
    }

    /// Resolve every parameter, then invoke the constructor
    fn construct(
        &self,
        descriptor: &TypeDescriptor,
        constructor: &Constructor,
        res: &mut Resolution,
    ) -> Result<Instance> {
        let mut values = Vec::with_capacity(constructor.params().len());

        for param in constructor.params() {
            let value = match param.dependency_type() {
                Some(dependency) => self.resolve_type(dependency, res)?,
                None => param
                    .default_value()
                    .cloned()
                    .ok_or_else(|| DiError::unresolvable(descriptor.name(), param.name()))?,
            };
            values.push((param.name().to_string(), value));
        }

        constructor.invoke(&Dependencies::new(descriptor.name(), values))
    }

    #[inline]
    fn log_failure(&self, _key: &str, _result: &Result<Instance>) {
        #[cfg(feature = "logging")]
        {
            if let Err(err) = _result {
                debug!(
                    target: "dependency_autowire",
                    key = _key,
                    kind = err.kind(),
                    error = %err,
                    "Resolution failed"
                );
            }
        }
    }
}

/// Runtime configuration for a [`Container`].
///
/// # Examples
///
/// ```rust
/// use dependency_autowire::{Container, TypeRegistry};
///
/// let container = Container::builder()
///     .capacity(64)
///     .max_depth(32)
///     .build(TypeRegistry::new());
///
/// assert_eq!(container.max_depth(), 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerBuilder {
    capacity: usize,
    max_depth: usize,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            capacity: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Expected number of bindings; pre-sizes the registry and cache
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Maximum nesting of type resolutions before failing
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(self, types: impl Introspector + 'static) -> Container {
        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_autowire",
            capacity = self.capacity,
            max_depth = self.max_depth,
            "Creating new autowiring container"
        );

        Container {
            registry: Arc::new(BindingRegistry::with_capacity(self.capacity)),
            singletons: Arc::new(SingletonStorage::with_capacity(self.capacity)),
            types: Arc::new(types),
            max_depth: self.max_depth,
        }
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(TypeRegistry::new())
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.len())
            .field("singletons", &self.singletons.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
