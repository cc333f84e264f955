//! Type introspection
//!
//! Rust has no runtime reflection, so the resolver works from an explicit
//! schema: every type it can build is described by a [`TypeDescriptor`]
//! (kind, constructor parameters, static factory methods, trait views).
//! The resolver only sees the [`Introspector`] trait; [`TypeRegistry`] is the
//! in-memory implementation filled at registration time, by hand or through
//! `#[derive(Autowire)]`.

use crate::{Autowire, Dependencies, Injectable, Instance, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// Static method names tried, in order, for types without a constructor.
pub const FACTORY_METHODS: [&str; 2] = ["init", "get_instance"];

/// Source of structural facts about named types.
pub trait Introspector: Send + Sync {
    /// Describe `type_name`, or `None` if it is unknown
    fn describe(&self, type_name: &str) -> Option<Arc<TypeDescriptor>>;
}

/// What sort of type a descriptor names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Can be built if it has a constructor
    Concrete,
    /// Never built directly
    Abstract,
    /// Built through whatever is bound to its name
    Interface,
}

// =============================================================================
// Parameters
// =============================================================================

/// One constructor or static-method parameter.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    type_name: Option<String>,
    builtin: bool,
    default: Option<Instance>,
}

impl Parameter {
    /// A parameter whose declared type is another resolvable type
    pub fn dependency(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            builtin: false,
            default: None,
        }
    }

    /// A parameter of a builtin type, filled from its default
    pub fn primitive<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(std::any::type_name::<T>().to_string()),
            builtin: true,
            default: None,
        }
    }

    /// A parameter with no declared type
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            builtin: false,
            default: None,
        }
    }

    /// Declare a default value
    pub fn with_default<T: Injectable>(self, value: T) -> Self {
        self.with_default_instance(Instance::new(value))
    }

    /// Declare an already-erased default value
    pub fn with_default_instance(mut self, value: Instance) -> Self {
        self.default = Some(value);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    #[inline]
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    #[inline]
    pub fn default_value(&self) -> Option<&Instance> {
        self.default.as_ref()
    }

    /// The type to resolve recursively, if this parameter names one
    #[inline]
    pub fn dependency_type(&self) -> Option<&str> {
        match &self.type_name {
            Some(name) if !self.builtin => Some(name.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("builtin", &self.builtin)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

// =============================================================================
// Constructors
// =============================================================================

type BuildFn = Arc<dyn Fn(&Dependencies) -> Result<Instance> + Send + Sync>;

/// A construction path: constructor or static factory method.
///
/// # Examples
///
/// ```rust
/// use dependency_autowire::{Constructor, Parameter};
///
/// struct Pool { size: usize }
///
/// let ctor = Constructor::new(|deps| Ok(Pool { size: deps.cloned::<usize>(0)? }))
///     .param(Parameter::primitive::<usize>("size").with_default(8usize));
///
/// assert_eq!(ctor.params().len(), 1);
/// ```
#[derive(Clone)]
pub struct Constructor {
    params: Vec<Parameter>,
    build: BuildFn,
}

impl Constructor {
    /// Construct from a function producing a fresh `T`
    pub fn new<T: Injectable, F>(build: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            build: Arc::new(move |deps: &Dependencies| build(deps).map(Instance::new)),
        }
    }

    /// Construct from a function producing an erased instance.
    ///
    /// Use this for accessors such as `get_instance` that hand back a
    /// shared `Arc` instead of a fresh value.
    pub fn erased<F>(build: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            build: Arc::new(build),
        }
    }

    /// Append a parameter
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    #[inline]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    #[inline]
    pub(crate) fn invoke(&self, deps: &Dependencies) -> Result<Instance> {
        (self.build)(deps)
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Type Descriptors
// =============================================================================

type ViewFn = Arc<dyn Fn(Instance) -> Instance + Send + Sync>;

/// Structural description of a named type.
///
/// # Examples
///
/// ```rust
/// use dependency_autowire::{Constructor, TypeDescriptor, TypeKind};
/// use std::sync::Arc;
///
/// trait Storage: Send + Sync {}
/// struct MemoryStorage;
/// impl Storage for MemoryStorage {}
///
/// let storage = TypeDescriptor::interface("Storage");
/// let memory = TypeDescriptor::concrete("MemoryStorage")
///     .with_constructor(Constructor::new(|_| Ok(MemoryStorage)))
///     .implements(|s: Arc<MemoryStorage>| s as Arc<dyn Storage>);
///
/// assert_eq!(storage.kind(), TypeKind::Interface);
/// assert!(memory.is_instantiable());
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    constructor: Option<Constructor>,
    static_methods: Vec<(String, Constructor)>,
    views: Vec<ViewFn>,
}

impl TypeDescriptor {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            constructor: None,
            static_methods: Vec::new(),
            views: Vec::new(),
        }
    }

    /// A concrete type. Without a constructor it is not instantiable.
    pub fn concrete(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Concrete)
    }

    /// An abstract type
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Abstract)
    }

    /// An interface, resolved through its binding
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    /// Set the public constructor
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Add a static method. A later method with the same name replaces it.
    pub fn with_static_method(mut self, name: impl Into<String>, method: Constructor) -> Self {
        let name = name.into();
        self.static_methods.retain(|(n, _)| *n != name);
        self.static_methods.push((name, method));
        self
    }

    /// Attach a trait-object view to every instance built from this descriptor
    pub fn implements<T, V>(mut self, cast: fn(Arc<T>) -> Arc<V>) -> Self
    where
        T: Injectable,
        V: ?Sized + Send + Sync + 'static,
    {
        self.views.push(Arc::new(move |instance: Instance| {
            match instance.try_downcast::<T>() {
                Some(value) => instance.with_view::<V>(cast(value)),
                None => instance,
            }
        }));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Interfaces count as abstract too
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.kind != TypeKind::Concrete
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    #[inline]
    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Concrete && self.constructor.is_some()
    }

    #[inline]
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub fn static_method(&self, name: &str) -> Option<&Constructor> {
        self.static_methods
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    pub fn static_method_names(&self) -> Vec<&str> {
        self.static_methods.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// The static method used when there is no constructor: `init` first,
    /// then `get_instance`.
    pub fn factory_method(&self) -> Option<(&'static str, &Constructor)> {
        FACTORY_METHODS
            .iter()
            .find_map(|name| self.static_method(name).map(|m| (*name, m)))
    }

    pub(crate) fn apply_views(&self, instance: Instance) -> Instance {
        self.views.iter().fold(instance, |inst, view| view(inst))
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("constructor", &self.constructor)
            .field("static_methods", &self.static_method_names())
            .field("views", &self.views.len())
            .finish()
    }
}

// =============================================================================
// Type Registry
// =============================================================================

/// Thread-safe table of type descriptors.
///
/// Cloning yields another handle to the same table, so a registry can be
/// handed to a `Container` and still be filled afterwards.
#[derive(Clone)]
pub struct TypeRegistry {
    types: Arc<DashMap<String, Arc<TypeDescriptor>, RandomState>>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            types: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    /// Register a descriptor, returning the one it replaced
    pub fn register(&self, descriptor: TypeDescriptor) -> Option<Arc<TypeDescriptor>> {
        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_autowire",
            type_name = descriptor.name(),
            kind = ?descriptor.kind(),
            instantiable = descriptor.is_instantiable(),
            "Registering type descriptor"
        );

        self.types
            .insert(descriptor.name().to_string(), Arc::new(descriptor))
    }

    /// Register a type through its `Autowire` implementation
    pub fn register_type<T: Autowire>(&self) -> Option<Arc<TypeDescriptor>> {
        self.register(T::descriptor())
    }

    #[inline]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All registered type names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }
}

impl Introspector for TypeRegistry {
    #[inline]
    fn describe(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(type_name).map(|d| Arc::clone(d.value()))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock;

    #[test]
    fn test_parameter_classification() {
        let dep = Parameter::dependency("db", "Database");
        assert_eq!(dep.dependency_type(), Some("Database"));

        let prim = Parameter::primitive::<u32>("port").with_default(80u32);
        assert_eq!(prim.dependency_type(), None);
        assert!(prim.is_builtin());
        assert_eq!(prim.type_name(), Some("u32"));
        assert!(prim.default_value().is_some());

        let untyped = Parameter::untyped("anything");
        assert_eq!(untyped.dependency_type(), None);
        assert!(untyped.default_value().is_none());
    }

    #[test]
    fn test_descriptor_kinds() {
        let concrete = TypeDescriptor::concrete("Clock");
        assert!(!concrete.is_instantiable());
        assert!(!concrete.is_abstract());

        let concrete = concrete.with_constructor(Constructor::new(|_| Ok(Clock)));
        assert!(concrete.is_instantiable());

        let base = TypeDescriptor::abstract_type("Base");
        assert!(base.is_abstract());
        assert!(!base.is_interface());
        assert!(!base.is_instantiable());

        let port = TypeDescriptor::interface("Port");
        assert!(port.is_abstract());
        assert!(port.is_interface());
    }

    #[test]
    fn test_factory_method_prefers_init() {
        let only_accessor = TypeDescriptor::concrete("Clock")
            .with_static_method("get_instance", Constructor::new(|_| Ok(Clock)));
        assert_eq!(only_accessor.factory_method().map(|(n, _)| n), Some("get_instance"));

        let both = only_accessor.with_static_method("init", Constructor::new(|_| Ok(Clock)));
        assert_eq!(both.factory_method().map(|(n, _)| n), Some("init"));

        let neither = TypeDescriptor::concrete("Clock")
            .with_static_method("now", Constructor::new(|_| Ok(Clock)));
        assert!(neither.factory_method().is_none());
    }

    #[test]
    fn test_registry_shared_between_clones() {
        let types = TypeRegistry::new();
        let handle = types.clone();

        assert!(types.register(TypeDescriptor::interface("Port")).is_none());
        assert!(handle.contains("Port"));
        assert_eq!(handle.describe("Port").unwrap().kind(), TypeKind::Interface);

        let replaced = handle.register(TypeDescriptor::abstract_type("Port"));
        assert_eq!(replaced.unwrap().kind(), TypeKind::Interface);
        assert_eq!(types.len(), 1);
        assert_eq!(types.names(), vec!["Port".to_string()]);
        assert!(types.describe("Missing").is_none());
    }
}
