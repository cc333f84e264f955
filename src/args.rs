//! Argument bags
//!
//! [`Args`] is what callers hand to `make` and what bound factories receive.
//! [`Dependencies`] is what the resolver hands to a constructor or static
//! factory method after resolving its parameters, in declaration order.

use crate::{DiError, Injectable, Instance, Result};
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

/// Caller-supplied arguments for a factory binding.
///
/// Holds both positional and named values. Only factories read it; type and
/// alias resolution ignore it.
///
/// # Examples
///
/// ```rust
/// use dependency_autowire::Args;
///
/// let args = Args::new().with(8080u16).with_named("host", String::from("localhost"));
///
/// assert_eq!(*args.get::<u16>(0).unwrap(), 8080);
/// assert_eq!(args.named::<String>("host").unwrap().as_str(), "localhost");
/// ```
#[derive(Clone, Default)]
pub struct Args {
    positional: Vec<Instance>,
    named: HashMap<String, Instance, RandomState>,
}

impl Args {
    /// Create an empty argument bag
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional value
    pub fn with<T: Injectable>(mut self, value: T) -> Self {
        self.positional.push(Instance::new(value));
        self
    }

    /// Append an already-erased positional value
    pub fn with_instance(mut self, value: Instance) -> Self {
        self.positional.push(value);
        self
    }

    /// Set a named value
    pub fn with_named<T: Injectable>(mut self, name: impl Into<String>, value: T) -> Self {
        self.named.insert(name.into(), Instance::new(value));
        self
    }

    /// Get a positional value by index
    #[inline]
    pub fn get<T: Injectable>(&self, index: usize) -> Option<Arc<T>> {
        self.positional.get(index)?.try_downcast()
    }

    /// Get a named value
    #[inline]
    pub fn named<T: Injectable>(&self, name: &str) -> Option<Arc<T>> {
        self.named.get(name)?.try_downcast()
    }

    /// Positional value as an erased instance
    #[inline]
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.positional.get(index)
    }

    /// Total number of positional and named values
    #[inline]
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Check if no values were supplied
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("positional", &self.positional)
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolved constructor arguments, in parameter order.
pub struct Dependencies {
    type_name: String,
    values: Vec<(String, Instance)>,
}

impl Dependencies {
    pub(crate) fn new(type_name: impl Into<String>, values: Vec<(String, Instance)>) -> Self {
        Self {
            type_name: type_name.into(),
            values,
        }
    }

    /// Name of the type being constructed
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The resolved value for the parameter at `index`
    pub fn instance(&self, index: usize) -> Result<&Instance> {
        self.values.get(index).map(|(_, v)| v).ok_or_else(|| {
            DiError::creation_failed(
                self.type_name.as_str(),
                format!("no argument at position {index} ({} resolved)", self.values.len()),
            )
        })
    }

    /// Look a resolved value up by parameter name
    pub fn by_name(&self, name: &str) -> Option<&Instance> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Downcast the argument at `index` to `Arc<T>`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>> {
        self.instance(index)?
            .try_downcast::<T>()
            .ok_or_else(|| DiError::type_mismatch::<T>(self.param_key(index)))
    }

    /// Clone the argument at `index` out of its `Arc`
    pub fn cloned<T: Injectable + Clone>(&self, index: usize) -> Result<T> {
        self.get::<T>(index).map(|v| (*v).clone())
    }

    /// Trait-object view of the argument at `index`
    pub fn view<V: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<V>> {
        self.instance(index)?
            .view::<V>()
            .map_err(|_| DiError::type_mismatch::<V>(self.param_key(index)))
    }

    /// Number of resolved arguments
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the constructor took no arguments
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn param_key(&self, index: usize) -> String {
        match self.values.get(index) {
            Some((name, _)) => format!("{}::{}", self.type_name, name),
            None => self.type_name.clone(),
        }
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("type_name", &self.type_name)
            .field(
                "params",
                &self.values.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
