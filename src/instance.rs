//! Type-erased service instances
//!
//! Everything the container hands out is an [`Instance`]: a shared,
//! type-erased value plus any trait-object views registered for it. Cloning
//! an `Instance` clones the `Arc`, so identity is preserved across the
//! singleton cache and prebuilt bindings.

use crate::{DiError, Injectable, Result};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A trait-object projection of an instance, stored as `Arc<Arc<V>>` erased.
#[derive(Clone)]
struct View {
    type_id: TypeId,
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// A resolved, shareable value.
///
/// # Examples
///
/// ```rust
/// use dependency_autowire::Instance;
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let english = Arc::new(English);
/// let instance = Instance::from_arc(Arc::clone(&english))
///     .with_view::<dyn Greeter>(english);
///
/// assert!(instance.is::<English>());
/// assert_eq!(instance.view::<dyn Greeter>().unwrap().greet(), "hello");
/// ```
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    views: Vec<View>,
}

impl Instance {
    /// Wrap an owned value
    #[inline]
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an existing `Arc` without re-allocating
    #[inline]
    pub fn from_arc<T: Injectable>(value: Arc<T>) -> Self {
        Self {
            value: value as Arc<dyn Any + Send + Sync>,
            type_name: std::any::type_name::<T>(),
            views: Vec::new(),
        }
    }

    /// Attach a trait-object view (e.g. `Arc<dyn Storage>`) to this instance.
    ///
    /// A later view for the same `V` replaces the earlier one.
    pub fn with_view<V: ?Sized + Send + Sync + 'static>(mut self, view: Arc<V>) -> Self {
        let type_id = TypeId::of::<V>();
        self.views.retain(|v| v.type_id != type_id);
        self.views.push(View {
            type_id,
            type_name: std::any::type_name::<V>(),
            value: Arc::new(view) as Arc<dyn Any + Send + Sync>,
        });
        self
    }

    /// Name of the concrete Rust type held
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the held value is a `T`
    #[inline]
    pub fn is<T: Injectable>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Downcast to the concrete type
    #[inline]
    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>> {
        self.try_downcast::<T>()
            .ok_or_else(|| DiError::type_mismatch::<T>(self.type_name))
    }

    /// Downcast to the concrete type, returning `None` on mismatch
    #[inline]
    pub fn try_downcast<T: Injectable>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Get a trait-object view registered for `V`
    pub fn view<V: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<V>> {
        let type_id = TypeId::of::<V>();
        self.views
            .iter()
            .find(|v| v.type_id == type_id)
            .and_then(|v| v.value.downcast_ref::<Arc<V>>())
            .cloned()
            .ok_or_else(|| DiError::type_mismatch::<V>(self.type_name))
    }

    /// Names of the views attached to this instance
    pub fn view_names(&self) -> Vec<&'static str> {
        self.views.iter().map(|v| v.type_name).collect()
    }

    /// Reference equality: both handles point at the same allocation
    #[inline]
    pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
        Arc::ptr_eq(&a.value, &b.value)
    }

    /// Borrow the erased value
    #[inline]
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("views", &self.view_names())
            .finish()
    }
}
